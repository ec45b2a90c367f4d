//! `config.openshift.io/ValidateImage`: validation of the cluster image configuration
use crate::{
    attributes::GroupResource,
    customresource::{decode, require_name_cluster, CustomResourceValidator, ObjectValidator},
    error::Result,
    interfaces::ValidationInterface,
    registry::Plugins,
};
use kube::core::DynamicObject;
use origin_core::{
    field::{ErrorList, Path},
    image::Image,
    validation::{validate_object_meta, validate_object_meta_update},
};
use std::{io::Read, sync::Arc};

/// Name the plugin is registered under
pub const PLUGIN_NAME: &str = "config.openshift.io/ValidateImage";

const KIND: &str = "Image";
const API_VERSION: &str = "config.openshift.io/v1";

/// Register the plugin
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, new);
}

fn new(_config: Option<&mut dyn Read>) -> Result<Arc<dyn ValidationInterface>> {
    Ok(Arc::new(CustomResourceValidator::new(
        GroupResource::new("config.openshift.io", "images"),
        ImageValidator,
    )))
}

/// Object validation for `images.config.openshift.io`
pub struct ImageValidator;

fn decode_pair(obj: &DynamicObject, old: &DynamicObject) -> Result<(Image, Image), ErrorList> {
    Ok((decode(obj, KIND, API_VERSION)?, decode(old, KIND, API_VERSION)?))
}

impl ObjectValidator for ImageValidator {
    fn validate_create(&self, obj: &DynamicObject) -> ErrorList {
        match decode::<Image>(obj, KIND, API_VERSION) {
            Ok(image) => validate_object_meta(&image.metadata, false, require_name_cluster, &Path::new("metadata")),
            Err(errs) => errs,
        }
    }

    fn validate_update(&self, obj: &DynamicObject, old: &DynamicObject) -> ErrorList {
        match decode_pair(obj, old) {
            Ok((image, old)) => validate_object_meta_update(&image.metadata, &old.metadata, &Path::new("metadata")),
            Err(errs) => errs,
        }
    }

    fn validate_status_update(&self, obj: &DynamicObject, old: &DynamicObject) -> ErrorList {
        // status updates must never fail on spec problems
        match decode_pair(obj, old) {
            Ok((image, old)) => validate_object_meta_update(&image.metadata, &old.metadata, &Path::new("metadata")),
            Err(errs) => errs,
        }
    }
}
