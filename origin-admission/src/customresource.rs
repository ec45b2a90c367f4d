//! Validation of custom resources through per-object validation functions
use crate::{
    attributes::{operation_name, Attributes, GroupResource},
    error::{Error, Result},
    interfaces::{Handler, Interface, ValidationInterface},
};
use kube::core::{admission::Operation, DynamicObject};
use origin_core::field::{Error as FieldError, ErrorList};
use serde::de::DeserializeOwned;

/// Name validator for singleton config resources
pub fn require_name_cluster(name: &str, _prefix: bool) -> Vec<String> {
    if name == "cluster" {
        Vec::new()
    } else {
        vec!["must be cluster".to_owned()]
    }
}

/// Field validation for one resource type
pub trait ObjectValidator: Send + Sync {
    /// Validate a new object
    fn validate_create(&self, obj: &DynamicObject) -> ErrorList;
    /// Validate a change to the main resource
    fn validate_update(&self, obj: &DynamicObject, old: &DynamicObject) -> ErrorList;
    /// Validate a change to the `status` subresource
    fn validate_status_update(&self, obj: &DynamicObject, old: &DynamicObject) -> ErrorList;
}

/// Decode an untyped object into `K`, checking its `kind` and `apiVersion` first.
///
/// Anything that is not a `K` is reported as unsupported values of both fields.
pub fn decode<K: DeserializeOwned>(obj: &DynamicObject, kind: &str, api_version: &str) -> Result<K, ErrorList> {
    let (actual_kind, actual_version) = obj
        .types
        .as_ref()
        .map(|t| (t.kind.as_str(), t.api_version.as_str()))
        .unwrap_or_default();
    let not_supported = || {
        ErrorList::from(vec![
            FieldError::not_supported("kind", actual_kind, &[kind]),
            FieldError::not_supported("apiVersion", actual_version, &[api_version]),
        ])
    };
    if actual_kind != kind || actual_version != api_version {
        return Err(not_supported());
    }
    serde_json::to_value(obj)
        .and_then(serde_json::from_value)
        .map_err(|_| not_supported())
}

/// Runs an [`ObjectValidator`] for creates and updates of one resource.
///
/// Requests for other resources, and for subresources other than `status`, are ignored.
pub struct CustomResourceValidator<V> {
    handler: Handler,
    resource: GroupResource,
    validator: V,
}

impl<V: ObjectValidator> CustomResourceValidator<V> {
    /// Validate `resource` with `validator`
    pub fn new(resource: GroupResource, validator: V) -> Self {
        Self {
            handler: Handler::new(&[Operation::Create, Operation::Update]),
            resource,
            validator,
        }
    }

    fn should_ignore(&self, attrs: &Attributes) -> bool {
        attrs.group_resource() != self.resource || !matches!(attrs.subresource.as_str(), "" | "status")
    }

    fn forbidden(&self, attrs: &Attributes, reason: String) -> Error {
        Error::Forbidden {
            resource: self.resource.to_string(),
            name: attrs.name.clone(),
            reason,
        }
    }

    fn check(attrs: &Attributes, errors: ErrorList) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid {
                kind: attrs.group_kind(),
                name: attrs.name.clone(),
                errors,
            })
        }
    }
}

fn object(attrs: &Attributes) -> Result<&DynamicObject> {
    attrs
        .object
        .as_ref()
        .ok_or_else(|| Error::BadRequest("request carries no object".into()))
}

fn old_object(attrs: &Attributes) -> Result<&DynamicObject> {
    attrs
        .old_object
        .as_ref()
        .ok_or_else(|| Error::BadRequest("update request carries no old object".into()))
}

impl<V: ObjectValidator> Interface for CustomResourceValidator<V> {
    fn handles(&self, operation: &Operation) -> bool {
        self.handler.handles(operation)
    }
}

impl<V: ObjectValidator> ValidationInterface for CustomResourceValidator<V> {
    fn validate(&self, attrs: &Attributes) -> Result<()> {
        if self.should_ignore(attrs) {
            return Ok(());
        }

        match (&attrs.operation, attrs.subresource.as_str()) {
            // creating a subresource needs no validation of the parent
            (Operation::Create, sub) if !sub.is_empty() => Ok(()),
            (Operation::Create, _) => Self::check(attrs, self.validator.validate_create(object(attrs)?)),
            (Operation::Update, "") => Self::check(
                attrs,
                self.validator.validate_update(object(attrs)?, old_object(attrs)?),
            ),
            // status is the only subresource left past should_ignore
            (Operation::Update, _) => Self::check(
                attrs,
                self.validator
                    .validate_status_update(object(attrs)?, old_object(attrs)?),
            ),
            (op, _) => Err(self.forbidden(attrs, format!("unhandled operation: {}", operation_name(op)))),
        }
    }
}
