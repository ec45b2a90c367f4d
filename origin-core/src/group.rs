//! The `user.openshift.io/v1` Group resource
use k8s_openapi::{apimachinery::pkg::apis::meta::v1::ObjectMeta, ClusterResourceScope};
use kube::core::{metadata::TypeMeta, Resource};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// API group of [`Group`]
pub const GROUP: &str = "user.openshift.io";
/// API version of [`Group`]
pub const VERSION: &str = "v1";
/// Kind of [`Group`]
pub const KIND: &str = "Group";

/// A named set of users.
///
/// Groups are cluster scoped and have no spec; the member list sits at the top level of
/// the object, which is why this type implements [`Resource`] by hand instead of through
/// `#[derive(CustomResource)]`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Group {
    /// `apiVersion` and `kind`; list items returned by the server omit them
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeMeta>,
    /// Standard object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Names of the users in this group
    #[serde(default)]
    pub users: Vec<String>,
}

impl Group {
    /// An empty group with the given name
    pub fn new(name: &str) -> Self {
        Self {
            types: Some(Self::type_meta()),
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                ..ObjectMeta::default()
            },
            users: Vec::new(),
        }
    }

    /// The `apiVersion`/`kind` pair for groups
    pub fn type_meta() -> TypeMeta {
        TypeMeta {
            api_version: format!("{GROUP}/{VERSION}"),
            kind: KIND.to_owned(),
        }
    }

    /// Fill in `apiVersion`/`kind` when absent, as they are for list items
    #[must_use]
    pub fn with_type_meta(mut self) -> Self {
        self.types.get_or_insert_with(Self::type_meta);
        self
    }
}

impl Resource for Group {
    type DynamicType = ();
    type Scope = ClusterResourceScope;

    fn kind(_: &()) -> Cow<'_, str> {
        KIND.into()
    }

    fn group(_: &()) -> Cow<'_, str> {
        GROUP.into()
    }

    fn version(_: &()) -> Cow<'_, str> {
        VERSION.into()
    }

    fn plural(_: &()) -> Cow<'_, str> {
        "groups".into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
