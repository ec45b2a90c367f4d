//! The facts about an admission request that plugins decide on
use kube::core::{
    admission::{AdmissionRequest, Operation},
    DynamicObject, GroupVersionKind, GroupVersionResource,
};
use std::fmt;

/// A resource type without its version, e.g. `images.config.openshift.io`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GroupResource {
    /// API group, empty for the core group
    pub group: String,
    /// Plural resource name
    pub resource: String,
}

impl GroupResource {
    /// Create a group resource
    pub fn new(group: &str, resource: &str) -> Self {
        Self {
            group: group.to_owned(),
            resource: resource.to_owned(),
        }
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// Everything a plugin may inspect about a request
#[derive(Clone, Debug)]
pub struct Attributes {
    /// What is being done
    pub operation: Operation,
    /// Kind of the object
    pub kind: GroupVersionKind,
    /// Resource being acted on
    pub resource: GroupVersionResource,
    /// Subresource, empty for the main resource
    pub subresource: String,
    /// Object name
    pub name: String,
    /// Object namespace, empty for cluster scoped objects
    pub namespace: String,
    /// The object after the operation
    pub object: Option<DynamicObject>,
    /// The object before the operation, for updates
    pub old_object: Option<DynamicObject>,
    /// Whether the request is a dry run
    pub dry_run: bool,
}

impl Attributes {
    /// Group and resource of the request, without the version
    pub fn group_resource(&self) -> GroupResource {
        GroupResource::new(&self.resource.group, &self.resource.resource)
    }

    /// `Kind.group`, the way error messages name a kind
    pub fn group_kind(&self) -> String {
        if self.kind.group.is_empty() {
            self.kind.kind.clone()
        } else {
            format!("{}.{}", self.kind.kind, self.kind.group)
        }
    }
}

impl From<&AdmissionRequest<DynamicObject>> for Attributes {
    fn from(req: &AdmissionRequest<DynamicObject>) -> Self {
        Self {
            operation: req.operation.clone(),
            kind: req.kind.clone(),
            resource: req.resource.clone(),
            subresource: req.sub_resource.clone().unwrap_or_default(),
            name: req.name.clone(),
            namespace: req.namespace.clone().unwrap_or_default(),
            object: req.object.clone(),
            old_object: req.old_object.clone(),
            dry_run: req.dry_run,
        }
    }
}

/// Upper case operation name, as it appears on the wire
pub fn operation_name(op: &Operation) -> &'static str {
    match op {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}
