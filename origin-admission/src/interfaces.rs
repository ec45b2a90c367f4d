//! The traits admission plugins implement
use crate::{attributes::Attributes, error::Result};
use kube::core::admission::Operation;

/// A pluggable admission decision maker
pub trait Interface: Send + Sync {
    /// Whether the plugin wants to see requests for `operation`
    fn handles(&self, operation: &Operation) -> bool;
}

/// A plugin that accepts or rejects requests without modifying them
pub trait ValidationInterface: Interface {
    /// Reject the request by returning an error
    fn validate(&self, attributes: &Attributes) -> Result<()>;
}

/// Answers [`Interface::handles`] for a fixed set of operations
#[derive(Clone, Debug)]
pub struct Handler {
    operations: Vec<Operation>,
}

impl Handler {
    /// Handle exactly `operations`
    pub fn new(operations: &[Operation]) -> Self {
        Self {
            operations: operations.to_vec(),
        }
    }
}

impl Interface for Handler {
    fn handles(&self, operation: &Operation) -> bool {
        self.operations.contains(operation)
    }
}
