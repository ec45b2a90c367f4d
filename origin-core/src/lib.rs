//! Types shared across the origin workspace.
//!
//! - [`annotations`]: annotation and label keys shared by controllers and tools
//! - [`field`]: field-level validation errors rendered the way the API server renders them
//! - [`errors`]: aggregation of independent failures
//! - [`validation`]: name, label and object metadata validation
//! - [`group`] and [`image`]: OpenShift resource types not covered by `k8s-openapi`
#![deny(unsafe_code)]

pub mod annotations;
pub mod errors;
pub mod field;
pub mod group;
pub mod image;
pub mod validation;

pub use errors::Aggregate;
pub use field::{ErrorList, Path};
pub use group::Group;
pub use image::{Image, ImageSpec};
