//! OpenAPI post-processing for Postman's collection rendering

pub mod model;
pub mod transform;
pub mod warning;
pub mod writer;

pub use transform::{TransformOptions, transform};
pub use warning::TransformWarning;
