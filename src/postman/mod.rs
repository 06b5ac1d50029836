//! The checked-in Postman collection store

pub mod document;
pub mod sanitize;
pub mod validate;
pub mod version;

pub use document::DocumentKind;
