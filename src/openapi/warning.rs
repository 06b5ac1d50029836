//! Per-operation anomalies recorded during post-processing

use std::fmt;

use serde::Serialize;

/// An operation the transform had to skip, identified by method and path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformWarning {
    /// Lowercase method key, or `*` when the whole path item was unusable
    pub method: String,
    pub path: String,
    pub message: String,
}

impl TransformWarning {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.method.to_ascii_uppercase(),
            self.path,
            self.message
        )
    }
}
