use thiserror::Error;

use crate::types::Location;

/// Errors that can occur while indexing declarations or resolving references.
///
/// Ambiguous and unresolved references are not errors; they are ordinary
/// verdicts and surface as diagnostics.
#[derive(Error, Debug)]
pub enum XrefError {
    #[error("invalid reference: {message} (at {location})")]
    InvalidReference { message: String, location: Location },

    #[error("declaration index is sealed: cannot insert '{name}' (at {location})")]
    IndexSealed { name: String, location: Location },

    #[error("declaration index is not sealed: {message}")]
    IndexNotSealed { message: String },

    #[error("cannot merge declaration indexes: {message}")]
    IndexMerge { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("input error: {message} (path: {path})")]
    Input { message: String, path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XrefError {
    /// Returns `true` for faults that must abort the whole batch rather than
    /// a single resolution.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, XrefError::InvalidReference { .. })
    }
}

/// Convenience alias for results using `XrefError`.
pub type Result<T> = std::result::Result<T, XrefError>;
