/// Error taxonomy for the catalog core
///
/// Every operation reports failure synchronously through [`Result`];
/// nothing is logged-and-swallowed and nothing fails later.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed input: empty title, negative price
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    /// An operation referenced an id not present in the store
    #[error("no {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The embedded database reported a failure
    #[error("catalog database error")]
    Storage(#[from] rusqlite::Error),

    /// The directory for the default database could not be prepared
    #[error("could not prepare catalog directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No user data directory could be determined for the default database
    #[error("could not determine a user data directory")]
    NoDataDir,
}

impl CatalogError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        CatalogError::Validation {
            reason: reason.into(),
        }
    }
}
