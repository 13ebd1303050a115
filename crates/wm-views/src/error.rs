//! Error types for view resolution and validation.

use wm_storage::{StorageError, StorageErrorKind, ViewId};

use crate::combine::CombineError;

/// Error from view resolution, materialization or write-time validation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ViewError {
    /// Symbolic identifier does not resolve.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// A standalone page was resolved where a template was required.
    #[error("Invalid template id: {0:?}")]
    InvalidTemplate(String),

    /// Bare name without a `module.` qualifier.
    #[error("Invalid template id: {0:?} (expected module.name)")]
    InvalidIdentifier(String),

    /// Write-time validation rejected a view; the write was rolled back.
    #[error("Invalid view definition {view_id}: {reason}")]
    Validation { view_id: ViewId, reason: String },

    #[error(transparent)]
    Combine(#[from] CombineError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ViewError {
    fn from(err: StorageError) -> Self {
        if err.kind == StorageErrorKind::NotFound {
            Self::NotFound(err.record.clone().unwrap_or_default())
        } else {
            Self::Storage(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_not_found() {
        let err: ViewError = StorageError::not_found("website.home").into();
        assert!(matches!(err, ViewError::NotFound(ref id) if id == "website.home"));
        assert_eq!(err.to_string(), "Template not found: website.home");
    }

    #[test]
    fn test_other_storage_errors_pass_through() {
        let err: ViewError = StorageError::new(StorageErrorKind::AlreadyExists)
            .with_constraint("key_website_id_unique")
            .into();
        assert!(matches!(err, ViewError::Storage(_)));
        assert!(err.to_string().contains("key_website_id_unique"));
    }
}
