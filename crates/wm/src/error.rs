//! CLI error types.

use wm_config::ConfigError;
use wm_storage::{BundleError, StorageError};
use wm_views::ViewError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Bundle(#[from] BundleError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    View(#[from] ViewError),

    #[error("{0}")]
    Validation(String),
}
