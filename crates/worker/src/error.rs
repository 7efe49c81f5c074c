use freebie_catalog::CatalogError;
use freebie_core::CoreError;

use crate::config::ConfigError;

/// Fatal run errors. Any of these aborts the run with a non-zero exit.
///
/// Per-target delivery failures and tracking write failures are not errors
/// here; they are reported in [`RunReport`](crate::pipeline::RunReport).
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Catalog fetch failed: {0}")]
    Transport(#[from] CatalogError),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

impl From<CoreError> for RunError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DataUnavailable(msg) => Self::DataUnavailable(msg),
            CoreError::Validation(msg) => Self::DataUnavailable(format!("invalid data: {msg}")),
        }
    }
}
