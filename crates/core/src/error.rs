#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A data source the pipeline depends on was empty or unreadable.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
