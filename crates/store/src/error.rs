/// Errors from recipient store reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed document (or collection) does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote store answered with a non-2xx status.
    #[error("Store returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Reading or writing the local snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document or response body could not be decoded.
    #[error("Failed to decode store data: {0}")]
    Decode(#[from] serde_json::Error),

    /// The data decoded but does not have the expected shape.
    #[error("Malformed store data: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Transport-level failures, as opposed to missing or malformed data.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::HttpStatus { .. })
    }
}
