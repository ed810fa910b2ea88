//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address could not be used in a header or envelope.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Header value could not be written safely.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// What was wrong with the value.
        reason: String,
    },
}
