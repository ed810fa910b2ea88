//! Error types for SMTP operations.

use crate::types::ReplyCode;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
///
/// Transport failures (`Io`, `Tls`, `InvalidDnsName`, `Certificate`,
/// `Timeout`, `NotConnected`) and protocol failures (`UnexpectedReply`,
/// `NoReply`, `MalformedReply`) are both fatal to the operation that raised
/// them. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Certificate file could not be loaded.
    #[error("Failed to load certificate {}: {reason}", path.display())]
    Certificate {
        /// Path of the certificate file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// No connection is open.
    #[error("Not connected")]
    NotConnected,

    /// Server replied with a different code than the command expects.
    #[error("Expected reply {expected}, got {actual}: {message}")]
    UnexpectedReply {
        /// Code the command expects.
        expected: ReplyCode,
        /// Code the server sent.
        actual: ReplyCode,
        /// Message from server.
        message: String,
    },

    /// Connection ended before a reply arrived.
    #[error("Connection closed while waiting for reply {expected}")]
    NoReply {
        /// Code the command expects.
        expected: ReplyCode,
    },

    /// Reply does not start with a numeric code.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Message could not be composed.
    #[error(transparent)]
    Mime(#[from] mailpost_mime::Error),

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Returns true if the transport failed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::InvalidDnsName(_)
                | Self::Certificate { .. }
                | Self::Timeout(_)
                | Self::NotConnected
        )
    }

    /// Returns true if the server did not answer as the protocol requires.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedReply { .. } | Self::NoReply { .. } | Self::MalformedReply(_)
        )
    }

    /// Returns the reply code that was expected, for protocol errors.
    #[must_use]
    pub const fn expected_code(&self) -> Option<ReplyCode> {
        match self {
            Self::UnexpectedReply { expected, .. } | Self::NoReply { expected } => Some(*expected),
            _ => None,
        }
    }

    /// Returns the reply code the server actually sent, if any.
    #[must_use]
    pub const fn actual_code(&self) -> Option<ReplyCode> {
        match self {
            Self::UnexpectedReply { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Returns true if this is a permanent server rejection (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::UnexpectedReply { actual, .. } if actual.is_permanent())
    }

    /// Returns true if this is a transient server rejection (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::UnexpectedReply { actual, .. } if actual.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unexpected(actual: u16) -> Error {
        Error::UnexpectedReply {
            expected: ReplyCode::OK,
            actual: ReplyCode::new(actual),
            message: "No such user".to_string(),
        }
    }

    #[test]
    fn test_unexpected_reply_details() {
        let err = unexpected(550);
        assert!(err.is_protocol());
        assert!(!err.is_transport());
        assert_eq!(err.expected_code(), Some(ReplyCode::OK));
        assert_eq!(err.actual_code(), Some(ReplyCode::new(550)));
        assert_eq!(err.to_string(), "Expected reply 250, got 550: No such user");
    }

    #[test]
    fn test_permanent_and_transient() {
        assert!(unexpected(550).is_permanent());
        assert!(!unexpected(550).is_transient());
        assert!(unexpected(451).is_transient());
        assert!(!unexpected(451).is_permanent());
    }

    #[test]
    fn test_no_reply_is_protocol() {
        let err = Error::NoReply {
            expected: ReplyCode::SERVICE_READY,
        };
        assert!(err.is_protocol());
        assert_eq!(err.expected_code(), Some(ReplyCode::SERVICE_READY));
        assert_eq!(err.actual_code(), None);
    }

    #[test]
    fn test_io_is_transport() {
        let err = Error::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(err.is_transport());
        assert!(!err.is_protocol());
        assert_eq!(err.expected_code(), None);
    }
}
