//! Error types for document-store operations.
//!
//! Server and write errors pass through as [`MondoError::Driver`] so that
//! error labels and server codes stay inspectable; the classification
//! helpers (`is_duplicate_key`, `is_connection_error`, ...) sort driver
//! errors into the client's taxonomy without discarding the original.

use mongodb::error::{
    ErrorKind, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT, WriteFailure,
};
use thiserror::Error;

/// Result type for document-store operations.
pub type MondoResult<T> = Result<T, MondoError>;

/// Server error code for a duplicate `_id` (or other unique index) violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors that can occur during document-store operations.
#[derive(Error, Debug)]
pub enum MondoError {
    /// MongoDB driver error (server, network, and write errors).
    #[error("driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Invalid configuration, including a malformed connection URI.
    #[error("configuration error: {0}")]
    Config(String),

    /// Cannot establish or maintain the network link.
    #[error("connection error: {0}")]
    Connection(String),

    /// Operation exceeded its client-side deadline.
    ///
    /// Any partial server-side effect is determined by the server; the
    /// client does not assume rollback.
    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    /// Transaction aborted after exhausting retries, or due to a
    /// non-retryable failure. The underlying cause is attached.
    #[error("transaction aborted: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<Box<MondoError>>,
    },

    /// Document mapping error outside of BSON codec failures.
    #[error("document mapping error: {0}")]
    Serialization(String),

    /// Unparsable ObjectId text.
    #[error("invalid object id: {0}")]
    InvalidId(String),
}

impl MondoError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a document mapping error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a transaction error wrapping its cause.
    pub fn transaction(message: impl Into<String>, source: MondoError) -> Self {
        Self::Transaction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error means the server could not be reached.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Driver(err) => matches!(
                &*err.kind,
                ErrorKind::Io(_)
                    | ErrorKind::ServerSelection { .. }
                    | ErrorKind::DnsResolve { .. }
                    | ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }

    /// Check if this is a server-side write error (constraint violation,
    /// write concern failure).
    pub fn is_write_error(&self) -> bool {
        match self {
            Self::Driver(err) => {
                matches!(&*err.kind, ErrorKind::Write(_) | ErrorKind::BulkWrite(_))
            }
            _ => false,
        }
    }

    /// Check if this write failed on a duplicate `_id` or other unique
    /// index violation.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Self::Driver(err) => match &*err.kind {
                ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY_CODE,
                ErrorKind::BulkWrite(failure) => failure
                    .write_errors
                    .as_ref()
                    .is_some_and(|errs| errs.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
                _ => false,
            },
            _ => false,
        }
    }

    /// Check if the server flagged this as a transient transaction error,
    /// meaning the whole transaction body may be retried.
    pub fn is_transient_transaction(&self) -> bool {
        match self {
            Self::Driver(err) => err.contains_label(TRANSIENT_TRANSACTION_ERROR),
            Self::Transaction {
                source: Some(source),
                ..
            } => source.is_transient_transaction(),
            _ => false,
        }
    }

    /// Check if a commit outcome is unknown, meaning the commit itself
    /// may be retried.
    pub fn is_unknown_commit(&self) -> bool {
        match self {
            Self::Driver(err) => err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT),
            _ => false,
        }
    }
}

impl From<bson::oid::Error> for MondoError {
    fn from(err: bson::oid::Error) -> Self {
        MondoError::InvalidId(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_creation() {
        let err = MondoError::config("invalid URI");
        assert!(matches!(err, MondoError::Config(_)));

        let err = MondoError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = MondoError::Timeout(5000);
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = MondoError::config("missing database name");
        assert_eq!(err.to_string(), "configuration error: missing database name");

        let err = MondoError::Timeout(250);
        assert_eq!(err.to_string(), "operation timed out after 250ms");
    }

    #[test]
    fn test_transaction_error_carries_cause() {
        let cause = MondoError::connection("reset by peer");
        let err = MondoError::transaction("retries exhausted", cause);

        assert_eq!(err.to_string(), "transaction aborted: retries exhausted");
        let source = err.source().expect("cause attached");
        assert_eq!(source.to_string(), "connection error: reset by peer");
    }

    #[test]
    fn test_client_errors_are_not_write_errors() {
        assert!(!MondoError::Timeout(10).is_write_error());
        assert!(!MondoError::config("x").is_duplicate_key());
        assert!(!MondoError::connection("x").is_transient_transaction());
        assert!(!MondoError::connection("x").is_unknown_commit());
    }

    #[test]
    fn test_invalid_id_from_oid_error() {
        let parse_err = bson::oid::ObjectId::parse_str("not-a-hex-id").unwrap_err();
        let err: MondoError = parse_err.into();
        assert!(matches!(err, MondoError::InvalidId(_)));
    }
}
