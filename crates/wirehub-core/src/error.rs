//! Unified error types for Wirehub.
//!
//! All crates map their internal errors into [`NetError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Handshake or transport failure.
    Connection,
    /// A response body did not match the expected shape.
    Decode,
    /// Caller-initiated cancellation; never surfaced as a stream error.
    Cancelled,
    /// The remote closed a stream without an explicit completion marker.
    StreamTerminated,
    /// A session registry lookup/remove inconsistency.
    Registry,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "CONNECTION"),
            Self::Decode => write!(f, "DECODE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::StreamTerminated => write!(f, "STREAM_TERMINATED"),
            Self::Registry => write!(f, "REGISTRY"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout Wirehub.
///
/// Crate-specific errors are mapped into `NetError` using `From` impls or
/// explicit `.map_err()` calls, giving a single error type at every
/// operation boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct NetError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl NetError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Create a cancellation marker error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create a stream termination error.
    pub fn stream_terminated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StreamTerminated, message)
    }

    /// Create a registry error.
    pub fn registry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Registry, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Return the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether this error marks a caller-initiated cancellation.
    ///
    /// Cancellation is swallowed at stream boundaries: a cancelled task must
    /// never surface through the `Error` callback.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl From<serde_json::Error> for NetError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, "JSON error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = NetError::connection("handshake refused");
        assert_eq!(err.to_string(), "CONNECTION: handshake refused");
    }

    #[test]
    fn cancelled_is_detectable() {
        assert!(NetError::cancelled("stop").is_cancelled());
        assert!(!NetError::decode("bad shape").is_cancelled());
    }

    #[test]
    fn json_error_maps_to_serialization() {
        let err: NetError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(err.source.is_some());
    }
}
