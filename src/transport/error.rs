//! Normalized error type
//!
//! Every failure that leaves the transport boundary is one of these.

use thiserror::Error;

/// Classified client error with a user-presentable message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl NormalizedError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            message: message.into(),
            http_status: Some(status),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, message)
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

/// Where the failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response reached the client
    Network,
    /// Server answered with a non-success status
    HttpStatus,
    /// Success status, but the body could not be understood
    Decode,
    /// Client-side precondition failed; nothing was sent
    Validation,
    /// A host-provided capability (file save, token persistence) failed
    Host,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::HttpStatus => "http_status",
            Self::Decode => "decode",
            Self::Validation => "validation",
            Self::Host => "host",
        }
    }
}

impl NormalizedError {
    /// Whether repeating the same user action might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network => true,
            ErrorKind::HttpStatus => matches!(self.http_status, Some(408 | 429 | 500..=599)),
            ErrorKind::Decode | ErrorKind::Validation | ErrorKind::Host => false,
        }
    }
}
