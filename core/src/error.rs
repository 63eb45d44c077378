//! Error types for the sandbox API client.
//!
//! # Design
//! Transport failures are always wrapped with the method and URL that
//! produced them. Non-2xx statuses are normally returned as responses; they
//! only become `HttpStatus` errors inside the login paths, where a status is
//! one of the reasons an attempt can fail.

use std::num::ParseIntError;

use thiserror::Error;

use crate::http::HttpMethod;

/// Broad classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connection,
    Other,
}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// A present environment variable could not be coerced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REQUEST_TIMEOUT must be a whole number of seconds, got {value:?}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Errors returned by `ApiClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, timeout, DNS failure and the like.
    #[error("{method} request failed - URL: {url}, Error: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: TransportError,
    },

    /// A login attempt got a status outside `[200, 300)`.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus { url: String, status: u16, body: String },

    /// A successful login response did not carry a `token` string.
    #[error("response from {url} has no token field")]
    MissingToken { url: String },

    /// Every login attempt failed; `last` is the final attempt's error.
    #[error("login to {url} failed after {attempts} attempt(s): {last}")]
    LoginFailed {
        url: String,
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// HTTP status behind this error, looking through `LoginFailed`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::LoginFailed { last, .. } => last.status(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::LoginFailed { last, .. } => last.is_transport(),
            _ => false,
        }
    }
}
