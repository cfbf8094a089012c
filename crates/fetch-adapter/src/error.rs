//! Error types

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::cancel::Cancel;
use crate::config::RequestConfig;
use crate::response::{RequestHandle, Response};

/// Machine-readable error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request was aborted
    ConnAborted,
    /// Streaming responses were requested
    NoStream,
}

impl ErrorCode {
    /// Code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnAborted => "ECONNABORTED",
            ErrorCode::NoStream => "ENOSTREAM",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a [`Fetch`](crate::Fetch) implementation
#[derive(Debug, Error)]
pub enum FetchError {
    /// The abort signal fired
    #[error("The operation was aborted")]
    Aborted,
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Reading or decoding the body failed
    #[error("Body error: {0}")]
    Body(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Whether this error reports an abort
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_builder() {
            FetchError::Build(err.to_string())
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Serialization(err.to_string())
    }
}

/// Classified adapter failure
///
/// Every variant carries the originating request config.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A response type the adapter cannot deliver; no request was made
    #[error("The \"stream\" response type is not supported")]
    Unsupported {
        /// Originating config
        config: Arc<RequestConfig>,
    },
    /// The underlying client aborted the request
    #[error("Request aborted")]
    Aborted {
        /// Originating config
        config: Arc<RequestConfig>,
        /// Request that was in flight
        request: Option<RequestHandle>,
    },
    /// Any other dispatch or body-read failure
    #[error("Network Error")]
    Network {
        /// Originating config
        config: Arc<RequestConfig>,
        /// Request that was in flight
        request: Option<RequestHandle>,
        /// Underlying failure
        source: FetchError,
    },
    /// The caller's cancel token fired
    #[error("{reason}")]
    Canceled {
        /// Reason given when cancelling
        reason: Cancel,
        /// Originating config
        config: Arc<RequestConfig>,
    },
    /// The settlement policy rejected the response status
    #[error("Request failed with status code {}", .response.status)]
    Status {
        /// Rejected response
        response: Box<Response>,
    },
}

impl AdapterError {
    /// Machine-readable code, if the failure has one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            AdapterError::Unsupported { .. } => Some(ErrorCode::NoStream),
            AdapterError::Aborted { .. } => Some(ErrorCode::ConnAborted),
            AdapterError::Network { .. }
            | AdapterError::Canceled { .. }
            | AdapterError::Status { .. } => None,
        }
    }

    /// Config of the failed request
    pub fn config(&self) -> &RequestConfig {
        match self {
            AdapterError::Unsupported { config }
            | AdapterError::Aborted { config, .. }
            | AdapterError::Network { config, .. }
            | AdapterError::Canceled { config, .. } => config,
            AdapterError::Status { response } => &response.config,
        }
    }

    /// Request that was in flight when the failure happened
    pub fn request(&self) -> Option<&RequestHandle> {
        match self {
            AdapterError::Aborted { request, .. } | AdapterError::Network { request, .. } => {
                request.as_ref()
            }
            AdapterError::Status { response } => response.request.as_ref(),
            AdapterError::Unsupported { .. } | AdapterError::Canceled { .. } => None,
        }
    }

    /// Response that was received, for status rejections
    pub fn response(&self) -> Option<&Response> {
        match self {
            AdapterError::Status { response } => Some(response),
            _ => None,
        }
    }

    /// Whether the caller cancelled the request
    pub fn is_cancel(&self) -> bool {
        matches!(self, AdapterError::Canceled { .. })
    }
}
