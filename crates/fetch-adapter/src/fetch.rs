//! Contract of the underlying fetch-style client

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::body::{Blob, RequestBody};
use crate::cancel::AbortSignal;
use crate::error::FetchError;
use crate::headers::{Headers, CONTENT_TYPE};

/// Credentials mode of a fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Send credentials with every request
    Include,
    /// Send credentials to the same origin only
    SameOrigin,
    /// Never send credentials
    Omit,
}

impl Credentials {
    /// Mode as used by fetch (`include`, `same-origin`, `omit`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Include => "include",
            Credentials::SameOrigin => "same-origin",
            Credentials::Omit => "omit",
        }
    }
}

impl From<bool> for Credentials {
    fn from(with_credentials: bool) -> Self {
        if with_credentials {
            Credentials::Include
        } else {
            Credentials::SameOrigin
        }
    }
}

/// Download progress reported by the underlying client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    /// Bytes received so far
    pub transferred_bytes: u64,
    /// Expected body size, 0 when unknown
    pub total_bytes: u64,
}

/// Progress callback handed to the underlying client
pub type FetchProgressCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

/// Options for a single fetch call
#[derive(Clone)]
pub struct FetchOptions {
    /// Request method
    pub method: Method,
    /// Whole-request timeout; `None` disables it
    pub timeout: Option<Duration>,
    /// Request headers
    pub headers: Headers,
    /// Credentials mode; `None` leaves the client's default
    pub credentials: Option<Credentials>,
    /// Signal that aborts the request
    pub signal: Option<AbortSignal>,
    /// Download progress callback
    pub on_download_progress: Option<FetchProgressCallback>,
    /// Request body
    pub body: Option<RequestBody>,
}

impl FetchOptions {
    /// Options with only a method set
    pub fn new(method: Method) -> Self {
        Self {
            method,
            timeout: None,
            headers: Headers::new(),
            credentials: None,
            signal: None,
            on_download_progress: None,
            body: None,
        }
    }

    /// Apply passthrough overrides; overridden values win
    pub fn merge(&mut self, overrides: &FetchOverrides) {
        if let Some(method) = &overrides.method {
            self.method = method.clone();
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = Some(timeout).filter(|timeout| !timeout.is_zero());
        }
        for (name, value) in overrides.headers.iter() {
            self.headers.set(name, value);
        }
        if let Some(credentials) = overrides.credentials {
            self.credentials = Some(credentials);
        }
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("signal", &self.signal)
            .field("on_download_progress", &self.on_download_progress.is_some())
            .field("body", &self.body)
            .finish()
    }
}

/// Caller-supplied options merged over the computed ones
///
/// A zero `timeout` disables the timeout.
#[derive(Debug, Clone, Default)]
pub struct FetchOverrides {
    /// Replacement method
    pub method: Option<Method>,
    /// Replacement timeout
    pub timeout: Option<Duration>,
    /// Headers set over the computed ones
    pub headers: Headers,
    /// Replacement credentials mode
    pub credentials: Option<Credentials>,
}

/// Response returned by a fetch-style client
#[async_trait]
pub trait FetchResponse: Send {
    /// HTTP status code
    fn status(&self) -> u16;

    /// HTTP reason phrase
    fn status_text(&self) -> &str;

    /// Response headers
    fn headers(&self) -> &Headers;

    /// Read the body as raw bytes
    async fn array_buffer(self: Box<Self>) -> Result<Vec<u8>, FetchError>;

    /// Read the body as UTF-8 text, replacing invalid sequences
    async fn text(self: Box<Self>) -> Result<String, FetchError> {
        let bytes = self.array_buffer().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the body as JSON; an empty body reads as `null`
    async fn json(self: Box<Self>) -> Result<Value, FetchError> {
        let bytes = self.array_buffer().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(FetchError::from)
    }

    /// Read the body as a blob typed by the response `Content-Type`
    async fn blob(self: Box<Self>) -> Result<Blob, FetchError> {
        let media_type = self.headers().get(CONTENT_TYPE).map(str::to_string);
        let bytes = self.array_buffer().await?;
        Ok(match media_type {
            Some(media_type) => Blob::new(bytes).with_type(media_type),
            None => Blob::new(bytes),
        })
    }
}

/// Fetch-style HTTP client
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Send one request
    async fn fetch(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<Box<dyn FetchResponse>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_from_with_credentials() {
        assert_eq!(Credentials::from(true), Credentials::Include);
        assert_eq!(Credentials::from(false), Credentials::SameOrigin);
        assert_eq!(Credentials::SameOrigin.as_str(), "same-origin");
    }

    #[test]
    fn test_credentials_serde_names() {
        let json = serde_json::to_string(&Credentials::SameOrigin).expect("Serializable");
        assert_eq!(json, "\"same-origin\"");
        let parsed: Credentials = serde_json::from_str("\"include\"").expect("Deserializable");
        assert_eq!(parsed, Credentials::Include);
    }

    #[test]
    fn test_merge_overrides_win() {
        let mut options = FetchOptions::new(Method::GET);
        options.timeout = Some(Duration::from_secs(5));
        options.headers.set("Accept", "application/json");
        options.headers.set("X-Trace", "1");

        let overrides = FetchOverrides {
            method: Some(Method::HEAD),
            timeout: Some(Duration::from_secs(30)),
            headers: [("accept", "text/plain")].into_iter().collect(),
            credentials: Some(Credentials::Omit),
        };
        options.merge(&overrides);

        assert_eq!(options.method, Method::HEAD);
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.headers.get("Accept"), Some("text/plain"));
        assert_eq!(options.headers.get("X-Trace"), Some("1"));
        assert_eq!(options.credentials, Some(Credentials::Omit));
    }

    #[test]
    fn test_merge_zero_timeout_disables() {
        let mut options = FetchOptions::new(Method::GET);
        options.timeout = Some(Duration::from_secs(5));
        options.merge(&FetchOverrides {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        });
        assert_eq!(options.timeout, None);
    }

    #[test]
    fn test_empty_merge_changes_nothing() {
        let mut options = FetchOptions::new(Method::POST);
        options.credentials = Some(Credentials::Include);
        options.merge(&FetchOverrides::default());
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.credentials, Some(Credentials::Include));
        assert!(options.headers.is_empty());
    }
}
