//! Request descriptor

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;

use crate::body::RequestBody;
use crate::cancel::CancelToken;
use crate::fetch::{FetchOverrides, FetchProgress};
use crate::headers::Headers;
use crate::response::ResponseType;
use crate::url_builder::{Params, ParamsSerializer};

/// Default cookie carrying the XSRF token
pub const DEFAULT_XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Default header the XSRF token is sent in
pub const DEFAULT_XSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// HTTP basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl BasicAuth {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value (`Basic base64(user:password)`)
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Download progress delivered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Whether `total` is known
    pub length_computable: bool,
    /// Bytes received so far
    pub loaded: u64,
    /// Expected body size, 0 when unknown
    pub total: u64,
}

impl From<FetchProgress> for ProgressEvent {
    fn from(progress: FetchProgress) -> Self {
        Self {
            length_computable: progress.total_bytes != 0,
            loaded: progress.transferred_bytes,
            total: progress.total_bytes,
        }
    }
}

/// Caller's download progress callback
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Predicate deciding which status codes resolve
#[derive(Clone)]
pub struct StatusValidator(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl StatusValidator {
    /// Wrap a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Whether `status` resolves
    pub fn accepts(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl Default for StatusValidator {
    fn default() -> Self {
        Self::new(|status| (200..300).contains(&status))
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusValidator").finish_non_exhaustive()
    }
}

/// Normalized request descriptor
///
/// Built with [`RequestConfig::new`] and the chained setters below; every
/// field is public for callers that assemble configs from their own defaults.
#[derive(Clone)]
pub struct RequestConfig {
    /// Request method
    pub method: Method,
    /// Requested URL, absolute or relative to `base_url`
    pub url: String,
    /// Prefix for relative URLs
    pub base_url: Option<String>,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub data: Option<RequestBody>,
    /// Query parameters
    pub params: Option<Params>,
    /// Custom query-string serializer
    pub params_serializer: Option<ParamsSerializer>,
    /// Whole-request timeout; zero disables it
    pub timeout: Option<Duration>,
    /// HTTP basic credentials
    pub auth: Option<BasicAuth>,
    /// Send credentials cross-origin; `None` leaves the client's default
    pub with_credentials: Option<bool>,
    /// Cookie carrying the XSRF token
    pub xsrf_cookie_name: Option<String>,
    /// Header the XSRF token is sent in
    pub xsrf_header_name: Option<String>,
    /// How the response body is delivered
    pub response_type: ResponseType,
    /// Download progress callback
    pub on_download_progress: Option<ProgressCallback>,
    /// Caller's cancellation handle
    pub cancel_token: Option<CancelToken>,
    /// Status codes that resolve
    pub validate_status: Option<StatusValidator>,
    /// Passthrough options for the underlying client
    pub fetch_options: Option<FetchOverrides>,
}

impl RequestConfig {
    /// Create a config with default settings
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            base_url: None,
            headers: Headers::new(),
            data: None,
            params: None,
            params_serializer: None,
            timeout: None,
            auth: None,
            with_credentials: None,
            xsrf_cookie_name: Some(DEFAULT_XSRF_COOKIE_NAME.to_string()),
            xsrf_header_name: Some(DEFAULT_XSRF_HEADER_NAME.to_string()),
            response_type: ResponseType::default(),
            on_download_progress: None,
            cancel_token: None,
            validate_status: Some(StatusValidator::default()),
            fetch_options: None,
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set the request body
    pub fn data(mut self, data: impl Into<RequestBody>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the query parameters
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Set a custom query-string serializer
    pub fn params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = Some(serializer);
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set HTTP basic credentials
    pub fn auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set whether credentials are sent cross-origin
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Set the XSRF cookie and header names
    pub fn xsrf(mut self, cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(cookie_name.into());
        self.xsrf_header_name = Some(header_name.into());
        self
    }

    /// Set the response type
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Set the download progress callback
    pub fn on_download_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.on_download_progress = Some(Arc::new(callback));
        self
    }

    /// Attach a cancel token
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Replace the status validator
    pub fn validate_status(mut self, validator: StatusValidator) -> Self {
        self.validate_status = Some(validator);
        self
    }

    /// Set passthrough options for the underlying client
    pub fn fetch_options(mut self, overrides: FetchOverrides) -> Self {
        self.fetch_options = Some(overrides);
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("auth", &self.auth)
            .field("with_credentials", &self.with_credentials)
            .field("response_type", &self.response_type)
            .field("cancel_token", &self.cancel_token.is_some())
            .field("fetch_options", &self.fetch_options)
            .finish_non_exhaustive()
    }
}
