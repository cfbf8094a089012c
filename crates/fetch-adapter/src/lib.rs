//! Request-config transport adapter over a fetch-style HTTP client
//!
//! A [`RequestConfig`] describes one request the way a request library's
//! callers build it: method, URL relative to a base, query params, headers,
//! body, credentials, response type, progress callback and cancel token.
//! [`Adapter::invoke`] translates it into [`FetchOptions`] for a [`Fetch`]
//! client, performs the round trip and yields a normalized [`Response`] or a
//! classified [`AdapterError`].
//!
//! # Example
//!
//! ```no_run
//! use fetch_adapter::{Adapter, Params, RequestConfig};
//!
//! async fn example() -> Result<(), fetch_adapter::AdapterError> {
//!     let adapter = Adapter::new();
//!     let config = RequestConfig::get("/items")
//!         .base_url("https://api.example.com")
//!         .params(Params::new().with("q", "a b"));
//!     let response = adapter.invoke(config).await?;
//!     println!("{}", response.status);
//!     Ok(())
//! }
//! ```

mod adapter;
mod backends;
mod body;
mod cancel;
mod config;
mod environment;
mod error;
mod fetch;
mod headers;
mod response;
mod settle;
mod url_builder;

pub use adapter::{Adapter, AdapterBuilder};
pub use backends::ReqwestFetch;
pub use body::{Blob, FormData, FormValue, RequestBody};
pub use cancel::{AbortController, AbortSignal, Cancel, CancelToken, CancelTokenSource};
pub use config::{
    BasicAuth, ProgressCallback, ProgressEvent, RequestConfig, StatusValidator,
    DEFAULT_XSRF_COOKIE_NAME, DEFAULT_XSRF_HEADER_NAME,
};
pub use environment::{BrowserEnvironment, Environment, NonBrowserEnvironment};
pub use error::{AdapterError, ErrorCode, FetchError};
pub use fetch::{
    Credentials, Fetch, FetchOptions, FetchOverrides, FetchProgress, FetchProgressCallback,
    FetchResponse,
};
pub use headers::{Headers, AUTHORIZATION, CONTENT_TYPE};
pub use response::{RequestHandle, Response, ResponseData, ResponseType};
pub use settle::{Settle, ValidateStatus};
pub use url_builder::{
    build_full_path, build_url, combine_urls, is_absolute_url, serialize_params, ParamValue,
    Params, ParamsSerializer,
};
