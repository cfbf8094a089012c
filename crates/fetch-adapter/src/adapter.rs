//! Request-config to fetch translation
//!
//! [`Adapter::invoke`] takes a [`RequestConfig`], assembles the URL and
//! [`FetchOptions`] for the underlying [`Fetch`] client, performs one round
//! trip and hands the normalized [`Response`] to the [`Settle`] policy.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::backends::ReqwestFetch;
use crate::cancel::AbortController;
use crate::config::{ProgressEvent, RequestConfig};
use crate::environment::{Environment, NonBrowserEnvironment};
use crate::error::{AdapterError, FetchError};
use crate::fetch::{Credentials, Fetch, FetchOptions, FetchProgress};
use crate::headers::{Headers, AUTHORIZATION, CONTENT_TYPE};
use crate::response::{Extraction, RequestHandle, Response, ResponseData};
use crate::settle::{Settle, ValidateStatus};
use crate::url_builder::{build_full_path, build_url};

type Outcome = Result<Response, AdapterError>;

/// Transport adapter over a fetch-style client
#[derive(Clone)]
pub struct Adapter {
    fetch: Arc<dyn Fetch>,
    environment: Arc<dyn Environment>,
    settle: Arc<dyn Settle>,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter").finish_non_exhaustive()
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new()
    }
}

struct Received {
    status: u16,
    status_text: String,
    headers: Headers,
    data: ResponseData,
}

impl Adapter {
    /// Adapter over a default [`ReqwestFetch`] outside any browser document
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create an adapter builder
    pub fn builder() -> AdapterBuilder {
        AdapterBuilder::default()
    }

    /// Dispatch one request described by `config`
    #[instrument(skip_all, fields(method = %config.method, url = %config.url))]
    pub async fn invoke(&self, config: RequestConfig) -> Result<Response, AdapterError> {
        let config = Arc::new(config);
        let mut headers = config.headers.clone();
        let data = config.data.clone();

        if data
            .as_ref()
            .is_some_and(|data| data.is_form_data() || data.is_typed_blob())
        {
            // The client derives the multipart boundary or blob type itself
            headers.remove(CONTENT_TYPE);
        }

        if let Some(auth) = &config.auth {
            headers.set(AUTHORIZATION, auth.header_value());
        }

        let full_path = build_full_path(config.base_url.as_deref(), &config.url);
        let url = build_url(
            &full_path,
            config.params.as_ref(),
            config.params_serializer.as_ref(),
        );

        let mut options = FetchOptions::new(config.method.clone());
        options.timeout = config.timeout.filter(|timeout| !timeout.is_zero());

        if self.environment.is_standard_browser() {
            if let (Some(value), Some(header_name)) = (
                self.xsrf_value(&config, &full_path),
                config.xsrf_header_name.as_deref(),
            ) {
                headers.set(header_name, value);
            }
        }

        for (name, value) in headers.iter() {
            if data.is_none() && name.eq_ignore_ascii_case(CONTENT_TYPE) {
                continue;
            }
            options.headers.set(name, value);
        }

        options.credentials = config.with_credentials.map(Credentials::from);

        let Some(extraction) = config.response_type.extraction() else {
            tracing::warn!("Rejecting request for unsupported stream response type");
            return Err(AdapterError::Unsupported { config });
        };

        if let Some(callback) = &config.on_download_progress {
            let callback = Arc::clone(callback);
            options.on_download_progress = Some(Arc::new(move |progress: FetchProgress| {
                callback(ProgressEvent::from(progress))
            }));
        }

        let abort = config.cancel_token.as_ref().map(|_| AbortController::new());
        options.signal = abort.as_ref().map(AbortController::signal);

        options.body = data.filter(|data| !data.is_falsy());

        if let Some(overrides) = &config.fetch_options {
            options.merge(overrides);
        }

        let request = RequestHandle::new(&url, &options);
        tracing::trace!(?options, "Assembled fetch options");

        let main = self.dispatch(&config, &url, options, extraction, request);

        // The first branch to complete decides the outcome; the other is dropped
        match (&config.cancel_token, &abort) {
            (Some(token), Some(abort)) => {
                tokio::select! {
                    biased;
                    reason = token.cancelled() => {
                        abort.abort();
                        tracing::debug!("Request cancelled before settling: {}", reason);
                        Err(AdapterError::Canceled {
                            reason,
                            config: Arc::clone(&config),
                        })
                    }
                    outcome = main => outcome,
                }
            }
            _ => main.await,
        }
    }

    fn xsrf_value(&self, config: &RequestConfig, full_path: &str) -> Option<String> {
        let cookie_name = config.xsrf_cookie_name.as_deref()?;
        if config.with_credentials == Some(true) || self.environment.is_same_origin(full_path) {
            self.environment
                .read_cookie(cookie_name)
                .filter(|value| !value.is_empty())
        } else {
            None
        }
    }

    async fn dispatch(
        &self,
        config: &Arc<RequestConfig>,
        url: &str,
        options: FetchOptions,
        extraction: Extraction,
        request: RequestHandle,
    ) -> Outcome {
        tracing::debug!("Dispatching {} {}", options.method, url);

        match self.round_trip(url, options, extraction).await {
            Ok(received) => self.settle.settle(Response {
                data: received.data,
                status: received.status,
                status_text: received.status_text,
                headers: received.headers,
                config: Arc::clone(config),
                request: Some(request),
            }),
            Err(FetchError::Aborted) => {
                tracing::warn!("Request to {} was aborted", url);
                Err(AdapterError::Aborted {
                    config: Arc::clone(config),
                    request: Some(request),
                })
            }
            Err(source) => {
                tracing::warn!("Request to {} failed: {}", url, source);
                Err(AdapterError::Network {
                    config: Arc::clone(config),
                    request: Some(request),
                    source,
                })
            }
        }
    }

    async fn round_trip(
        &self,
        url: &str,
        options: FetchOptions,
        extraction: Extraction,
    ) -> Result<Received, FetchError> {
        let response = self.fetch.fetch(url, options).await?;
        let status = response.status();
        let status_text = response.status_text().to_string();
        let headers = response.headers().clone();
        tracing::debug!("Received {} {} from {}", status, status_text, url);

        let data = extraction
            .extract(response, self.environment.as_ref())
            .await?;

        Ok(Received {
            status,
            status_text,
            headers,
            data,
        })
    }
}

/// Builder for [`Adapter`]
#[derive(Default)]
pub struct AdapterBuilder {
    fetch: Option<Arc<dyn Fetch>>,
    environment: Option<Arc<dyn Environment>>,
    settle: Option<Arc<dyn Settle>>,
}

impl fmt::Debug for AdapterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("fetch", &self.fetch.is_some())
            .field("environment", &self.environment.is_some())
            .field("settle", &self.settle.is_some())
            .finish()
    }
}

impl AdapterBuilder {
    /// Underlying fetch client (default: [`ReqwestFetch`])
    pub fn fetch(mut self, fetch: impl Fetch + 'static) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    /// Shared underlying fetch client
    pub fn fetch_arc(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Host environment (default: [`NonBrowserEnvironment`])
    pub fn environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    /// Settlement policy (default: [`ValidateStatus`])
    pub fn settle(mut self, settle: impl Settle + 'static) -> Self {
        self.settle = Some(Arc::new(settle));
        self
    }

    /// Build the adapter
    pub fn build(self) -> Adapter {
        Adapter {
            fetch: self
                .fetch
                .unwrap_or_else(|| Arc::new(ReqwestFetch::new())),
            environment: self
                .environment
                .unwrap_or_else(|| Arc::new(NonBrowserEnvironment)),
            settle: self.settle.unwrap_or_else(|| Arc::new(ValidateStatus)),
        }
    }
}
