//! reqwest-based fetch client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::body::{Blob, FormValue, RequestBody};
use crate::cancel::AbortSignal;
use crate::error::FetchError;
use crate::fetch::{Fetch, FetchOptions, FetchProgress, FetchProgressCallback, FetchResponse};
use crate::headers::{Headers, CONTENT_TYPE};

/// Fetch client backed by [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    inner: reqwest::Client,
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetch {
    /// Create a client with default settings
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Wrap a preconfigured [`reqwest::Client`]
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

fn blob_part(blob: Blob) -> Result<Part, FetchError> {
    let media_type = blob.media_type().map(str::to_string);
    let name = blob.name().map(str::to_string);
    let mut part = Part::bytes(blob.into_data());
    if let Some(name) = name {
        part = part.file_name(name);
    }
    match media_type {
        Some(media_type) => part.mime_str(&media_type).map_err(FetchError::from),
        None => Ok(part),
    }
}

fn with_body(
    request: reqwest::RequestBuilder,
    body: RequestBody,
    has_content_type: bool,
) -> Result<reqwest::RequestBuilder, FetchError> {
    Ok(match body {
        RequestBody::Json(value) if has_content_type => request.body(serde_json::to_vec(&value)?),
        RequestBody::Json(value) => request.json(&value),
        RequestBody::Text(text) if has_content_type => request.body(text),
        RequestBody::Text(text) => request
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(text),
        RequestBody::Bytes(bytes) => request.body(bytes),
        RequestBody::Blob(blob) => {
            let request = match blob.media_type() {
                Some(media_type) if !has_content_type => request.header(CONTENT_TYPE, media_type),
                _ => request,
            };
            request.body(blob.into_data())
        }
        RequestBody::Form(form) => {
            let mut multipart = Form::new();
            for (name, value) in form.into_fields() {
                multipart = match value {
                    FormValue::Text(text) => multipart.text(name, text),
                    FormValue::Blob(blob) => multipart.part(name, blob_part(blob)?),
                };
            }
            request.multipart(multipart)
        }
    })
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<Box<dyn FetchResponse>, FetchError> {
        let FetchOptions {
            method,
            timeout,
            headers,
            credentials,
            signal,
            on_download_progress,
            body,
        } = options;

        if let Some(credentials) = credentials {
            tracing::trace!(
                "Credentials mode {} has no native equivalent, ignoring",
                credentials.as_str()
            );
        }

        let mut request = self.inner.request(method, url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let has_content_type = headers.contains(CONTENT_TYPE);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = with_body(request, body, has_content_type)?;
        }

        let response = match &signal {
            Some(signal) => tokio::select! {
                biased;
                () = signal.aborted() => return Err(FetchError::Aborted),
                response = request.send() => response?,
            },
            None => request.send().await?,
        };

        Ok(Box::new(ReqwestResponse::new(
            response,
            signal,
            on_download_progress,
        )))
    }
}

struct ReqwestResponse {
    status: u16,
    status_text: String,
    headers: Headers,
    inner: reqwest::Response,
    signal: Option<AbortSignal>,
    on_download_progress: Option<FetchProgressCallback>,
}

impl ReqwestResponse {
    fn new(
        response: reqwest::Response,
        signal: Option<AbortSignal>,
        on_download_progress: Option<FetchProgressCallback>,
    ) -> Self {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            inner: response,
            signal,
            on_download_progress,
        }
    }
}

#[async_trait]
impl FetchResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    async fn array_buffer(self: Box<Self>) -> Result<Vec<u8>, FetchError> {
        let Self {
            mut inner,
            signal,
            on_download_progress,
            ..
        } = *self;

        let total_bytes = inner.content_length().unwrap_or(0);
        let report = |transferred_bytes: usize| {
            if let Some(callback) = &on_download_progress {
                callback(FetchProgress {
                    transferred_bytes: transferred_bytes as u64,
                    total_bytes,
                });
            }
        };

        let mut body = Vec::new();
        report(0);

        loop {
            let chunk = match &signal {
                Some(signal) => tokio::select! {
                    biased;
                    () = signal.aborted() => return Err(FetchError::Aborted),
                    chunk = inner.chunk() => chunk?,
                },
                None => inner.chunk().await?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            body.extend_from_slice(&chunk);
            report(body.len());
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn built(body: RequestBody, content_type: Option<&str>) -> reqwest::Request {
        let mut request = reqwest::Client::new().post("http://api.test/upload");
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        with_body(request, body, content_type.is_some())
            .expect("Body should attach")
            .build()
            .expect("Request should build")
    }

    fn content_type(request: &reqwest::Request) -> Option<&str> {
        request
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    fn body_bytes(request: &reqwest::Request) -> &[u8] {
        request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("Buffered body")
    }

    #[test]
    fn test_from_reqwest() {
        let fetch = ReqwestFetch::from_reqwest(reqwest::Client::new());
        let _ = format!("{:?}", fetch);
    }

    #[test]
    fn test_json_body_defaults_content_type() {
        let request = built(RequestBody::Json(json!({"a": 1})), None);
        assert_eq!(content_type(&request), Some("application/json"));
        assert_eq!(body_bytes(&request), br#"{"a":1}"#);
    }

    #[test]
    fn test_json_body_keeps_caller_content_type() {
        let request = built(
            RequestBody::Json(json!({"a": 1})),
            Some("application/vnd.api+json"),
        );
        assert_eq!(content_type(&request), Some("application/vnd.api+json"));
        assert_eq!(body_bytes(&request), br#"{"a":1}"#);
    }

    #[test]
    fn test_text_body_defaults_to_plain_text() {
        let request = built(RequestBody::Text("hi".to_string()), None);
        assert_eq!(content_type(&request), Some("text/plain;charset=UTF-8"));
        assert_eq!(body_bytes(&request), b"hi");
    }

    #[test]
    fn test_blob_body_sends_its_media_type() {
        let request = built(
            RequestBody::Blob(Blob::new(b"png".to_vec()).with_type("image/png")),
            None,
        );
        assert_eq!(content_type(&request), Some("image/png"));
        assert_eq!(body_bytes(&request), b"png");
    }

    #[test]
    fn test_bytes_body_sets_no_content_type() {
        let request = built(RequestBody::Bytes(vec![1, 2, 3]), None);
        assert_eq!(content_type(&request), None);
        assert_eq!(body_bytes(&request), &[1, 2, 3]);
    }

    #[test]
    fn test_blob_part_rejects_invalid_media_type() {
        let blob = Blob::file(b"x".to_vec(), "x.bin").with_type("not a mime type");
        assert!(blob_part(blob).is_err());
    }

    #[test]
    fn test_blob_part_accepts_typed_file() {
        let blob = Blob::file(b"x".to_vec(), "x.png").with_type("image/png");
        assert!(blob_part(blob).is_ok());
    }
}
