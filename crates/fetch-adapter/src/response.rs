//! Normalized responses and body extraction

use std::sync::Arc;

use reqwest::Method;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::body::Blob;
use crate::config::RequestConfig;
use crate::environment::Environment;
use crate::error::FetchError;
use crate::fetch::{FetchOptions, FetchResponse};
use crate::headers::Headers;

/// How the response body should be delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parsed JSON
    #[default]
    Json,
    /// Raw bytes
    ArrayBuffer,
    /// Bytes typed by the response `Content-Type`
    Blob,
    /// UTF-8 text
    Text,
    /// Parsed HTML document
    Document,
    /// Streaming body; not supported
    Stream,
}

/// Response body after extraction
#[derive(Debug, Clone)]
pub enum ResponseData {
    /// Parsed JSON
    Json(Value),
    /// Raw bytes
    ArrayBuffer(Vec<u8>),
    /// Typed bytes
    Blob(Blob),
    /// Text
    Text(String),
    /// Parsed HTML document
    Document(Html),
}

impl ResponseData {
    /// JSON body, if extracted as JSON
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Text body, if extracted as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Raw bytes, if extracted as bytes or a blob
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResponseData::ArrayBuffer(bytes) => Some(bytes),
            ResponseData::Blob(blob) => Some(blob.data()),
            _ => None,
        }
    }

    /// HTML document, if extracted as a document
    pub fn as_document(&self) -> Option<&Html> {
        match self {
            ResponseData::Document(document) => Some(document),
            _ => None,
        }
    }
}

/// Description of a dispatched request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    /// Unique id of this dispatch
    pub id: Uuid,
    /// Method sent
    pub method: Method,
    /// URL requested
    pub url: String,
    /// Headers sent
    pub headers: Headers,
}

impl RequestHandle {
    pub(crate) fn new(url: &str, options: &FetchOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: options.method.clone(),
            url: url.to_string(),
            headers: options.headers.clone(),
        }
    }
}

/// Normalized response
#[derive(Debug, Clone)]
pub struct Response {
    /// Extracted body
    pub data: ResponseData,
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub status_text: String,
    /// Response headers
    pub headers: Headers,
    /// Config the request was made with
    pub config: Arc<RequestConfig>,
    /// Request that produced this response
    pub request: Option<RequestHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyReader {
    Json,
    ArrayBuffer,
    Blob,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostProcess {
    ParseDocument,
}

/// Body-reading strategy for one response type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extraction {
    reader: BodyReader,
    after: Option<PostProcess>,
}

impl Extraction {
    const fn read(reader: BodyReader) -> Self {
        Self {
            reader,
            after: None,
        }
    }

    const fn then(reader: BodyReader, after: PostProcess) -> Self {
        Self {
            reader,
            after: Some(after),
        }
    }

    /// Read the body of `response` and apply post-processing
    pub(crate) async fn extract(
        self,
        response: Box<dyn FetchResponse>,
        environment: &dyn Environment,
    ) -> Result<ResponseData, FetchError> {
        let data = match self.reader {
            BodyReader::Json => ResponseData::Json(response.json().await?),
            BodyReader::ArrayBuffer => ResponseData::ArrayBuffer(response.array_buffer().await?),
            BodyReader::Blob => ResponseData::Blob(response.blob().await?),
            BodyReader::Text => ResponseData::Text(response.text().await?),
        };

        Ok(match (self.after, data) {
            (Some(PostProcess::ParseDocument), ResponseData::Text(markup)) => {
                ResponseData::Document(environment.parse_document(&markup))
            }
            (_, data) => data,
        })
    }
}

/// Response types the adapter can deliver; absent types are unsupported
const EXTRACTIONS: &[(ResponseType, Extraction)] = &[
    (ResponseType::Json, Extraction::read(BodyReader::Json)),
    (ResponseType::ArrayBuffer, Extraction::read(BodyReader::ArrayBuffer)),
    (ResponseType::Blob, Extraction::read(BodyReader::Blob)),
    (ResponseType::Text, Extraction::read(BodyReader::Text)),
    (
        ResponseType::Document,
        Extraction::then(BodyReader::Text, PostProcess::ParseDocument),
    ),
];

impl ResponseType {
    pub(crate) fn extraction(self) -> Option<Extraction> {
        EXTRACTIONS
            .iter()
            .find(|(response_type, _)| *response_type == self)
            .map(|(_, extraction)| *extraction)
    }
}
