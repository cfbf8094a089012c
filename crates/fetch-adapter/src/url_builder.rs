//! Full-path and query-string construction

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde_json::{Number, Value};

/// Characters escaped in query keys and values
///
/// Everything `encodeURIComponent` escapes, except `@ $ , : [ ]` which stay
/// readable in query strings.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b'$')
    .remove(b',')
    .remove(b':')
    .remove(b'[')
    .remove(b']');

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([a-z][a-z\d+\-.]*:)?//").expect("valid absolute URL pattern"));

/// Query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Skipped when serializing
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// String
    String(String),
    /// Timestamp, serialized as ISO-8601
    Date(DateTime<Utc>),
    /// Repeated under `key[]`
    Array(Vec<ParamValue>),
    /// Serialized as JSON
    Object(Value),
}

impl ParamValue {
    fn serialize(&self) -> String {
        match self {
            ParamValue::Null => "null".to_string(),
            ParamValue::Bool(flag) => flag.to_string(),
            ParamValue::Number(number) => number.to_string(),
            ParamValue::String(text) => text.clone(),
            ParamValue::Date(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
            ParamValue::Array(values) => {
                Value::Array(values.iter().map(ParamValue::to_json).collect()).to_string()
            }
            ParamValue::Object(value) => value.to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::Null => Value::Null,
            ParamValue::Bool(flag) => Value::Bool(*flag),
            ParamValue::Number(number) => Value::Number(number.clone()),
            ParamValue::String(text) => Value::String(text.clone()),
            ParamValue::Date(date) => {
                Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            ParamValue::Array(values) => {
                Value::Array(values.iter().map(ParamValue::to_json).collect())
            }
            ParamValue::Object(value) => value.clone(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::String(text.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        ParamValue::String(text)
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        ParamValue::Bool(flag)
    }
}

impl From<i64> for ParamValue {
    fn from(number: i64) -> Self {
        ParamValue::Number(number.into())
    }
}

impl From<u64> for ParamValue {
    fn from(number: u64) -> Self {
        ParamValue::Number(number.into())
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(date: DateTime<Utc>) -> Self {
        ParamValue::Date(date)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(flag) => ParamValue::Bool(flag),
            Value::Number(number) => ParamValue::Number(number),
            Value::String(text) => ParamValue::String(text),
            Value::Array(values) => {
                ParamValue::Array(values.into_iter().map(ParamValue::from).collect())
            }
            object @ Value::Object(_) => ParamValue::Object(object),
        }
    }
}

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Iterate over parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Custom query-string serializer
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    /// Wrap a serializer function
    pub fn new<F>(serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(serializer))
    }

    /// Serialize `params`
    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsSerializer").finish_non_exhaustive()
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT).to_string()
}

/// Whether `url` is absolute (`scheme://` or protocol-relative `//`)
pub fn is_absolute_url(url: &str) -> bool {
    ABSOLUTE_URL.is_match(url)
}

/// Join a base URL and a relative URL with exactly one slash
pub fn combine_urls(base_url: &str, relative_url: &str) -> String {
    if relative_url.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        relative_url.trim_start_matches('/')
    )
}

/// Resolve the requested URL against an optional base URL
///
/// Absolute requested URLs ignore the base.
pub fn build_full_path(base_url: Option<&str>, requested_url: &str) -> String {
    match base_url {
        Some(base) if !base.is_empty() && !is_absolute_url(requested_url) => {
            combine_urls(base, requested_url)
        }
        _ => requested_url.to_string(),
    }
}

/// Default query-string serialization
pub fn serialize_params(params: &Params) -> String {
    let mut parts = Vec::new();

    for (key, value) in params.iter() {
        match value {
            ParamValue::Null => continue,
            ParamValue::Array(values) => {
                let key = encode(&format!("{}[]", key));
                for value in values {
                    parts.push(format!("{}={}", key, encode(&value.serialize())));
                }
            }
            value => parts.push(format!("{}={}", encode(key), encode(&value.serialize()))),
        }
    }

    parts.join("&")
}

/// Append serialized `params` to `url`
///
/// A fragment is dropped when a query is appended. No `?` is added when the
/// serialized query is empty.
pub fn build_url(
    url: &str,
    params: Option<&Params>,
    serializer: Option<&ParamsSerializer>,
) -> String {
    let Some(params) = params else {
        return url.to_string();
    };

    let query = match serializer {
        Some(serializer) => serializer.serialize(params),
        None => serialize_params(params),
    };

    if query.is_empty() {
        return url.to_string();
    }

    let base = match url.find('#') {
        Some(index) => &url[..index],
        None => url,
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    format!("{}{}{}", base, separator, query)
}
