//! Request body kinds

use serde_json::Value;

/// Binary payload with an optional media type
///
/// A blob that carries a file name is treated as a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
    media_type: Option<String>,
    name: Option<String>,
}

impl Blob {
    /// Create an untyped blob
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            media_type: None,
            name: None,
        }
    }

    /// Create a named file
    pub fn file(data: impl Into<Vec<u8>>, name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: None,
            name: Some(name.into()),
        }
    }

    /// Declare the blob's media type
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the blob, returning its bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Declared media type, if any and not empty
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref().filter(|t| !t.is_empty())
    }

    /// File name, if this blob is a file
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this blob is a file
    pub fn is_file(&self) -> bool {
        self.name.is_some()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Value of a single multipart field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field
    Text(String),
    /// Binary field, sent as a file part when the blob is named
    Blob(Blob),
}

/// Multipart form data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Add a binary field
    pub fn blob(mut self, name: impl Into<String>, blob: Blob) -> Self {
        self.fields.push((name.into(), FormValue::Blob(blob)));
        self
    }

    /// Iterate over fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Consume the form, returning its fields
    pub fn into_fields(self) -> Vec<(String, FormValue)> {
        self.fields
    }

    /// Whether the form has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document
    Json(Value),
    /// Text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Multipart form data
    Form(FormData),
    /// Blob or file
    Blob(Blob),
}

impl RequestBody {
    /// Whether the body is multipart form data
    pub fn is_form_data(&self) -> bool {
        matches!(self, RequestBody::Form(_))
    }

    /// Whether the body is a blob or file that declares its own media type
    pub fn is_typed_blob(&self) -> bool {
        matches!(self, RequestBody::Blob(blob) if blob.media_type().is_some())
    }

    /// Whether the body counts as empty and must not be sent
    ///
    /// Empty text, empty bytes, and the JSON values `null`, `false`, `0` and
    /// `""` are empty. Forms and blobs never are.
    pub fn is_falsy(&self) -> bool {
        match self {
            RequestBody::Text(text) => text.is_empty(),
            RequestBody::Bytes(bytes) => bytes.is_empty(),
            RequestBody::Json(value) => match value {
                Value::Null => true,
                Value::Bool(flag) => !flag,
                Value::Number(number) => number.as_f64() == Some(0.0),
                Value::String(text) => text.is_empty(),
                Value::Array(_) | Value::Object(_) => false,
            },
            RequestBody::Form(_) | RequestBody::Blob(_) => false,
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<FormData> for RequestBody {
    fn from(form: FormData) -> Self {
        RequestBody::Form(form)
    }
}

impl From<Blob> for RequestBody {
    fn from(blob: Blob) -> Self {
        RequestBody::Blob(blob)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_typed_blob_detection() {
        assert!(RequestBody::from(Blob::new(vec![1, 2]).with_type("image/png")).is_typed_blob());
        assert!(RequestBody::from(Blob::file("a,b", "data.csv").with_type("text/csv"))
            .is_typed_blob());
        assert!(!RequestBody::from(Blob::new(vec![1, 2])).is_typed_blob());
        assert!(!RequestBody::from(Blob::new(vec![1]).with_type("")).is_typed_blob());
        assert!(!RequestBody::from("text").is_typed_blob());
    }

    #[test]
    fn test_form_data_detection() {
        let form = FormData::new().text("name", "value");
        assert!(RequestBody::from(form).is_form_data());
        assert!(!RequestBody::from(json!({"a": 1})).is_form_data());
    }

    #[test]
    fn test_falsy_bodies() {
        assert!(RequestBody::from("").is_falsy());
        assert!(RequestBody::from(Vec::new()).is_falsy());
        assert!(RequestBody::from(json!(null)).is_falsy());
        assert!(RequestBody::from(json!(false)).is_falsy());
        assert!(RequestBody::from(json!(0)).is_falsy());
        assert!(RequestBody::from(json!("")).is_falsy());
    }

    #[test]
    fn test_truthy_bodies() {
        assert!(!RequestBody::from("x").is_falsy());
        assert!(!RequestBody::from(json!({})).is_falsy());
        assert!(!RequestBody::from(json!([])).is_falsy());
        assert!(!RequestBody::from(json!(1)).is_falsy());
        assert!(!RequestBody::from(FormData::new()).is_falsy());
        assert!(!RequestBody::from(Blob::new(Vec::new())).is_falsy());
    }

    #[test]
    fn test_file_is_named_blob() {
        let file = Blob::file(b"hello".to_vec(), "hello.txt");
        assert!(file.is_file());
        assert_eq!(file.name(), Some("hello.txt"));
        assert_eq!(file.len(), 5);
        assert!(!Blob::new(b"x".to_vec()).is_file());
    }
}
