//! Ordered header list

/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// `Authorization` header name
pub const AUTHORIZATION: &str = "Authorization";

/// HTTP header name/value pairs
///
/// Names keep the casing they were inserted with. Lookups and removals compare
/// names case-insensitively, so `content-type` and `Content-Type` address the
/// same header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value stored under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a header, replacing every entry with the same name
    ///
    /// The new entry takes the position of the first replaced entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let position = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(&name));
        self.entries.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));

        match position {
            Some(index) => self.entries.insert(index, (name, value.into())),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Append a header without touching existing entries
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every entry named `name`, returning the first removed value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let mut removed = None;
        self.entries.retain(|(key, value)| {
            if !key.eq_ignore_ascii_case(name) {
                return true;
            }
            if removed.is_none() {
                removed = Some(value.clone());
            }
            false
        });
        removed
    }

    /// Iterate over `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
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

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
