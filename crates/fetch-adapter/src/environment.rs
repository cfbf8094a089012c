//! Host environment capabilities
//!
//! The adapter never reads ambient globals. Anything that depends on where it
//! runs (cookie access, origin checks, HTML parsing) comes from an
//! [`Environment`] passed in at construction.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use scraper::Html;
use url::Url;

/// Capabilities supplied by the host environment
pub trait Environment: Send + Sync {
    /// Whether cookies and same-origin checks are meaningful here
    ///
    /// False in workers, native processes and other non-document contexts.
    fn is_standard_browser(&self) -> bool;

    /// Whether `url` targets the current origin
    fn is_same_origin(&self, url: &str) -> bool;

    /// Read a cookie value by name
    fn read_cookie(&self, name: &str) -> Option<String>;

    /// Parse markup into an HTML document
    fn parse_document(&self, markup: &str) -> Html {
        Html::parse_document(markup)
    }
}

/// Environment without a document: no cookies, nothing is same-origin
#[derive(Debug, Clone, Copy, Default)]
pub struct NonBrowserEnvironment;

impl Environment for NonBrowserEnvironment {
    fn is_standard_browser(&self) -> bool {
        false
    }

    fn is_same_origin(&self, _url: &str) -> bool {
        false
    }

    fn read_cookie(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Snapshot of a browser document: its origin and cookie jar
#[derive(Debug, Clone)]
pub struct BrowserEnvironment {
    location: Url,
    cookies: HashMap<String, String>,
}

impl BrowserEnvironment {
    /// Create an environment for a document loaded from `location`
    pub fn new(location: Url) -> Self {
        Self {
            location,
            cookies: HashMap::new(),
        }
    }

    /// Add a cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Load cookies from a `document.cookie` style string (`a=1; b=2`)
    ///
    /// Values are percent-decoded.
    pub fn with_cookie_string(mut self, cookies: &str) -> Self {
        for pair in cookies.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = percent_decode_str(value.trim()).decode_utf8_lossy();
            self.cookies.insert(name.to_string(), value.into_owned());
        }
        self
    }
}

impl Environment for BrowserEnvironment {
    fn is_standard_browser(&self) -> bool {
        true
    }

    fn is_same_origin(&self, url: &str) -> bool {
        match self.location.join(url) {
            Ok(target) => target.origin() == self.location.origin(),
            Err(err) => {
                tracing::trace!("Could not resolve {} against document location: {}", url, err);
                false
            }
        }
    }

    fn read_cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser() -> BrowserEnvironment {
        let location = Url::parse("https://app.test:8443/dashboard").expect("Valid URL");
        BrowserEnvironment::new(location)
    }

    #[test]
    fn test_non_browser_has_no_capabilities() {
        let env = NonBrowserEnvironment;
        assert!(!env.is_standard_browser());
        assert!(!env.is_same_origin("/items"));
        assert!(env.read_cookie("XSRF-TOKEN").is_none());
    }

    #[test]
    fn test_same_origin_checks_scheme_host_and_port() {
        let env = browser();
        assert!(env.is_same_origin("/api/items"));
        assert!(env.is_same_origin("https://app.test:8443/api"));
        assert!(!env.is_same_origin("https://app.test/api"));
        assert!(!env.is_same_origin("http://app.test:8443/api"));
        assert!(!env.is_same_origin("https://api.test:8443/api"));
        assert!(!env.is_same_origin("//other.test/x"));
    }

    #[test]
    fn test_cookie_string_parsing() {
        let env = browser().with_cookie_string("theme=dark; XSRF-TOKEN=a%20b%3D; broken; =x");
        assert_eq!(env.read_cookie("theme").as_deref(), Some("dark"));
        assert_eq!(env.read_cookie("XSRF-TOKEN").as_deref(), Some("a b="));
        assert!(env.read_cookie("broken").is_none());
    }

    #[test]
    fn test_parse_document() {
        let env = NonBrowserEnvironment;
        let document = env.parse_document("<html><head><title>Hi</title></head></html>");
        let selector = scraper::Selector::parse("title").expect("Valid selector");
        let title = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>());
        assert_eq!(title.as_deref(), Some("Hi"));
    }
}
