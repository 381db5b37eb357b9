//! Minimal URL splitting: a path and a flat query string

use std::collections::BTreeMap;

/// A URL split into its path and query parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Url {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Url {
    /// Split on the first `?`; pairs without `=` get an empty value
    pub fn parse(url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();
        let path = if path.is_empty() { "/".to_string() } else { path.to_string() };
        Self { path, query }
    }
}

/// Join a path with query pairs, keeping the pairs' order
pub fn format(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", path, pairs.join("&"))
}
