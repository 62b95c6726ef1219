use std::collections::HashMap;

use super::{BodyParts, Headers, Method};

/// One parsed request, built in a single pass by [`parser`](super::parser).
///
/// `path` never includes the query string. `query_params` and `body_parts` are
/// empty, never absent, when there is nothing to report.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: Headers,
    pub body: String,
    pub body_parts: BodyParts,
}

impl Request {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers.get_ignore_case(name)
    }

    /// First value submitted under `name`.
    pub fn body_part(&self, name: &str) -> Option<&str> {
        self.body_parts.first(name)
    }

    pub fn body_parts(&self, name: &str) -> &[String] {
        self.body_parts.get(name).unwrap_or_default()
    }
}
