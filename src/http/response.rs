use std::io::{self, Write};

use super::StatusCode;

/// An HTTP/1.1 response as written by handlers.
///
/// Only `Content-Type` (when set), `Content-Length` and `Connection: close` are
/// emitted.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new `Response` with the given status code and an empty body.
    pub fn new(status_code: StatusCode) -> Response {
        Response {
            status_code,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
    }

    /// Converts the response to the bytes sent over the wire: status line,
    /// headers, blank line, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut response = Vec::with_capacity(128 + self.body.len());

        let status_line = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status_code.code(),
            self.status_code.reason_phrase()
        );
        response.extend_from_slice(status_line.as_bytes());

        if let Some(content_type) = &self.content_type {
            response.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        response.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        response.extend_from_slice(b"Connection: close\r\n");

        response.extend_from_slice(b"\r\n");
        response.extend_from_slice(&self.body);

        response
    }

    /// Writes the response and flushes `out`.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(&self.to_bytes())?;
        out.flush()
    }
}
