use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ServerError;

/// Smallest initial read that can still hold a minimal request line.
pub const MIN_REQUEST_LIMIT: usize = 16;

/// Paths served by the default static handler unless configured otherwise.
pub const DEFAULT_STATIC_PATHS: [&str; 13] = [
    "/index.html",
    "/spring.svg",
    "/spring.png",
    "/resources.html",
    "/styles.css",
    "/app.js",
    "/links.html",
    "/forms.html",
    "/classic.html",
    "/events.html",
    "/events.js",
    "/form.html",
    "/multipart.html",
];

/// Everything the server core needs from the bootstrap layer.
///
/// Missing fields in a config file fall back to [`ServerConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Fixed size of the connection worker pool.
    pub workers: usize,
    /// Upper bound of the single read that must contain the request line and headers.
    pub request_limit: usize,
    pub public_dir: PathBuf,
    pub static_paths: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9999,
            workers: 64,
            request_limit: 4096,
            public_dir: PathBuf::from("public"),
            static_paths: DEFAULT_STATIC_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ServerError> {
        serde_json::from_str(json).map_err(ServerError::config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ServerError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ServerError::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::config("workers must be at least 1"));
        }
        if self.request_limit < MIN_REQUEST_LIMIT {
            return Err(ServerError::config(format!(
                "request_limit must be at least {MIN_REQUEST_LIMIT} bytes, got {}",
                self.request_limit
            )));
        }
        if let Some(path) = self.static_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ServerError::config(format!(
                "static path must start with '/': {path:?}"
            )));
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
