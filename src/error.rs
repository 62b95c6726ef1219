use std::io;

use thiserror::Error;

/// Why a connection's initial read could not become a [`Request`](crate::Request).
///
/// Every variant except [`ParseError::Io`] is a protocol failure and is answered
/// with the built-in `400 Bad Request`.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("connection closed before a request line was received")]
    EmptyRequest,

    #[error("request line not terminated within {scanned} bytes")]
    RequestLineTooLong { scanned: usize },

    #[error("request line is not valid utf-8")]
    InvalidEncoding,

    #[error("request line must have 3 tokens, found {found}")]
    MalformedRequestLine { found: usize },

    #[error("unsupported http method: {0:?}")]
    UnsupportedMethod(String),

    #[error("request target must start with '/': {0:?}")]
    InvalidTarget(String),

    #[error("header block not terminated within {scanned} bytes")]
    MissingHeaderTerminator { scanned: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// Socket failures drop the connection without a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ParseError::Io { .. })
    }
}

/// Failures that end a connection without a guaranteed response.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),

    #[error("handler failed: {0}")]
    Handler(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("failed to start worker pool: {source}")]
    WorkerPool { source: io::Error },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ServerError {
    pub fn config<S: ToString>(reason: S) -> Self {
        Self::Config {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_errors_are_transport_failures() {
        let io = ParseError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "short body"));
        assert!(io.is_transport());
        assert!(!ParseError::EmptyRequest.is_transport());
        assert!(!ParseError::UnsupportedMethod("PATCH".into()).is_transport());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = ParseError::MalformedRequestLine { found: 2 };
        assert_eq!(err.to_string(), "request line must have 3 tokens, found 2");
        let err = ParseError::InvalidTarget("index.html".into());
        assert_eq!(err.to_string(), "request target must start with '/': \"index.html\"");
    }
}
