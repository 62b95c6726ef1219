use std::collections::HashMap;
use std::io::{self, Read};

use tracing::debug;
use url::form_urlencoded;

use super::scan::{self, CRLF, CRLF_CRLF};
use super::{BodyParts, Headers, Method, Request, body};
use crate::error::ParseError;

const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_TYPE: &str = "Content-Type";

/// Request line and headers, decoded from the initial read.
#[derive(Debug)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: Headers,
    /// Offset of the first body byte inside the scanned buffer.
    pub body_start: usize,
}

/// Reads one request from `reader`.
///
/// The request line and headers must arrive in a single read of at most
/// `request_limit` bytes. A POST body is then taken from whatever that read
/// captured past the headers, followed by the reader itself, until exactly
/// `Content-Length` bytes are consumed.
pub fn read_request<R: Read>(reader: &mut R, request_limit: usize) -> Result<Request, ParseError> {
    let mut buffer = vec![0; request_limit];
    let read = reader.read(&mut buffer)?;
    if read == 0 {
        return Err(ParseError::EmptyRequest);
    }
    let buffer = &buffer[..read];

    let head = parse_head(buffer)?;
    debug!(method = %head.method, path = %head.path, headers = %head.headers, "parsed request head");

    let (body, body_parts) = match head.method {
        Method::Get => (String::new(), BodyParts::new()),
        Method::Post => read_body(&head.headers, &buffer[head.body_start..], reader)?,
    };

    Ok(Request {
        method: head.method,
        path: head.path,
        query_params: head.query_params,
        headers: head.headers,
        body,
        body_parts,
    })
}

/// Decodes the request line and header block out of `buffer`.
pub fn parse_head(buffer: &[u8]) -> Result<RequestHead, ParseError> {
    let line_end = scan::find(buffer, CRLF, 0, buffer.len()).ok_or(
        ParseError::RequestLineTooLong {
            scanned: buffer.len(),
        },
    )?;
    let line = std::str::from_utf8(&buffer[..line_end]).map_err(|_| ParseError::InvalidEncoding)?;
    let (method, target) = parse_request_line(line)?;
    let (path, query_params) = split_target(target);

    // Searching from the request line's own CRLF lets an empty header block match.
    let headers_end = scan::find(buffer, CRLF_CRLF, line_end, buffer.len()).ok_or(
        ParseError::MissingHeaderTerminator {
            scanned: buffer.len(),
        },
    )?;
    let headers = if headers_end > line_end {
        Headers::decode(&String::from_utf8_lossy(
            &buffer[line_end + CRLF.len()..headers_end],
        ))
    } else {
        Headers::new()
    };

    Ok(RequestHead {
        method,
        path,
        query_params,
        headers,
        body_start: headers_end + CRLF_CRLF.len(),
    })
}

/// Splits `METHOD SP target SP version` into the method and raw target.
///
/// Tokens are separated by exactly one space; the version token is not inspected.
pub fn parse_request_line(line: &str) -> Result<(Method, &str), ParseError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let [method, target, _version] = tokens.as_slice() else {
        return Err(ParseError::MalformedRequestLine {
            found: tokens.len(),
        });
    };

    let method = method.parse::<Method>()?;
    if !target.starts_with('/') {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }
    Ok((method, *target))
}

/// Splits a target at the first `?` into the path and its decoded query.
///
/// Repeated query keys keep the last value.
pub fn split_target(target: &str) -> (String, HashMap<String, String>) {
    match target.split_once('?') {
        Some((path, query)) => (
            path.to_string(),
            form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        ),
        None => (target.to_string(), HashMap::new()),
    }
}

fn read_body<R: Read>(
    headers: &Headers,
    buffered: &[u8],
    reader: &mut R,
) -> Result<(String, BodyParts), ParseError> {
    let Some(length) = content_length(headers) else {
        return Ok((String::new(), BodyParts::new()));
    };

    let mut bytes = Vec::with_capacity(length.min(buffered.len()));
    buffered
        .chain(reader)
        .take(length as u64)
        .read_to_end(&mut bytes)?;
    if bytes.len() < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("body ended after {} of {length} bytes", bytes.len()),
        )
        .into());
    }

    let body = String::from_utf8_lossy(&bytes).into_owned();
    let body_parts = body::decode(headers.get_ignore_case(CONTENT_TYPE), &body);
    if !body_parts.is_empty() {
        debug!(body_parts = %body_parts, "decoded request body");
    }
    Ok((body, body_parts))
}

/// Declared body length; absent, non-numeric, zero and negative all mean no body.
fn content_length(headers: &Headers) -> Option<usize> {
    headers
        .get_ignore_case(CONTENT_LENGTH)
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|&length| length > 0)
        .and_then(|length| usize::try_from(length).ok())
}
