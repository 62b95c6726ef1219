//! Request body decoding.
//!
//! Two encodings are understood, chosen by a case-insensitive prefix match on
//! the request's `Content-Type`:
//!
//! ```text
//! application/x-www-form-urlencoded      a=1&b=2&a=3
//! multipart/form-data; boundary=X        --X\r\n<part headers>\r\n\r\n<content>\r\n--X--
//! ```
//!
//! Anything else decodes to an empty [`BodyParts`]. Malformed multipart parts
//! are dropped one at a time; they never fail the request.

use std::fmt;

use tracing::debug;
use url::form_urlencoded;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

const CONTENT_DISPOSITION: &str = "Content-Disposition";
const CONTENT_TYPE: &str = "Content-Type";
const PART_HEAD_END: &str = "\r\n\r\n";

/// Decoded body fields: field name to every value submitted under it.
///
/// Field order follows first appearance; values keep submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyParts {
    fields: Vec<(String, Vec<String>)>,
}

impl BodyParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: String) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((name.to_string(), vec![value])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for BodyParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, values)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}=[{}]", values.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// Decodes `body` according to `content_type`.
pub fn decode(content_type: Option<&str>, body: &str) -> BodyParts {
    let Some(content_type) = content_type else {
        return BodyParts::new();
    };

    if starts_with_ignore_case(content_type, FORM_URLENCODED) {
        decode_urlencoded(body)
    } else if starts_with_ignore_case(content_type, MULTIPART_FORM_DATA) {
        match boundary(content_type) {
            Some(boundary) => decode_multipart(body, boundary),
            None => {
                debug!(content_type, "multipart body without boundary parameter");
                BodyParts::new()
            }
        }
    } else {
        BodyParts::new()
    }
}

pub fn decode_urlencoded(body: &str) -> BodyParts {
    let mut parts = BodyParts::new();
    for (name, value) in form_urlencoded::parse(body.as_bytes()) {
        parts.append(&name, value.into_owned());
    }
    parts
}

/// Extracts the `boundary` parameter of a multipart `Content-Type`.
pub fn boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

pub fn decode_multipart(body: &str, boundary: &str) -> BodyParts {
    let delimiter = format!("--{boundary}");
    let mut parts = BodyParts::new();

    for segment in body.split(delimiter.as_str()) {
        // preamble, or the tail of the closing `--X--` marker
        if segment.trim().is_empty() || segment.starts_with("--") {
            continue;
        }

        match Part::parse(segment) {
            Some(part) => {
                let (name, value) = part.into_field();
                parts.append(&name, value);
            }
            None => debug!("skipping malformed multipart segment"),
        }
    }
    parts
}

#[derive(Debug)]
struct Part<'a> {
    name: String,
    filename: Option<String>,
    content_type: Option<&'a str>,
    content: &'a str,
}

impl<'a> Part<'a> {
    fn parse(segment: &'a str) -> Option<Self> {
        let (head, content) = segment.split_once(PART_HEAD_END)?;

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;
        for line in head.trim().split("\r\n") {
            let Some((header, value)) = line.split_once(':') else {
                continue;
            };
            let header = header.trim();
            if header.eq_ignore_ascii_case(CONTENT_DISPOSITION) {
                name = disposition_param(value, "name");
                filename = disposition_param(value, "filename");
            } else if header.eq_ignore_ascii_case(CONTENT_TYPE) {
                content_type = Some(value.trim());
            }
        }

        Some(Part {
            name: name?,
            filename,
            content_type,
            content: content.trim(),
        })
    }

    /// Field name and the value stored under it; file parts are tagged.
    fn into_field(self) -> (String, String) {
        let value = match (self.filename, self.content_type) {
            (Some(filename), Some(content_type)) => {
                format!("FILE: {filename} {content_type} => {}", self.content)
            }
            _ => self.content.to_string(),
        };
        (self.name, value)
    }
}

/// Reads a `key="value"` parameter out of a `Content-Disposition` value.
///
/// The value is the text between the first and second `"` and may contain `;`.
fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    let (_, value) = split_params(disposition)
        .into_iter()
        .filter_map(|param| param.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))?;
    let (quoted, _) = value.trim().strip_prefix('"')?.split_once('"')?;
    Some(quoted.to_string())
}

/// Splits header parameters on `;`, ignoring separators inside quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (idx, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

pub(crate) fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
