use std::fmt;

/// Request headers in the order they were first received.
///
/// Names are compared exactly as received. Inserting a name that is already
/// present replaces its value in place, so the last duplicate wins while the
/// original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Entry>,
    inserts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    value: String,
    // insert count when the value was last set
    stamp: usize,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a header block (`Name: Value` lines separated by CRLF).
    ///
    /// Surrounding whitespace is trimmed from names and values. Lines without a
    /// colon are skipped.
    pub fn decode(block: &str) -> Self {
        let mut headers = Headers::new();
        for line in block.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            headers.insert(name, value.trim());
        }
        headers
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.inserts += 1;
        let stamp = self.inserts;
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.value = value.to_string();
                entry.stamp = stamp;
            }
            None => self.entries.push(Entry {
                name: name.to_string(),
                value: value.to_string(),
                stamp,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    /// ASCII case-insensitive lookup. When several spellings are present, the
    /// value inserted last wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.name.eq_ignore_ascii_case(name))
            .max_by_key(|e| e.stamp)
            .map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.name.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_trims() {
        let headers = Headers::decode("Host:  localhost:9999 \r\n  Accept : */*");
        assert_eq!(headers.get("Host"), Some("localhost:9999"));
        assert_eq!(headers.get("Accept"), Some("*/*"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn last_duplicate_wins_and_order_is_kept() {
        let headers = Headers::decode("A: 1\r\nB: 2\r\nA: 3\r\nC: 4");
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("A", "3"), ("B", "2"), ("C", "4")]);
    }

    #[test]
    fn skips_lines_without_colon() {
        let headers = Headers::decode("garbage line\r\nHost: a\r\n\r\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Host"), Some("a"));
    }

    #[test]
    fn lookup_is_exact_unless_asked_otherwise() {
        let headers = Headers::decode("content-length: 5");
        assert_eq!(headers.get("Content-Length"), None);
        assert_eq!(headers.get_ignore_case("Content-Length"), Some("5"));
    }

    #[test]
    fn case_insensitive_lookup_takes_latest_line() {
        let headers =
            Headers::decode("Content-Length: 5\r\ncontent-length: 7\r\nContent-Length: 9");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("content-length"), Some("7"));
        assert_eq!(headers.get_ignore_case("content-length"), Some("9"));
        assert_eq!(headers.get_ignore_case("CONTENT-LENGTH"), Some("9"));
    }

    #[test]
    fn empty_block_yields_empty_headers() {
        assert!(Headers::decode("").is_empty());
    }
}
