use memchr::memmem;

pub const CRLF: &[u8] = b"\r\n";
pub const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Finds the first full occurrence of `delimiter` inside `buffer[start..end]`.
///
/// Returns the absolute index of the delimiter's first byte. `end` is clamped to
/// the buffer length, so the scan never reads past either bound.
pub fn find(buffer: &[u8], delimiter: &[u8], start: usize, end: usize) -> Option<usize> {
    let end = end.min(buffer.len());
    if start >= end || delimiter.is_empty() {
        return None;
    }

    memmem::find(&buffer[start..end], delimiter).map(|idx| idx + start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_request_line_end() {
        let buf = b"GET / HTTP/1.1\r\nHost: a\r\n\r\n";
        assert_eq!(find(buf, CRLF, 0, buf.len()), Some(14));
        assert_eq!(find(buf, CRLF_CRLF, 0, buf.len()), Some(23));
    }

    #[test]
    fn respects_start_offset() {
        let buf = b"a\r\nb\r\n";
        assert_eq!(find(buf, CRLF, 2, buf.len()), Some(4));
    }

    #[test]
    fn never_matches_past_end() {
        let buf = b"GET / HTTP/1.1\r\n";
        // the delimiter straddles `end`
        assert_eq!(find(buf, CRLF, 0, 15), None);
        assert_eq!(find(buf, CRLF, 0, 16), Some(14));
    }

    #[test]
    fn handles_degenerate_ranges() {
        let buf = b"\r\n";
        assert_eq!(find(buf, CRLF, 2, 2), None);
        assert_eq!(find(buf, CRLF, 3, 1), None);
        assert_eq!(find(buf, CRLF, 0, 100), Some(0));
        assert_eq!(find(b"", CRLF, 0, 0), None);
    }
}
