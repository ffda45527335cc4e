use crate::http::request::{Method, Request};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The request line did not split into method, target and version.
    MalformedRequest(String),
    /// The header section outgrew the configured limit.
    HeadersTooLarge,
    /// No empty line yet; more bytes are needed.
    Incomplete,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedRequest(line) => {
                write!(f, "malformed request line: {:?}", line)
            }
            ParseError::HeadersTooLarge => f.write_str("request headers too large"),
            ParseError::Incomplete => f.write_str("incomplete request"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a request head out of `buf`.
///
/// Returns the request and the number of bytes consumed up to and including
/// the empty line. Anything after it is left alone; request bodies are not
/// read.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let head = decode_latin1(&buf[..headers_end]);
    let head = head.replace("\r\n", "\n");

    let mut lines = head.split('\n');

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, raw_target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequest(request_line.to_string()));
    };

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }

        // Lines without a separator are not headers; skip them.
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.to_string(), value.to_string());
        }
    }

    let (target, query) = parse_target(raw_target);

    let request = Request {
        method: Method::from_token(method),
        target,
        version: version.to_string(),
        headers,
        query,
    };

    Ok((request, headers_end))
}

/// Decodes a raw request target into its path and query parameters.
///
/// `+` becomes a space and percent escapes are decoded (as UTF-8, lossy)
/// before the path is split from the query on the first `?`. A query pair
/// without `=` maps to an empty value; empty pairs are skipped.
pub fn parse_target(raw: &str) -> (String, HashMap<String, String>) {
    let decoded = unquote_plus(raw);
    let mut query = HashMap::new();

    let Some((path, query_string)) = decoded.split_once('?') else {
        return (decoded, query);
    };

    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(key.to_string(), value.to_string());
    }

    (path.to_string(), query)
}

fn unquote_plus(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Finds the end of the header section: the first empty line, where lines
/// end in either `\n` or `\r\n`. Returns the offset just past it.
fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .find_map(|(i, _)| match &buf[i + 1..] {
            [b'\n', ..] => Some(i + 2),
            [b'\r', b'\n', ..] => Some(i + 3),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.target, "/");
        assert_eq!(parsed.headers.get("Host").unwrap(), " example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn headers_end_accepts_mixed_terminators() {
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r\n"), Some(18));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\n\n"), Some(16));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\n"), Some(17));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\n\r\n"), Some(17));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\nHost: a\r\n"), None);
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r"), None);
    }

    #[test]
    fn latin1_maps_every_byte() {
        let all: Vec<u8> = (0..=255).collect();
        let decoded = decode_latin1(&all);
        assert_eq!(decoded.chars().count(), 256);
        assert!(decoded.chars().enumerate().all(|(i, c)| c as u32 == i as u32));
    }

    #[test]
    fn unquote_plus_decodes_spaces_and_escapes() {
        assert_eq!(unquote_plus("/a+b%20c"), "/a b c");
        assert_eq!(unquote_plus("/%D1%84"), "/ф");
        assert_eq!(unquote_plus("/100%"), "/100%");
    }
}
