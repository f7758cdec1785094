//! Percent-escaping for asset URI components.

use crate::uri::UriError;

/// Returns `true` for bytes that may appear unescaped in a URI path component.
///
/// Unreserved characters plus `/`, which separates path segments.
fn is_path_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/')
}

/// Returns `true` for bytes that may appear unescaped in a query value.
fn is_query_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/' | b':')
}

fn escape_with(input: &str, is_safe: fn(u8) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if is_safe(byte) {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}

/// Percent-escapes a path component, leaving `/` separators intact.
pub fn escape_path(path: &str) -> String {
    escape_with(path, is_path_safe)
}

/// Percent-escapes a query parameter value.
pub fn escape_query(value: &str) -> String {
    escape_with(value, is_query_safe)
}

/// Reverses percent-escaping, requiring the result to be valid UTF-8.
pub fn unescape(input: &str) -> Result<String, UriError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| UriError::InvalidEscape(input.to_string()))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| UriError::InvalidEscape(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(escape_path("/srv/assets/app.js"), "/srv/assets/app.js");
    }

    #[test]
    fn spaces_and_reserved_are_escaped() {
        assert_eq!(escape_path("/a dir/file?.js"), "/a%20dir/file%3F.js");
    }

    #[test]
    fn unescape_roundtrip_utf8() {
        let original = "/assets/\u{00e9}t\u{00e9}/caf\u{00e9}.js";
        let escaped = escape_path(original);
        assert_eq!(unescape(&escaped).unwrap(), original);
    }

    #[test]
    fn unescape_rejects_truncated_escape() {
        assert!(unescape("/bad%2").is_err());
        assert!(unescape("/bad%zz").is_err());
    }

    #[test]
    fn unescape_rejects_invalid_utf8() {
        assert!(unescape("%FF%FE").is_err());
    }

    #[test]
    fn query_escaping_keeps_colons() {
        assert_eq!(escape_query("gzip"), "gzip");
        assert_eq!(escape_query("a b"), "a%20b");
        assert_eq!(escape_query("text/css"), "text/css");
    }
}
