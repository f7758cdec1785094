//! The structured values the digest engine knows how to hash canonically.

use crate::error::DigestError;

/// A nested value built from primitives, ordered sequences, and unordered
/// collections.
///
/// Maps and sets are hashed in sorted order, so two structurally equal values
/// built via different insertion orders produce identical digests. Anything
/// outside this closed set of shapes (for example a JSON float) is rejected
/// at conversion time rather than hashed unstably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered sequence; order is significant.
    Seq(Vec<DigestValue>),
    /// Key/value map; hashed with entries sorted by key.
    Map(Vec<(DigestValue, DigestValue)>),
    /// Unordered collection; hashed with elements sorted.
    Set(Vec<DigestValue>),
}

impl DigestValue {
    /// Converts a JSON value, rejecting anything without a stable
    /// representation (non-integer numbers).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DigestError> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| DigestError::UnsupportedValue(format!("number {n}"))),
            serde_json::Value::String(s) => Ok(Self::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Seq),
            serde_json::Value::Object(entries) => entries
                .iter()
                .map(|(k, v)| Ok((Self::Str(k.clone()), Self::from_json(v)?)))
                .collect::<Result<Vec<_>, DigestError>>()
                .map(Self::Map),
        }
    }

    /// Serializes this value into an unambiguous token stream.
    ///
    /// Each node writes a one-byte type tag; variable-length payloads are
    /// length-prefixed so adjacent values cannot collide. Unordered
    /// collections serialize their children individually and sort the
    /// resulting byte strings before appending.
    pub(crate) fn write_tokens(&self, out: &mut Vec<u8>) {
        match self {
            Self::Null => out.push(b'N'),
            Self::Bool(false) => out.push(b'F'),
            Self::Bool(true) => out.push(b'T'),
            Self::Int(i) => {
                out.push(b'I');
                out.extend_from_slice(&i.to_be_bytes());
            }
            Self::Str(s) => {
                out.push(b'S');
                write_len_prefixed(out, s.as_bytes());
            }
            Self::Bytes(b) => {
                out.push(b'B');
                write_len_prefixed(out, b);
            }
            Self::Seq(items) => {
                out.push(b'L');
                out.extend_from_slice(&(items.len() as u64).to_be_bytes());
                for item in items {
                    item.write_tokens(out);
                }
            }
            Self::Map(entries) => {
                out.push(b'M');
                out.extend_from_slice(&(entries.len() as u64).to_be_bytes());
                let mut encoded: Vec<Vec<u8>> = entries
                    .iter()
                    .map(|(k, v)| {
                        let mut buf = Vec::new();
                        k.write_tokens(&mut buf);
                        v.write_tokens(&mut buf);
                        buf
                    })
                    .collect();
                encoded.sort();
                for buf in encoded {
                    out.extend_from_slice(&buf);
                }
            }
            Self::Set(items) => {
                out.push(b'E');
                out.extend_from_slice(&(items.len() as u64).to_be_bytes());
                let mut encoded: Vec<Vec<u8>> = items
                    .iter()
                    .map(|item| {
                        let mut buf = Vec::new();
                        item.write_tokens(&mut buf);
                        buf
                    })
                    .collect();
                encoded.sort();
                for buf in encoded {
                    out.extend_from_slice(&buf);
                }
            }
        }
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u64).to_be_bytes());
    out.extend_from_slice(data);
}

impl From<&str> for DigestValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for DigestValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for DigestValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for DigestValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<DigestValue>> for DigestValue {
    fn from(items: Vec<DigestValue>) -> Self {
        Self::Seq(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(value: &DigestValue) -> Vec<u8> {
        let mut out = Vec::new();
        value.write_tokens(&mut out);
        out
    }

    #[test]
    fn map_insertion_order_does_not_matter() {
        let a = DigestValue::Map(vec![
            ("x".into(), 1i64.into()),
            ("y".into(), 2i64.into()),
        ]);
        let b = DigestValue::Map(vec![
            ("y".into(), 2i64.into()),
            ("x".into(), 1i64.into()),
        ]);
        assert_eq!(tokens(&a), tokens(&b));
    }

    #[test]
    fn set_insertion_order_does_not_matter() {
        let a = DigestValue::Set(vec!["b".into(), "a".into()]);
        let b = DigestValue::Set(vec!["a".into(), "b".into()]);
        assert_eq!(tokens(&a), tokens(&b));
    }

    #[test]
    fn seq_order_matters() {
        let a = DigestValue::Seq(vec!["a".into(), "b".into()]);
        let b = DigestValue::Seq(vec!["b".into(), "a".into()]);
        assert_ne!(tokens(&a), tokens(&b));
    }

    #[test]
    fn adjacent_strings_cannot_collide() {
        // Without length prefixes ["ab","c"] and ["a","bc"] would serialize
        // identically.
        let a = DigestValue::Seq(vec!["ab".into(), "c".into()]);
        let b = DigestValue::Seq(vec!["a".into(), "bc".into()]);
        assert_ne!(tokens(&a), tokens(&b));
    }

    #[test]
    fn distinct_types_have_distinct_tokens() {
        assert_ne!(tokens(&DigestValue::Null), tokens(&DigestValue::Bool(false)));
        assert_ne!(
            tokens(&DigestValue::Str("1".into())),
            tokens(&DigestValue::Int(1))
        );
        assert_ne!(
            tokens(&DigestValue::Seq(vec![])),
            tokens(&DigestValue::Set(vec![]))
        );
    }

    #[test]
    fn from_json_accepts_integers_and_structures() {
        let json: serde_json::Value =
            serde_json::json!({"name": "app", "deps": ["a", "b"], "count": 3, "flag": true});
        let value = DigestValue::from_json(&json).unwrap();
        match value {
            DigestValue::Map(entries) => assert_eq!(entries.len(), 4),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn from_json_rejects_floats() {
        let json: serde_json::Value = serde_json::json!(1.5);
        let err = DigestValue::from_json(&json).unwrap_err();
        assert!(matches!(err, DigestError::UnsupportedValue(_)));
    }
}
