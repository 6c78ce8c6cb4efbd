//! Canonical JSON encoding.
//!
//! The canonical form of a value is compact JSON (no insignificant whitespace)
//! with every object's keys sorted by code point. Arrays keep their order.
//! Two structurally equal values therefore encode to the same bytes no matter
//! how their maps were built.

use std::io;

use serde_json::Value;

/// Destination for canonical bytes.
pub trait CanonicalSink {
    fn put(&mut self, bytes: &[u8]);
}

impl CanonicalSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl CanonicalSink for blake3::Hasher {
    fn put(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Stream the canonical encoding of `value` into `sink`.
pub fn write_canonical<S: CanonicalSink + ?Sized>(value: &Value, sink: &mut S) {
    match value {
        Value::Null => sink.put(b"null"),
        Value::Bool(true) => sink.put(b"true"),
        Value::Bool(false) => sink.put(b"false"),
        Value::Number(n) => sink.put(n.to_string().as_bytes()),
        Value::String(s) => write_string(s, sink),
        Value::Array(items) => {
            sink.put(b"[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sink.put(b",");
                }
                write_canonical(item, sink);
            }
            sink.put(b"]");
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            sink.put(b"{");
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    sink.put(b",");
                }
                write_string(key, sink);
                sink.put(b":");
                write_canonical(item, sink);
            }
            sink.put(b"}");
        }
    }
}

/// The canonical encoding as a `String`.
pub fn to_canonical_string(value: &Value) -> String {
    let mut buf = Vec::new();
    write_canonical(value, &mut buf);
    // Only ever fed from `&str` and ASCII punctuation.
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_string<S: CanonicalSink + ?Sized>(s: &str, sink: &mut S) {
    // The sink cannot fail, so neither can serde_json writing into it.
    let _ = serde_json::to_writer(SinkWriter(sink), s);
}

/// [`io::Write`] over a [`CanonicalSink`].
struct SinkWriter<'a, S: ?Sized>(&'a mut S);

impl<S: CanonicalSink + ?Sized> io::Write for SinkWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_and_compact() {
        let v = json!({"name": "p1", "format": "url", "in": "query"});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"format":"url","in":"query","name":"p1"}"#
        );
    }

    #[test]
    fn nested_maps_sorted_arrays_kept() {
        let v = json!({"b": [3, 1, {"z": null, "a": true}], "a": {"y": 1.5, "x": -2}});
        assert_eq!(
            to_canonical_string(&v),
            r#"{"a":{"x":-2,"y":1.5},"b":[3,1,{"a":true,"z":null}]}"#
        );
    }

    #[test]
    fn strings_are_escaped_like_json() {
        let v = json!("quote\" back\\ nl\n ctl\u{1} é");
        let canonical = to_canonical_string(&v);
        assert_eq!(canonical, "\"quote\\\" back\\\\ nl\\n ctl\\u0001 é\"");
        // The canonical form is itself valid JSON for the same value.
        let reparsed: Value = serde_json::from_str(&canonical).unwrap();
        assert_eq!(reparsed, v);
    }

    #[test]
    fn every_ascii_char_escapes_as_serde_json_does() {
        let all: String = (0u8..0x80).map(char::from).collect();
        let v = Value::String(all);
        assert_eq!(to_canonical_string(&v), serde_json::to_string(&v).unwrap());
    }
}
