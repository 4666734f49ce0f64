//! Recovers the catalog document from the simulator's stdout.
//!
//! The PHP side logs freely to stdout, so the JSON payload may be preceded
//! or followed by arbitrary text. Recovery tries a full decode first, then
//! walks the text and attempts a decode at every `{` / `[`.

use serde_json::{Map, Value};

/// Recover the single structured document embedded in `text`.
///
/// Returns `None` when nothing decodes, or when the first decodable value is
/// a scalar or an empty list. A non-empty top-level list is wrapped as
/// `{"items": [...]}`.
pub fn recover_document(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Fast path: the whole output is the document.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }

    for (start, byte) in trimmed.bytes().enumerate() {
        if byte != b'{' && byte != b'[' {
            continue;
        }
        let Some(end) = balanced_span(trimmed, start) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..end]) else {
            continue;
        };
        log::debug!("Recovered catalog document at byte {} of {}", start, trimmed.len());
        return match value {
            Value::Object(map) => Some(map),
            Value::Array(items) if !items.is_empty() => {
                let mut wrapped = Map::new();
                wrapped.insert("items".to_string(), Value::Array(items));
                Some(wrapped)
            }
            _ => None,
        };
    }
    None
}

/// Byte range of the first balanced `{...}` object in `text`, if any.
///
/// Unlike [`recover_document`] this does not validate the contents; it is a
/// boundary search only.
pub fn extract_object_span(text: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        if let Some(end) = balanced_span(text, start) {
            return Some((start, end));
        }
        from = start + 1;
    }
    None
}

/// Exclusive end of the bracketed region opening at `start`.
///
/// Tracks nesting of `{}` and `[]`, ignoring anything inside double-quoted
/// strings (backslash escapes included). A mismatched closer ends the
/// search with `None`.
fn balanced_span(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn clean_document_takes_fast_path() {
        let doc = recover_document(r#"{"category":"universe","name":"A"}"#).unwrap();
        assert_eq!(doc["name"], "A");
    }

    #[test]
    fn skips_log_noise_on_both_sides() {
        let text = "[info] booting\nseeded 42 galaxies\n{\"name\":\"A\",\"n\":1}\ndone in 3s\n";
        let doc = recover_document(text).unwrap();
        assert_eq!(Value::Object(doc), json!({"name": "A", "n": 1}));
    }

    #[test]
    fn braces_inside_strings_are_not_structural() {
        let doc = recover_document(r#"noise {"name":"a{b}c"} trailing"#).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["name"], "a{b}c");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r#"log: {"name":"say \"}{\" twice","k":2} end"#;
        let doc = recover_document(text).unwrap();
        assert_eq!(doc["name"], "say \"}{\" twice");
        assert_eq!(doc["k"], 2);
    }

    #[test]
    fn top_level_list_is_wrapped() {
        let doc = recover_document("prefix [1, 2, 3] suffix").unwrap();
        assert_eq!(doc["items"], json!([1, 2, 3]));
    }

    #[test]
    fn empty_list_is_not_a_document() {
        assert!(recover_document("nothing here []").is_none());
    }

    #[test]
    fn scalar_only_output_is_not_found() {
        assert!(recover_document("42").is_none());
        assert!(recover_document("").is_none());
        assert!(recover_document("no json at all").is_none());
    }

    #[test]
    fn unbalanced_prefix_is_skipped() {
        let doc = recover_document("broken { fragment\n{\"name\":\"ok\"}").unwrap();
        assert_eq!(doc["name"], "ok");
    }

    #[test]
    fn object_span_respects_strings() {
        let text = r#"xx {"a":"}"} yy"#;
        let (start, end) = extract_object_span(text).unwrap();
        assert_eq!(&text[start..end], r#"{"a":"}"}"#);
    }

    #[test]
    fn object_span_none_when_unbalanced() {
        assert!(extract_object_span("{ never closed").is_none());
    }

    fn noise() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .:=\\-\n]{0,40}"
    }

    proptest! {
        #[test]
        fn prop_document_survives_noise(
            prefix in noise(),
            suffix in noise(),
            name in "[a-z{}\\[\\] ]{0,12}",
            count in 0u32..10_000,
        ) {
            let doc = json!({"category": "galaxy", "name": name, "stars": count});
            let text = format!("{}{}{}", prefix, doc, suffix);
            let recovered = recover_document(&text);
            prop_assert_eq!(recovered.map(Value::Object), Some(doc));
        }
    }
}
