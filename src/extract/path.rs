//! Dotted-Path Resolution
//!
//! Navigates the schema-free tenant input: each segment indexes a mapping by
//! key or a sequence by integer index. A terminal `length` segment on a
//! sequence yields its element count (pseudo-field, not a real data key).
//! Any missing key or out-of-range index yields `None` immediately.

use std::borrow::Cow;

use serde_json::Value;

/// Resolve a dotted path against a JSON document.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<Cow<'a, Value>> {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let terminal = segments.peek().is_none();

        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            Value::Array(items) => {
                if terminal && segment == "length" {
                    return Some(Cow::Owned(Value::from(items.len())));
                }
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }

    Some(Cow::Borrowed(current))
}

/// Resolve a path and coerce the leaf to a number.
///
/// Numeric strings count; everything else does not.
pub fn resolve_numeric(root: &Value, path: &str) -> Option<f64> {
    match resolve(root, path)?.as_ref() {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({"a": {"b": [{"c": 5}]}})
    }

    #[test]
    fn test_nested_index_path() {
        assert_eq!(resolve(&doc(), "a.b.0.c").unwrap().as_ref(), &json!(5));
    }

    #[test]
    fn test_length_pseudo_field() {
        assert_eq!(resolve(&doc(), "a.b.length").unwrap().as_ref(), &json!(1));
    }

    #[test]
    fn test_missing_key_yields_none() {
        assert!(resolve(&doc(), "a.x.y").is_none());
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(resolve(&doc(), "a.b.3.c").is_none());
    }

    #[test]
    fn test_length_not_terminal_is_a_key() {
        // `length` mid-path is treated as an ordinary segment
        let doc = json!({"a": [1, 2]});
        assert!(resolve(&doc, "a.length.x").is_none());
    }

    #[test]
    fn test_length_on_mapping_is_a_key() {
        let doc = json!({"a": {"length": 7}});
        assert_eq!(resolve(&doc, "a.length").unwrap().as_ref(), &json!(7));
    }

    #[test]
    fn test_resolve_numeric() {
        let doc = json!({"alerts": {"total": 1024, "rate": "0.08"}});
        assert_eq!(resolve_numeric(&doc, "alerts.total"), Some(1024.0));
        assert_eq!(resolve_numeric(&doc, "alerts.rate"), Some(0.08));
        assert_eq!(resolve_numeric(&doc, "alerts.missing"), None);
    }

    proptest! {
        /// Resolution never panics, whatever the path looks like.
        #[test]
        fn resolve_never_panics(path in "[a-z0-9.]{0,32}") {
            let _ = resolve(&doc(), &path);
        }
    }
}
