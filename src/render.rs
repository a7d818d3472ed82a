//! Indented plain-text rendering of nested JSON values.
//!
//! Used for the human-readable `getters` report. The output is meant to be
//! read and diffed, not parsed back.
//!
//! ```
//! use netsnap::render::render;
//! use serde_json::json;
//!
//! let text = render(&json!({ "global": [{ "ip": "10.0.0.2" }] }), 0);
//! assert_eq!(text, "\nglobal: \n\t- \n\t\tip: 10.0.0.2\n");
//! ```

use std::fmt::Write;

use serde_json::Value;

/// Render `value` with nesting starting at `depth` tabs.
///
/// - arrays: a leading newline, then one `- item` line per element
/// - objects: one `\nkey: value` entry per key, in insertion order
/// - scalars: their plain string form (strings unquoted)
pub fn render(value: &Value, depth: usize) -> String {
    let mut out = String::new();
    render_into(&mut out, value, depth);
    out
}

fn render_into(out: &mut String, value: &Value, depth: usize) {
    let tab = "\t".repeat(depth);
    match value {
        Value::Array(items) => {
            out.push('\n');
            for item in items {
                out.push_str(&tab);
                out.push_str("- ");
                render_into(out, item, depth + 1);
                out.push('\n');
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let _ = write!(out, "\n{}{}: ", tab, key);
                render_into(out, item, depth + 1);
            }
        }
        Value::String(s) => out.push_str(s),
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// Count every scalar in a value.
    fn leaf_count(value: &Value) -> usize {
        match value {
            Value::Array(items) => items.iter().map(leaf_count).sum(),
            Value::Object(map) => map.values().map(leaf_count).sum(),
            _ => 1,
        }
    }

    /// Lines carrying a scalar, as opposed to bare `key:` or `-` headers.
    fn leaf_lines(text: &str) -> usize {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.ends_with(':') && *l != "-")
            .count()
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render(&json!("hostname r1"), 0), "hostname r1");
        assert_eq!(render(&json!(42), 3), "42");
        assert_eq!(render(&json!(1.5), 0), "1.5");
        assert_eq!(render(&json!(true), 0), "true");
        assert_eq!(render(&Value::Null, 0), "null");
    }

    #[test]
    fn test_render_flat_object() {
        let text = render(&json!({ "vendor": "Cisco", "uptime": 3600 }), 0);
        assert_eq!(text, "\nvendor: Cisco\nuptime: 3600");
    }

    #[test]
    fn test_render_list_of_scalars() {
        let text = render(&json!(["10.0.0.1", "10.0.0.2"]), 1);
        assert_eq!(text, "\n\t- 10.0.0.1\n\t- 10.0.0.2\n");
    }

    #[test]
    fn test_render_arp_scenario() {
        let report = json!({
            "ARP table": { "global": [{ "ip": "10.0.0.2", "mac": "aa:bb" }] }
        });
        let text = render(&report, 0);

        assert!(text.starts_with("\nARP table: "));
        assert!(text.contains("\n\tglobal: "));
        assert!(text.contains("\t\t- "));
        assert!(text.contains("\n\t\t\tip: 10.0.0.2"));
        assert!(text.contains("\n\t\t\tmac: aa:bb"));
    }

    #[test]
    fn test_render_preserves_key_order() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        assert_eq!(render(&value, 0), "\nzeta: 1\nalpha: 2\nmid: 3");
    }

    #[test]
    fn test_render_empty_containers() {
        assert_eq!(render(&json!({}), 0), "");
        assert_eq!(render(&json!([]), 0), "\n");
        let text = render(&json!({ "Users": {} }), 0);
        assert_eq!(text, "\nUsers: ");
    }

    #[test]
    fn test_render_one_line_per_leaf() {
        let samples = [
            json!({ "a": 1, "b": [1, 2, 3], "c": { "d": "x", "e": [true, null] } }),
            json!([[1, 2], [3], { "k": "v" }]),
            json!({ "interfaces": { "Gi0/0": { "is_up": true, "speed": 1000, "mac": "aa:bb" } } }),
            json!([{ "ip": "10.0.0.2", "mac": "aa:bb", "age": 0.0 }, { "ip": "10.0.0.3", "mac": "cc:dd", "age": 1.0 }]),
        ];
        for sample in &samples {
            let text = render(sample, 0);
            assert_eq!(leaf_lines(&text), leaf_count(sample), "sample: {}", sample);
        }
    }

    #[test]
    fn test_render_deterministic() {
        let value = json!({ "b": [1, { "x": 2 }], "a": "z" });
        assert_eq!(render(&value, 0), render(&value.clone(), 0));
    }

    /// Nested values whose scalars each render as one non-empty line.
    fn nested_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(Value::from),
            "[A-Za-z0-9 ._/-]{0,16}[A-Za-z0-9]".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[A-Za-z0-9 _./-]{1,12}", inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_one_line_per_leaf(value in nested_value(), depth in 0usize..3) {
            let text = render(&value, depth);
            prop_assert_eq!(leaf_lines(&text), leaf_count(&value));
        }

        #[test]
        fn prop_render_never_panics(key in "\\PC{0,20}", text in "\\PC{0,60}") {
            let mut map = serde_json::Map::new();
            map.insert(key.clone(), json!([text.clone(), { "nested": text }]));
            let value = Value::Object(map);
            prop_assert!(render(&value, 0).contains(&key));
        }
    }
}
