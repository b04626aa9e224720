use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A plain record: field name to JSON value.
///
/// Records are opaque to the store. Cloning one clones the whole tree, so
/// every copy handed in or out of a table is independent of the original.
pub type Record = Map<String, Value>;

/// Full-content snapshot of a store, keyed by table name.
pub type Dump = BTreeMap<String, Vec<Record>>;

/// Structural equality over JSON values.
///
/// Numbers compare by numeric value, so `2` and `2.0` are equal. Objects
/// compare key-by-key regardless of insertion order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => records_equal(a, b),
        _ => false,
    }
}

/// Structural equality over two records.
pub fn records_equal(a: &Record, b: &Record) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Short category name of a JSON value, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value for error messages, truncating long payloads.
pub fn describe(value: &Value) -> String {
    const MAX: usize = 80;
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX {
        rendered
    } else {
        let head: String = rendered.chars().take(MAX).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert!(values_equal(&json!(-7), &json!(-7)));
        assert!(!values_equal(&json!(2), &json!(2.5)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_nested_equality() {
        let a = json!({"name": "Bruce", "tags": [1, {"x": true}], "owner": {"id": 3}});
        let b = json!({"owner": {"id": 3.0}, "tags": [1, {"x": true}], "name": "Bruce"});
        assert!(values_equal(&a, &b));

        let c = json!({"name": "Bruce", "tags": [1, {"x": false}], "owner": {"id": 3}});
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn test_records_with_extra_key_differ() {
        let a = json!({"id": 1}).as_object().cloned().unwrap();
        let b = json!({"id": 1, "age": 2}).as_object().cloned().unwrap();
        assert!(!records_equal(&a, &b));
        assert!(!records_equal(&b, &a));
    }

    #[test]
    fn test_null_is_not_missing() {
        let a = json!({"id": null}).as_object().cloned().unwrap();
        let b = json!({"other": null}).as_object().cloned().unwrap();
        assert!(!records_equal(&a, &b));
    }

    #[test]
    fn test_describe_truncates() {
        let long = Value::String("x".repeat(200));
        let text = describe(&long);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), 83);
        assert_eq!(describe(&json!(42)), "42");
    }
}
