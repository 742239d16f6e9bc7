//! Structural equality between an actual and an expected value
//!
//! Rules:
//! - primitives match only when they are the same kind and value (`"3"` is
//!   not `3`, `true` is not `1`)
//! - numbers compare by numeric value, so `2` equals `2.0`
//! - arrays match element-wise in order
//! - objects match when they have the same key set and equal values,
//!   regardless of key order
//! - any other pairing does not match

use serde_json::{Number, Value};

/// Compare a produced value with the expected one
pub fn compare(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| compare(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| compare(x, y)))
        }
        _ => false,
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequences_are_order_sensitive() {
        assert!(compare(&json!([1, 2]), &json!([1, 2])));
        assert!(!compare(&json!([2, 1]), &json!([1, 2])));
        assert!(compare(&json!([1, [2, 3]]), &json!([1, [2, 3]])));
        assert!(!compare(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn test_mappings_ignore_key_order() {
        assert!(compare(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
        assert!(!compare(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!compare(&json!({"a": 1, "c": 2}), &json!({"a": 1, "b": 2})));
        assert!(!compare(&json!({"a": 1}), &json!({"a": 2})));
    }

    #[test]
    fn test_no_type_coercion() {
        assert!(!compare(&json!("9"), &json!(9)));
        assert!(!compare(&json!(true), &json!(1)));
        assert!(!compare(&json!(null), &json!(0)));
        assert!(!compare(&json!(""), &json!(null)));
        assert!(!compare(&json!([]), &json!({})));
        assert!(!compare(&json!([1]), &json!({"0": 1})));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(compare(&json!(2.0), &json!(2)));
        assert!(compare(&json!(-7), &json!(-7)));
        assert!(compare(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!compare(&json!(0.1), &json!(0.2)));
        assert!(!compare(&json!(-1), &json!(u64::MAX)));
    }

    #[test]
    fn test_nested_structures() {
        let actual = json!([{"path": [1, 2, {"w": 3}]}, {"path": []}]);
        let expected = json!([{"path": [1, 2, {"w": 3}]}, {"path": []}]);
        assert!(compare(&actual, &expected));

        let different = json!([{"path": [1, 2, {"w": 4}]}, {"path": []}]);
        assert!(!compare(&actual, &different));
    }

    #[test]
    fn test_reflexive() {
        for value in [
            json!(null),
            json!(false),
            json!(42),
            json!(3.5),
            json!("abc"),
            json!([[1], [2, [3]]]),
            json!({"k": {"nested": [true, null]}}),
        ] {
            assert!(compare(&value, &value), "{} should equal itself", value);
        }
    }
}
