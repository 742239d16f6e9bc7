//! Values returned by a language runtime and their host representation
//!
//! The Python harness reports results in a tagged form so that shapes the
//! host has no direct equivalent for (tuples, sets, dicts with non-string
//! keys, big integers) survive the trip and are converted explicitly here.
//! The JavaScript harness already emits host values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Conversion from a runtime's value model into host values
pub trait ToHostValue {
    fn to_host_value(&self) -> Value;
}

impl ToHostValue for Value {
    fn to_host_value(&self) -> Value {
        self.clone()
    }
}

/// A value as produced by the dynamic-language runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum RuntimeValue {
    None,
    Bool(bool),
    /// Arbitrary precision integer, in decimal
    Int(String),
    /// `None` for NaN and infinities
    Float(Option<f64>),
    Str(String),
    List(Vec<RuntimeValue>),
    Tuple(Vec<RuntimeValue>),
    Set(Vec<RuntimeValue>),
    Dict(Vec<(RuntimeValue, RuntimeValue)>),
    /// Anything else, rendered with `repr()`
    Repr(String),
}

impl ToHostValue for RuntimeValue {
    fn to_host_value(&self) -> Value {
        match self {
            RuntimeValue::None => Value::Null,
            RuntimeValue::Bool(b) => Value::Bool(*b),
            RuntimeValue::Int(digits) => int_to_host(digits),
            RuntimeValue::Float(f) => f
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RuntimeValue::Str(s) | RuntimeValue::Repr(s) => Value::String(s.clone()),
            RuntimeValue::List(items) | RuntimeValue::Tuple(items) | RuntimeValue::Set(items) => {
                Value::Array(items.iter().map(ToHostValue::to_host_value).collect())
            }
            RuntimeValue::Dict(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.key_string(), value.to_host_value());
                }
                Value::Object(map)
            }
        }
    }
}

impl RuntimeValue {
    /// Render a dict key the way the runtime would print it
    fn key_string(&self) -> String {
        match self {
            RuntimeValue::Str(s) | RuntimeValue::Int(s) | RuntimeValue::Repr(s) => s.clone(),
            RuntimeValue::None => "None".to_string(),
            RuntimeValue::Bool(true) => "True".to_string(),
            RuntimeValue::Bool(false) => "False".to_string(),
            RuntimeValue::Float(Some(f)) if f.fract() == 0.0 => format!("{:.1}", f),
            RuntimeValue::Float(Some(f)) => f.to_string(),
            RuntimeValue::Float(None) => "nan".to_string(),
            other => other.to_host_value().to_string(),
        }
    }
}

fn int_to_host(digits: &str) -> Value {
    if let Ok(n) = digits.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = digits.parse::<u64>() {
        return Value::from(n);
    }
    digits
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(digits.to_string()))
}
