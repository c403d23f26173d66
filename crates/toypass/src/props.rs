//! Key→value bag used to initialize a pass and externalize its state.
//!
//! The original host exposed pass state through reflection-style script
//! bindings; here the surface is an explicit bag with a closed [`Value`]
//! enumeration, so every persistable key is spelled out in code.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Text(String),
    Table(Properties),
}

/// Ordered property bag with `get`/`set`/`has` access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`, or `default` when the key is
    /// absent or holds an incompatible value.
    pub fn get<T: FromValue>(&self, key: &str, default: T) -> T {
        self.try_get(key).unwrap_or(default)
    }

    pub fn try_get<T: FromValue>(&self, key: &str) -> Option<T> {
        self.entries.get(key).and_then(T::from_value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Typed extraction out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(inner) => Some(*inner),
            // integer literals are accepted where a float is expected
            Value::Int(inner) => Some(*inner as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|inner| inner as f32)
    }
}

impl FromValue for [f32; 3] {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for [f32; 4] {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec4(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        String::from_value(value).map(PathBuf::from)
    }
}

impl FromValue for Properties {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Table(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<[f32; 3]> for Value {
    fn from(value: [f32; 3]) -> Self {
        Value::Vec3(value)
    }
}

impl From<[f32; 4]> for Value {
    fn from(value: [f32; 4]) -> Self {
        Value::Vec4(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Properties> for Value {
    fn from(value: Properties) -> Self {
        Value::Table(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_falls_back_to_default() {
        let mut props = Properties::new();
        props.set("present", 7_i64);

        assert_eq!(props.get("present", 0_i64), 7);
        assert_eq!(props.get("absent", 42_i64), 42);
        assert!(props.has("present"));
        assert!(!props.has("absent"));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let mut props = Properties::new();
        props.set("key", 1.0_f32);
        props.set("key", 2.0_f32);

        assert_eq!(props.get("key", 0.0_f32), 2.0);
    }

    #[test]
    fn mismatched_type_yields_default() {
        let mut props = Properties::new();
        props.set("flag", true);

        assert_eq!(props.get("flag", String::from("fallback")), "fallback");
    }

    #[test]
    fn integer_coerces_to_float() {
        let mut props = Properties::new();
        props.set("rate", 60_i64);

        assert_eq!(props.get("rate", 0.0_f32), 60.0);
    }

    #[test]
    fn json_round_trip_preserves_variants() {
        let mut nested = Properties::new();
        nested.set("iResolution", [1920.0_f32, 1080.0, 1.0]);
        nested.set("iMouse", [0.0_f32, 0.0, 0.0, 0.0]);
        nested.set("iFrame", 12_i64);

        let mut props = Properties::new();
        props.set("shaderPath", "shaders/demo.frag");
        props.set("shaderLoaded", false);
        props.set("shaderInputs", nested.clone());

        let encoded = serde_json::to_string(&props).unwrap();
        let decoded: Properties = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, props);
        assert_eq!(decoded.try_get::<Properties>("shaderInputs"), Some(nested));
    }
}
