use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of a single data point as reported by the cloud.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DpValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Other(serde_json::Value),
}

/// Data point code -> latest value. Rebuilt from scratch on every poll.
pub type StatusMap = BTreeMap<String, DpValue>;

impl DpValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DpValue::Int(i) => Some(*i as f64),
            DpValue::Float(f) => Some(*f),
            DpValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            DpValue::String(s) => s.trim().parse().ok(),
            DpValue::Other(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DpValue::Bool(b) => Some(*b),
            DpValue::Int(i) => Some(*i != 0),
            DpValue::String(s) => match s.as_str() {
                "true" | "on" => Some(true),
                "false" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DpValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Falsy in the loose sense: `false`, zero, empty string, null.
    pub fn is_falsy(&self) -> bool {
        match self {
            DpValue::Bool(b) => !b,
            DpValue::Int(i) => *i == 0,
            DpValue::Float(f) => *f == 0.0,
            DpValue::String(s) => s.is_empty(),
            DpValue::Other(v) => v.is_null(),
        }
    }
}

impl fmt::Display for DpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DpValue::Bool(b) => write!(f, "{b}"),
            DpValue::Int(i) => write!(f, "{i}"),
            DpValue::Float(v) => write!(f, "{v}"),
            DpValue::String(s) => write!(f, "{s}"),
            DpValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for DpValue {
    fn from(value: bool) -> Self {
        DpValue::Bool(value)
    }
}

impl From<i64> for DpValue {
    fn from(value: i64) -> Self {
        DpValue::Int(value)
    }
}

impl From<f64> for DpValue {
    fn from(value: f64) -> Self {
        DpValue::Float(value)
    }
}

impl From<&str> for DpValue {
    fn from(value: &str) -> Self {
        DpValue::String(value.to_string())
    }
}

impl From<String> for DpValue {
    fn from(value: String) -> Self {
        DpValue::String(value)
    }
}

impl From<serde_json::Value> for DpValue {
    fn from(value: serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(DpValue::Other(value))
    }
}
