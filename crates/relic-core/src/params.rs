//! Raw legacy request parameters.
//!
//! Old clients send the same fields as query-string pairs, form bodies or
//! JSON bodies, with numbers and flags sometimes quoted and sometimes not.
//! Everything lands in one map and the typed accessors absorb the variance.

use serde_json::{Map, Value};

use crate::error::{RelicError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyParams(Map<String, Value>);

impl LegacyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `key=value` pairs (query string or form body).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    /// Build from a JSON object. Non-object values yield an empty bag.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: LegacyParams) {
        self.0.extend(other.0);
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// The raw value, with JSON `null` treated as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// String form of a scalar parameter.
    pub fn str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            _ => None,
        }
    }

    /// Like [`str`](Self::str) but treats an empty or blank string as absent.
    pub fn non_empty_str(&self, key: &str) -> Option<String> {
        self.str(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Non-negative integer, given as a JSON number or a numeric string.
    pub fn u64(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| {
                    RelicError::invalid(format!("{key} must be a non-negative integer"))
                }),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| RelicError::invalid(format!("{key} must be a non-negative integer"))),
            Some(_) => Err(RelicError::invalid(format!(
                "{key} must be a non-negative integer"
            ))),
        }
    }

    /// Legacy truthiness: `1`, `"1"`, `true` and `"true"` are set; anything else is not.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => {
                let s = s.trim();
                s == "1" || s.eq_ignore_ascii_case("true")
            }
            _ => false,
        }
    }
}
