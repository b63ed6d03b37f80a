// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The flat attribute map a decoded report is reduced to.
//!
//! A report arrives as a nested document; downstream consumers (filters, the
//! delta engine, every sink) only ever see a [`Record`]: an insertion-ordered
//! map from namespaced key to a typed [`Value`]. Numeric coercion happens
//! exactly once, when a value enters a record — everything after that works
//! on the typed value.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One attribute value: integer, float, or the original string.
///
/// Serializes untagged, so a JSON round trip preserves the numeric type:
/// `Int(12)` ⇄ `12`, `Float(12.5)` ⇄ `12.5`, `Str("abc")` ⇄ `"abc"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

/// Flat, insertion-ordered attribute map.
///
/// Keys are unique; iteration order is insertion order and carries no
/// meaning beyond readability of logs and emitted lines.
pub type Record = IndexMap<String, Value>;

/// Coerce raw text to the narrowest value type.
///
/// A string parsing as a float with zero fractional part becomes an integer
/// (`"12.0"` → 12), a nonzero fraction stays a float, anything else stays a
/// string.
#[must_use]
pub fn to_numeric(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 => {
            Value::Int(v as i64)
        }
        Ok(v) => Value::Float(v),
        Err(_) => Value::Str(raw.to_string()),
    }
}
