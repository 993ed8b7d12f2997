//! Numeric measurement values.

use serde::Serialize;

/// Which representation a `Number` (or an instrument) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    I64,
    F64,
}

/// A measured value, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    I64(i64),
    F64(f64),
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::I64(_) => NumberKind::I64,
            Number::F64(_) => NumberKind::F64,
        }
    }

    /// Value as `i64`; floats are truncated toward zero.
    pub fn as_i64(&self) -> i64 {
        match *self {
            Number::I64(v) => v,
            Number::F64(v) => v as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::I64(v) => v as f64,
            Number::F64(v) => v,
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::I64(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::F64(v)
    }
}
