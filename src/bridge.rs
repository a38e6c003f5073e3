//! Conversion between native [`Value`]s and the JSON domain consumed by
//! portable models.
//!
//! The portable interpreter matches its inputs structurally, so the mapping is
//! exact: vectors become arrays of numbers, lists become arrays, maps become
//! objects with unchanged keys, null stays null and scalars map to themselves.
//! Decoding needs the declared [`FeatureType`] because a JSON array alone does
//! not say whether it was a vector or a list.

use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::collections::BTreeMap;

use crate::error::{Result, ScoringError};
use crate::value::{FeatureType, Value};

/// Convert a native value to its portable JSON form.
///
/// Sparse vectors are densified first.
///
/// # Errors
/// Returns [`ScoringError::ValueShape`] for values outside the portable domain:
/// non-finite reals and malformed sparse vectors.
pub fn to_portable(value: &Value) -> Result<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Binary(b) => Ok(JsonValue::Bool(*b)),
        Value::Integral(i) => Ok(JsonValue::Number((*i).into())),
        Value::Real(x) => real_to_json(*x),
        Value::Text(s) => Ok(JsonValue::String(s.clone())),
        Value::Vector(xs) => xs
            .iter()
            .map(|&x| real_to_json(x))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        Value::SparseVector { .. } => to_portable(&value.clone().densify()?),
        Value::List(items) => items
            .iter()
            .map(to_portable)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        Value::Map(entries) => {
            let mut obj = JsonMap::with_capacity(entries.len());
            for (k, v) in entries {
                obj.insert(k.clone(), to_portable(v)?);
            }
            Ok(JsonValue::Object(obj))
        }
    }
}

/// Convert a native value to portable form after checking it against its declared type.
///
/// Null is accepted for every type. Integral values are accepted where a real is
/// declared; this is a one-way widening, so decoding the result against the same
/// type yields a `Real`. Nothing else is coerced.
///
/// # Errors
/// Returns [`ScoringError::ValueShape`] if the value does not match `expected`
/// or is outside the portable domain.
pub fn to_portable_checked(value: &Value, expected: &FeatureType) -> Result<JsonValue> {
    check_shape(value, expected)?;
    to_portable(value)
}

/// Decode a portable JSON value into a native value of the declared type.
///
/// # Errors
/// Returns [`ScoringError::ValueShape`] if the JSON value does not fit `ftype`.
pub fn from_portable(json: &JsonValue, ftype: &FeatureType) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || ScoringError::shape(ftype.to_string(), json_kind(json));
    match ftype {
        FeatureType::Real => json.as_f64().map(Value::Real).ok_or_else(mismatch),
        FeatureType::Integral | FeatureType::Date => {
            json_to_i64(json).map(Value::Integral).ok_or_else(mismatch)
        }
        FeatureType::Binary => json.as_bool().map(Value::Binary).ok_or_else(mismatch),
        FeatureType::Text => json
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(mismatch),
        FeatureType::Vector => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|x| x.as_f64().ok_or_else(mismatch))
                .collect::<Result<Vec<_>>>()
                .map(Value::Vector)
        }
        FeatureType::List(inner) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|x| from_portable(x, inner))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        FeatureType::Map(inner) => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            obj.iter()
                .map(|(k, v)| Ok((k.clone(), from_portable(v, inner)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map)
        }
    }
}

fn check_shape(value: &Value, expected: &FeatureType) -> Result<()> {
    let ok = match (expected, value) {
        (_, Value::Null) => true,
        (FeatureType::Real, Value::Real(_) | Value::Integral(_)) => true,
        (FeatureType::Integral | FeatureType::Date, Value::Integral(_)) => true,
        (FeatureType::Binary, Value::Binary(_)) => true,
        (FeatureType::Text, Value::Text(_)) => true,
        (FeatureType::Vector, Value::Vector(_) | Value::SparseVector { .. }) => true,
        (FeatureType::List(inner), Value::List(items)) => {
            for item in items {
                check_shape(item, inner)?;
            }
            true
        }
        (FeatureType::Map(inner), Value::Map(entries)) => {
            for v in entries.values() {
                check_shape(v, inner)?;
            }
            true
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ScoringError::shape(expected.to_string(), value.kind()))
    }
}

fn real_to_json(x: f64) -> Result<JsonValue> {
    Number::from_f64(x)
        .map(JsonValue::Number)
        .ok_or_else(|| ScoringError::shape("finite real", format!("{}", x)))
}

fn json_to_i64(json: &JsonValue) -> Option<i64> {
    if let Some(i) = json.as_i64() {
        return Some(i);
    }
    let x = json.as_f64()?;
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

pub(crate) fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
