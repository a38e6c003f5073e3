//! Native value domain: features, their declared types and row values.
//!
//! A [`Row`] maps feature names to [`Value`]s. Values are recursive so a
//! single feature can carry a vector, a list of texts or a nested map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ScoringError};

/// A single record flowing through the pipeline.
pub type Row = BTreeMap<String, Value>;

/// Declared type of a feature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    Real,
    Integral,
    Binary,
    Text,
    /// Milliseconds since the Unix epoch.
    Date,
    /// Dense numeric vector.
    Vector,
    List(Box<FeatureType>),
    Map(Box<FeatureType>),
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Real => write!(f, "real"),
            FeatureType::Integral => write!(f, "integral"),
            FeatureType::Binary => write!(f, "binary"),
            FeatureType::Text => write!(f, "text"),
            FeatureType::Date => write!(f, "date"),
            FeatureType::Vector => write!(f, "vector"),
            FeatureType::List(inner) => write!(f, "list<{}>", inner),
            FeatureType::Map(inner) => write!(f, "map<{}>", inner),
        }
    }
}

/// A named, typed field identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub ftype: FeatureType,
}

impl Feature {
    pub fn new(name: impl Into<String>, ftype: FeatureType) -> Self {
        Self {
            name: name.into(),
            ftype,
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FeatureType::Real)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FeatureType::Date)
    }

    pub fn vector(name: impl Into<String>) -> Self {
        Self::new(name, FeatureType::Vector)
    }
}

/// A recursive structured value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Binary(bool),
    Integral(i64),
    Real(f64),
    Text(String),
    /// Dense numeric vector.
    Vector(Vec<f64>),
    /// Sparse numeric vector; `indices` are strictly increasing and below `size`.
    SparseVector {
        size: usize,
        indices: Vec<usize>,
        values: Vec<f64>,
    },
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Binary(_) => "binary",
            Value::Integral(_) => "integral",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Vector(_) => "vector",
            Value::SparseVector { .. } => "sparse vector",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of a scalar; `None` for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            Value::Integral(x) => Some(*x as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integral(x) => Some(*x),
            _ => None,
        }
    }

    /// Converts a sparse vector to its dense form. Other values are returned unchanged.
    ///
    /// # Errors
    /// Returns [`ScoringError::ValueShape`] if the sparse encoding is malformed.
    pub fn densify(self) -> Result<Value> {
        match self {
            Value::SparseVector {
                size,
                indices,
                values,
            } => {
                if indices.len() != values.len() {
                    return Err(ScoringError::shape(
                        format!("{} sparse values", indices.len()),
                        format!("{} values", values.len()),
                    ));
                }
                let mut dense = Vec::new();
                dense.try_reserve_exact(size).map_err(|_| {
                    ScoringError::shape("allocatable sparse vector size", format!("size {}", size))
                })?;
                dense.resize(size, 0.0);
                let mut last: Option<usize> = None;
                for (&i, &v) in indices.iter().zip(values.iter()) {
                    if i >= size {
                        return Err(ScoringError::shape(
                            format!("sparse index below {}", size),
                            format!("index {}", i),
                        ));
                    }
                    if last.is_some_and(|prev| prev >= i) {
                        return Err(ScoringError::shape(
                            "strictly increasing sparse indices",
                            format!("index {} after {:?}", i, last),
                        ));
                    }
                    dense[i] = v;
                    last = Some(i);
                }
                Ok(Value::Vector(dense))
            }
            other => Ok(other),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Integral(x)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Binary(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Text(x.to_string())
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::Text(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(x: Vec<f64>) -> Self {
        Value::Vector(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        x.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_densify_sparse_vector() {
        let sparse = Value::SparseVector {
            size: 4,
            indices: vec![1, 3],
            values: vec![2.0, 5.0],
        };
        assert_eq!(
            sparse.densify().unwrap(),
            Value::Vector(vec![0.0, 2.0, 0.0, 5.0])
        );
    }

    #[test]
    fn test_densify_rejects_out_of_range_index() {
        let sparse = Value::SparseVector {
            size: 2,
            indices: vec![2],
            values: vec![1.0],
        };
        assert!(matches!(
            sparse.densify(),
            Err(ScoringError::ValueShape { .. })
        ));
    }

    #[test]
    fn test_densify_rejects_unsorted_indices() {
        let sparse = Value::SparseVector {
            size: 3,
            indices: vec![2, 1],
            values: vec![1.0, 1.0],
        };
        assert!(sparse.densify().is_err());
    }

    #[test]
    fn test_densify_rejects_unallocatable_size() {
        let sparse = Value::SparseVector {
            size: usize::MAX,
            indices: vec![],
            values: vec![],
        };
        assert!(matches!(
            sparse.densify(),
            Err(ScoringError::ValueShape { .. })
        ));
    }

    #[test]
    fn test_densify_passes_through_other_values() {
        let list = Value::List(vec![Value::Real(1.0)]);
        assert_eq!(list.clone().densify().unwrap(), list);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(1.5), Value::Real(1.5));
        assert_eq!(Value::from(3i64), Value::Integral(3));
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::Integral(2).as_f64(), Some(2.0));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_feature_type_display() {
        let t = FeatureType::Map(Box::new(FeatureType::List(Box::new(FeatureType::Text))));
        assert_eq!(t.to_string(), "map<list<text>>");
    }
}
