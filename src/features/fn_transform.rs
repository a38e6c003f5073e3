//! Closure-backed native transform.

use crate::error::Result;
use crate::pipeline::NativeTransform;
use crate::value::{Feature, Row, Value};

type RowFn = dyn Fn(&Row) -> Result<Value> + Send + Sync;

/// Wraps a closure as a native stage.
///
/// # Example
/// ```ignore
/// let double = FnTransform::new("double_x", Feature::real("x2"), |row| {
///     let x = row.get("x").and_then(Value::as_f64).unwrap_or(0.0);
///     Ok(Value::Real(2.0 * x))
/// });
/// ```
pub struct FnTransform {
    name: String,
    output: Feature,
    f: Box<RowFn>,
}

impl FnTransform {
    pub fn new<F>(name: impl Into<String>, output: Feature, f: F) -> Self
    where
        F: Fn(&Row) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            output,
            f: Box::new(f),
        }
    }
}

impl NativeTransform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Feature {
        &self.output
    }

    fn transform(&self, row: &Row) -> Result<Value> {
        (self.f)(row)
    }
}
