//! Trained stage kinds.
//!
//! A trained stage is either a native in-process transform or a wrapper
//! around an external transformer that can only run after being compiled to
//! the interchange format. Stages coming from elsewhere implement
//! [`TrainedStage`] and report which capability they have.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::interchange::ExternalTransformer;
use crate::value::{Feature, Row, Value};

/// Default parameter key holding a wrapped transformer's input column.
pub const DEFAULT_INPUT_PARAM: &str = "inputCol";
/// Default parameter key holding a wrapped transformer's output column.
pub const DEFAULT_OUTPUT_PARAM: &str = "outputCol";

/// An in-process row transform producing a single feature.
///
/// Implementations must not keep per-row state: the same instance is shared
/// by every scoring call.
pub trait NativeTransform: Send + Sync {
    /// Stage name for logging and errors.
    fn name(&self) -> &str;

    /// The feature this transform produces.
    fn output(&self) -> &Feature;

    /// Compute the output value from a read view of the row.
    fn transform(&self, row: &Row) -> Result<Value>;
}

/// A stage wrapping an external transformer definition.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedStage {
    pub transformer: ExternalTransformer,
    /// Logical input features, in the order the stage declares them.
    pub inputs: Vec<Feature>,
    pub output: Feature,
    /// Parameter key whose value is the transformer's input column.
    pub input_param: String,
    /// Parameter key whose value is the transformer's output column.
    pub output_param: String,
}

impl WrappedStage {
    pub fn new(transformer: ExternalTransformer, inputs: Vec<Feature>, output: Feature) -> Self {
        Self {
            transformer,
            inputs,
            output,
            input_param: DEFAULT_INPUT_PARAM.to_string(),
            output_param: DEFAULT_OUTPUT_PARAM.to_string(),
        }
    }

    /// Use different parameter keys for the input and output columns.
    pub fn with_column_params(
        mut self,
        input_param: impl Into<String>,
        output_param: impl Into<String>,
    ) -> Self {
        self.input_param = input_param.into();
        self.output_param = output_param.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.transformer.uid
    }

    /// Configured input column of the transformer, if set.
    pub fn input_column(&self) -> Option<&str> {
        self.transformer.param_str(&self.input_param)
    }

    /// Configured output column of the transformer, if set.
    pub fn output_column(&self) -> Option<&str> {
        self.transformer.param_str(&self.output_param)
    }
}

/// Capability view of a stage handed over by training.
pub trait TrainedStage: Send + Sync {
    fn name(&self) -> &str;

    /// The native transform, if this stage has one.
    fn as_native(&self) -> Option<Arc<dyn NativeTransform>> {
        None
    }

    /// The wrapped external transformer, if this stage is one.
    fn as_wrapped(&self) -> Option<&WrappedStage> {
        None
    }
}

/// The two stage kinds the engine knows how to run.
#[derive(Clone)]
pub enum Stage {
    Native(Arc<dyn NativeTransform>),
    Wrapped(WrappedStage),
}

impl Stage {
    pub fn native(transform: impl NativeTransform + 'static) -> Self {
        Stage::Native(Arc::new(transform))
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Native(t) => f
                .debug_struct("Native")
                .field("name", &t.name())
                .field("output", &t.output().name)
                .finish(),
            Stage::Wrapped(w) => f.debug_tuple("Wrapped").field(w).finish(),
        }
    }
}

impl TrainedStage for Stage {
    fn name(&self) -> &str {
        match self {
            Stage::Native(t) => t.name(),
            Stage::Wrapped(w) => w.name(),
        }
    }

    fn as_native(&self) -> Option<Arc<dyn NativeTransform>> {
        match self {
            Stage::Native(t) => Some(Arc::clone(t)),
            Stage::Wrapped(_) => None,
        }
    }

    fn as_wrapped(&self) -> Option<&WrappedStage> {
        match self {
            Stage::Native(_) => None,
            Stage::Wrapped(w) => Some(w),
        }
    }
}

impl From<WrappedStage> for Stage {
    fn from(stage: WrappedStage) -> Self {
        Stage::Wrapped(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FnTransform;

    fn scaler_stage() -> WrappedStage {
        let transformer = ExternalTransformer::new("standard_scaler", "scaler_1")
            .with_param("inputCol", "age")
            .with_param("outputCol", "age_scaled");
        WrappedStage::new(transformer, vec![Feature::real("age")], Feature::real("age_scaled"))
    }

    #[test]
    fn test_wrapped_stage_columns() {
        let stage = scaler_stage();
        assert_eq!(stage.name(), "scaler_1");
        assert_eq!(stage.input_column(), Some("age"));
        assert_eq!(stage.output_column(), Some("age_scaled"));
    }

    #[test]
    fn test_custom_column_params() {
        let transformer = ExternalTransformer::new("standard_scaler", "s")
            .with_param("featuresCol", "x")
            .with_param("predictionCol", "y");
        let stage = WrappedStage::new(transformer, vec![Feature::real("x")], Feature::real("y"))
            .with_column_params("featuresCol", "predictionCol");
        assert_eq!(stage.input_column(), Some("x"));
        assert_eq!(stage.output_column(), Some("y"));
    }

    #[test]
    fn test_stage_capabilities() {
        let wrapped: Stage = scaler_stage().into();
        assert!(wrapped.as_wrapped().is_some());
        assert!(wrapped.as_native().is_none());

        let native = Stage::native(FnTransform::new("one", Feature::real("one"), |_| {
            Ok(Value::Real(1.0))
        }));
        assert_eq!(native.name(), "one");
        assert!(native.as_native().is_some());
        assert!(native.as_wrapped().is_none());
    }
}
