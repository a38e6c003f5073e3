//! Trained pipelines as handed over by training.
//!
//! A [`TrainedPipeline`] is an ordered list of stages plus the features the
//! caller wants back. A stage may read any feature of the input row or any
//! feature produced by an earlier stage.
//!
//! # Example
//! ```ignore
//! use localscore::pipeline::{Stage, TrainedPipeline, WrappedStage};
//!
//! let pipeline = TrainedPipeline::new(vec![Feature::real("age_scaled")])
//!     .add_native(DaysBetween::new("birth_date", "age_days", reference_ms))
//!     .add_wrapped(scaler_stage);
//! ```

mod stage;

pub use stage::{
    NativeTransform, Stage, TrainedStage, WrappedStage, DEFAULT_INPUT_PARAM, DEFAULT_OUTPUT_PARAM,
};

use crate::value::Feature;

/// Ordered stages plus the declared result features.
pub struct TrainedPipeline {
    stages: Vec<Box<dyn TrainedStage>>,
    result_features: Vec<Feature>,
}

impl TrainedPipeline {
    /// Create an empty pipeline returning `result_features`.
    pub fn new(result_features: Vec<Feature>) -> Self {
        Self {
            stages: Vec::new(),
            result_features,
        }
    }

    /// Append a native stage.
    pub fn add_native(self, transform: impl NativeTransform + 'static) -> Self {
        self.add_stage(Stage::native(transform))
    }

    /// Append a wrapped stage.
    pub fn add_wrapped(self, stage: WrappedStage) -> Self {
        self.add_stage(Stage::Wrapped(stage))
    }

    /// Append any stage implementing [`TrainedStage`].
    pub fn add_stage(mut self, stage: impl TrainedStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stages(&self) -> &[Box<dyn TrainedStage>] {
        &self.stages
    }

    pub fn result_features(&self) -> &[Feature] {
        &self.result_features
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in pipeline order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FnTransform;
    use crate::interchange::ExternalTransformer;
    use crate::value::Value;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = TrainedPipeline::new(vec![Feature::real("y")]);
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.len(), 0);
        assert_eq!(pipeline.result_features().len(), 1);
    }

    #[test]
    fn test_stage_names_keep_order() {
        let wrapped = WrappedStage::new(
            ExternalTransformer::new("max_abs_scaler", "mas"),
            vec![Feature::real("a")],
            Feature::real("b"),
        );
        let pipeline = TrainedPipeline::new(vec![Feature::real("b")])
            .add_native(FnTransform::new("first", Feature::real("a"), |_| {
                Ok(Value::Real(0.0))
            }))
            .add_wrapped(wrapped)
            .add_native(FnTransform::new("last", Feature::real("c"), |_| Ok(Value::Null)));

        assert_eq!(pipeline.stage_names(), vec!["first", "mas", "last"]);
    }
}
