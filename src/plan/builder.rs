//! Builds a [`Plan`] from a [`TrainedPipeline`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

use super::compiler::compile_wrapped_stage;
use super::{Plan, PlanStage};
use crate::config::CompilerConfig;
use crate::error::{Result, ScoringError};
use crate::interchange::{InterchangeCompiler, InterchangeInterpreter, JsonInterchange};
use crate::pipeline::TrainedPipeline;

/// Classifies and compiles the stages of a trained pipeline.
///
/// # Example
/// ```ignore
/// let plan = PlanBuilder::default().build(&pipeline)?;
/// let score = RowExecutor::new(plan).into_score_fn();
/// ```
pub struct PlanBuilder {
    compiler: Box<dyn InterchangeCompiler>,
    interpreter: Box<dyn InterchangeInterpreter>,
    config: CompilerConfig,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new(JsonInterchange, JsonInterchange)
    }
}

impl PlanBuilder {
    pub fn new(
        compiler: impl InterchangeCompiler + 'static,
        interpreter: impl InterchangeInterpreter + 'static,
    ) -> Self {
        Self {
            compiler: Box::new(compiler),
            interpreter: Box::new(interpreter),
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Build the plan, preserving stage order.
    ///
    /// A stage offering a native transform runs natively even if it also wraps
    /// an external transformer.
    ///
    /// # Errors
    /// Returns [`ScoringError::Compilation`] if a stage is neither native nor
    /// wrapped, if two stages produce the same feature, or if a wrapped stage
    /// fails to compile. No plan is returned in that case.
    pub fn build(&self, pipeline: &TrainedPipeline) -> Result<Plan> {
        let mut stages = Vec::with_capacity(pipeline.len());
        let mut producers: HashMap<String, String> = HashMap::new();

        for stage in pipeline.stages() {
            let planned = if let Some(transform) = stage.as_native() {
                PlanStage::Native {
                    name: stage.name().to_string(),
                    transform,
                }
            } else if let Some(wrapped) = stage.as_wrapped() {
                PlanStage::Portable(compile_wrapped_stage(
                    wrapped,
                    self.compiler.as_ref(),
                    self.interpreter.as_ref(),
                    &self.config,
                )?)
            } else {
                return Err(ScoringError::compilation(
                    stage.name(),
                    "stage is neither native nor wrapped",
                ));
            };

            let output = planned.output().name.clone();
            if let Some(previous) = producers.insert(output.clone(), planned.name().to_string()) {
                return Err(ScoringError::compilation(
                    planned.name(),
                    format!(
                        "feature '{}' is already produced by stage '{}'",
                        output, previous
                    ),
                ));
            }
            stages.push(planned);
        }

        let result_fields: BTreeSet<String> = pipeline
            .result_features()
            .iter()
            .map(|f| f.name.clone())
            .collect();

        let plan = Plan {
            stages,
            result_fields,
        };
        info!(
            stages = plan.len(),
            native = plan.n_native(),
            portable = plan.n_portable(),
            result_fields = plan.result_fields.len(),
            "built scoring plan"
        );
        Ok(plan)
    }

    /// Build the plan and wrap it for sharing across threads.
    pub fn build_shared(&self, pipeline: &TrainedPipeline) -> Result<Arc<Plan>> {
        self.build(pipeline).map(Arc::new)
    }
}
