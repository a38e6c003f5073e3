//! Row scoring over a compiled [`Plan`].
//!
//! Every call owns its row context: the input row is copied, each stage adds
//! its output in plan order, and the result is projected onto the plan's
//! result fields. The plan itself is only read.

use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;
use tracing::trace;

use crate::bridge::{from_portable, json_kind, to_portable_checked};
use crate::error::{Result, ScoringError};
use crate::plan::{Plan, PlanStage, PortableDescriptor};
use crate::value::{Row, Value};

/// Scores single rows against a shared plan.
///
/// Cloning is cheap; clones share the plan.
#[derive(Clone, Debug)]
pub struct RowExecutor {
    plan: Arc<Plan>,
}

impl RowExecutor {
    pub fn new(plan: Plan) -> Self {
        Self::from_shared(Arc::new(plan))
    }

    pub fn from_shared(plan: Arc<Plan>) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Score one row.
    ///
    /// The output holds exactly the plan's result fields; a result field no
    /// stage produced and the input lacked is returned as null.
    ///
    /// # Errors
    /// Returns [`ScoringError::Stage`] wrapping the error of the first failing
    /// stage. Nothing is retried and no default is substituted.
    pub fn score(&self, row: &Row) -> Result<Row> {
        let mut context = self
            .plan
            .stages()
            .iter()
            .try_fold(row.clone(), |mut context, stage| {
                let value = run_stage(stage, &context).map_err(|e| e.in_stage(stage.name()))?;
                context.insert(stage.output().name.clone(), value);
                Ok::<_, ScoringError>(context)
            })?;

        let scored: Row = self
            .plan
            .result_fields()
            .iter()
            .map(|field| (field.clone(), context.remove(field).unwrap_or(Value::Null)))
            .collect();
        trace!(stages = self.plan.len(), fields = scored.len(), "scored row");
        Ok(scored)
    }

    /// The closed-over scoring function `Row -> Row`.
    pub fn into_score_fn(self) -> impl Fn(&Row) -> Result<Row> + Send + Sync + Clone {
        move |row: &Row| self.score(row)
    }
}

fn run_stage(stage: &PlanStage, context: &Row) -> Result<Value> {
    match stage {
        PlanStage::Native { transform, .. } => transform.transform(context),
        PlanStage::Portable(descriptor) => run_portable(descriptor, context),
    }
}

fn run_portable(descriptor: &PortableDescriptor, context: &Row) -> Result<Value> {
    let mut input = JsonMap::with_capacity(descriptor.inputs().len());
    for binding in descriptor.inputs() {
        // Absent inputs are legal: the model decides what null means.
        let value = match context.get(&binding.feature.name) {
            Some(value) => to_portable_checked(value, &binding.feature.ftype)?,
            None => JsonValue::Null,
        };
        input.insert(binding.positional.clone(), value);
    }

    let result = descriptor.model().transform(&JsonValue::Object(input))?;
    let output = descriptor.output_positional();
    let raw = match &result {
        JsonValue::Object(fields) => fields.get(output).ok_or_else(|| {
            ScoringError::Interpretation(format!(
                "model '{}' returned no '{}' field",
                descriptor.op(),
                output
            ))
        })?,
        other => {
            return Err(ScoringError::Interpretation(format!(
                "model '{}' returned {} instead of an object",
                descriptor.op(),
                json_kind(other)
            )))
        }
    };
    from_portable(raw, &descriptor.output().ftype).map_err(|e| {
        ScoringError::Interpretation(format!(
            "cannot decode '{}' from model '{}': {}",
            output,
            descriptor.op(),
            e
        ))
    })
}
