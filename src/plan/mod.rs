//! Immutable execution plans.
//!
//! A [`Plan`] is built once per trained pipeline by [`PlanBuilder`] and then
//! shared read-only by every scoring call. Each stage is resolved to one of
//! two executable forms at build time:
//!
//! - [`PlanStage::Native`]: an in-process transform.
//! - [`PlanStage::Portable`]: a compiled interchange model together with the
//!   mapping from logical feature names to the model's positional columns.

pub mod builder;
pub mod compiler;

pub use builder::PlanBuilder;
pub use compiler::{compile_wrapped_stage, positional_name};

use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::interchange::PortableModel;
use crate::pipeline::NativeTransform;
use crate::value::Feature;

/// A compiled interchange model, shared by all scoring calls.
pub enum ModelHandle {
    /// Reentrant model, called concurrently.
    Shared(Box<dyn PortableModel>),
    /// Non-reentrant model, called one invocation at a time.
    Serialized(Mutex<Box<dyn PortableModel>>),
}

impl ModelHandle {
    pub(crate) fn new(model: Box<dyn PortableModel>) -> Self {
        if model.is_reentrant() {
            ModelHandle::Shared(model)
        } else {
            ModelHandle::Serialized(Mutex::new(model))
        }
    }

    /// Run the model on one record.
    pub fn transform(&self, input: &JsonValue) -> Result<JsonValue> {
        match self {
            ModelHandle::Shared(model) => model.transform(input),
            ModelHandle::Serialized(model) => model.lock().transform(input),
        }
    }

    pub fn is_serialized(&self) -> bool {
        matches!(self, ModelHandle::Serialized(_))
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Shared(m) => f.debug_tuple("Shared").field(&m.op()).finish(),
            ModelHandle::Serialized(_) => f.debug_tuple("Serialized").finish(),
        }
    }
}

/// One logical input of a portable stage and the positional column it binds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortableInput {
    pub feature: Feature,
    pub positional: String,
}

/// Executable form of a wrapped stage. Never mutated after compilation.
#[derive(Debug)]
pub struct PortableDescriptor {
    pub(crate) stage_name: String,
    pub(crate) op: String,
    pub(crate) inputs: Vec<PortableInput>,
    pub(crate) output: Feature,
    pub(crate) output_positional: String,
    pub(crate) model_description: String,
    pub(crate) model: ModelHandle,
}

impl PortableDescriptor {
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn inputs(&self) -> &[PortableInput] {
        &self.inputs
    }

    /// Positional column bound to a logical input feature.
    pub fn positional_for(&self, logical: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.feature.name == logical)
            .map(|i| i.positional.as_str())
    }

    pub fn output(&self) -> &Feature {
        &self.output
    }

    pub fn output_positional(&self) -> &str {
        &self.output_positional
    }

    /// The interchange text the model was compiled from.
    pub fn model_description(&self) -> &str {
        &self.model_description
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }
}

/// A stage resolved to its execution strategy.
pub enum PlanStage {
    Native {
        name: String,
        transform: Arc<dyn NativeTransform>,
    },
    Portable(PortableDescriptor),
}

impl PlanStage {
    pub fn name(&self) -> &str {
        match self {
            PlanStage::Native { name, .. } => name,
            PlanStage::Portable(d) => &d.stage_name,
        }
    }

    /// The feature this stage writes into the row.
    pub fn output(&self) -> &Feature {
        match self {
            PlanStage::Native { transform, .. } => transform.output(),
            PlanStage::Portable(d) => &d.output,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, PlanStage::Native { .. })
    }
}

impl fmt::Debug for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStage::Native { name, transform } => f
                .debug_struct("Native")
                .field("name", name)
                .field("output", &transform.output().name)
                .finish(),
            PlanStage::Portable(d) => f.debug_tuple("Portable").field(d).finish(),
        }
    }
}

/// Ordered executable stages plus the fields returned to the caller.
#[derive(Debug)]
pub struct Plan {
    pub(crate) stages: Vec<PlanStage>,
    pub(crate) result_fields: BTreeSet<String>,
}

impl Plan {
    pub fn stages(&self) -> &[PlanStage] {
        &self.stages
    }

    pub fn result_fields(&self) -> &BTreeSet<String> {
        &self.result_fields
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(PlanStage::name).collect()
    }

    pub fn n_native(&self) -> usize {
        self.stages.iter().filter(|s| s.is_native()).count()
    }

    pub fn n_portable(&self) -> usize {
        self.stages.len() - self.n_native()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        reentrant: bool,
        calls: AtomicUsize,
    }

    impl PortableModel for Echo {
        fn transform(&self, input: &JsonValue) -> Result<JsonValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"output": input["input"].clone()}))
        }

        fn op(&self) -> &str {
            "echo"
        }

        fn is_reentrant(&self) -> bool {
            self.reentrant
        }
    }

    fn echo(reentrant: bool) -> Box<dyn PortableModel> {
        Box::new(Echo {
            reentrant,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_model_handle_respects_reentrancy() {
        assert!(!ModelHandle::new(echo(true)).is_serialized());
        assert!(ModelHandle::new(echo(false)).is_serialized());
    }

    #[test]
    fn test_serialized_handle_still_transforms() {
        let handle = ModelHandle::new(echo(false));
        let out = handle.transform(&json!({"input": 3})).unwrap();
        assert_eq!(out, json!({"output": 3}));
    }

    #[test]
    fn test_plan_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Plan>();
        assert_send_sync::<PortableDescriptor>();
    }
}
