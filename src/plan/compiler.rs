//! Compilation of wrapped stages into portable descriptors.
//!
//! The external transformer names its columns after the pipeline's features,
//! while the interchange format expects fixed positional names. Compilation
//! rebinds an independent copy of the transformer to the positional names and
//! records how each logical input maps onto them.

use std::collections::HashSet;
use tracing::{debug, warn};

use super::{ModelHandle, PortableDescriptor, PortableInput};
use crate::config::CompilerConfig;
use crate::error::{Result, ScoringError};
use crate::interchange::{InterchangeCompiler, InterchangeInterpreter};
use crate::pipeline::WrappedStage;

/// Positional column a logical input binds to.
///
/// A name equal to the transformer's configured input column becomes the
/// positional input name; one equal to the configured output column becomes
/// the positional output name; any other name is kept. The input check runs
/// first, so a column configured for both roles reads from the input.
pub fn positional_name(
    logical: &str,
    input_column: Option<&str>,
    output_column: Option<&str>,
    config: &CompilerConfig,
) -> String {
    if input_column == Some(logical) {
        config.input_positional.clone()
    } else if output_column == Some(logical) {
        config.output_positional.clone()
    } else {
        logical.to_string()
    }
}

/// Compile one wrapped stage.
///
/// The trained stage is left untouched: rebinding operates on a clone of its
/// transformer.
///
/// # Errors
/// Returns [`ScoringError::Compilation`] if two inputs bind to the same
/// positional column, if the transformer cannot be serialized, if the
/// interpreter rejects the description, or if the model is not reentrant and
/// `config.serialize_non_reentrant` is unset.
pub fn compile_wrapped_stage(
    stage: &WrappedStage,
    compiler: &dyn InterchangeCompiler,
    interpreter: &dyn InterchangeInterpreter,
    config: &CompilerConfig,
) -> Result<PortableDescriptor> {
    let name = stage.name();
    let mut transformer = stage.transformer.clone();

    let input_column = stage.input_column();
    let output_column = stage.output_column();
    let mut seen = HashSet::with_capacity(stage.inputs.len());
    let mut inputs = Vec::with_capacity(stage.inputs.len());
    for feature in &stage.inputs {
        let positional = positional_name(&feature.name, input_column, output_column, config);
        if !seen.insert(positional.clone()) {
            return Err(ScoringError::compilation(
                name,
                format!(
                    "input '{}' binds to positional column '{}' which is already bound",
                    feature.name, positional
                ),
            ));
        }
        inputs.push(PortableInput {
            feature: feature.clone(),
            positional,
        });
    }

    transformer.set_param(stage.input_param.clone(), config.input_positional.clone());
    transformer.set_param(stage.output_param.clone(), config.output_positional.clone());

    let description = compiler.serialize(&transformer).map_err(|e| {
        ScoringError::compilation(name, format!("cannot serialize transformer: {}", e))
    })?;
    let model = interpreter.load(&description).map_err(|e| {
        ScoringError::compilation(name, format!("interchange description rejected: {}", e))
    })?;

    if !model.is_reentrant() {
        if !config.serialize_non_reentrant {
            return Err(ScoringError::compilation(
                name,
                format!("model '{}' is not reentrant", model.op()),
            ));
        }
        warn!(stage = name, op = model.op(), "model is not reentrant, calls will be serialized");
    }

    debug!(
        stage = name,
        op = %transformer.op,
        inputs = ?inputs.iter().map(|i| (&i.feature.name, &i.positional)).collect::<Vec<_>>(),
        output = %stage.output.name,
        "compiled wrapped stage"
    );

    Ok(PortableDescriptor {
        stage_name: name.to_string(),
        op: transformer.op,
        inputs,
        output: stage.output.clone(),
        output_positional: config.output_positional.clone(),
        model_description: description,
        model: ModelHandle::new(model),
    })
}
