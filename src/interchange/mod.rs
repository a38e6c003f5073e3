//! Interchange collaborators: turning an external transformer definition into
//! a portable model description, and loading that description into an
//! executable model.
//!
//! The engine only depends on the three traits in this module. A reference
//! implementation, [`JsonInterchange`], ships with the crate so pipelines can
//! be scored without any other runtime.
//!
//! # Available Ops
//!
//! | Op | Params | Input | Output |
//! |----|--------|-------|--------|
//! | `standard_scaler` | `mean`, `std`, `withMean`, `withStd` | real or vector | same shape |
//! | `min_max_scaler` | `originalMin`, `originalMax`, `min`, `max` | real or vector | same shape |
//! | `max_abs_scaler` | `maxAbs` | real or vector | same shape |
//! | `vector_assembler` | `inputCols` | reals and vectors | vector |
//! | `linear_regression` | `coefficients`, `intercept` | real or vector | real |
//! | `logistic_regression` | `coefficients`, `intercept` | real or vector | real (probability) |

pub mod json;
pub mod ops;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

pub use json::{JsonInterchange, BUNDLE_FORMAT};

/// Parameter set of an external transformer, keyed by parameter name.
pub type ParamMap = serde_json::Map<String, JsonValue>;

/// Definition of a distributed-engine operator as handed over by training.
///
/// `Clone` is a deep copy: a cloned definition shares no parameter state with
/// the original.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalTransformer {
    /// Operator name understood by the interpreter (e.g. `standard_scaler`).
    pub op: String,
    /// Unique id of the trained operator instance.
    pub uid: String,
    pub params: ParamMap,
}

impl ExternalTransformer {
    pub fn new(op: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            uid: uid.into(),
            params: ParamMap::new(),
        }
    }

    /// Set a parameter, builder style.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key)
    }

    /// String value of a parameter, if set to a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(JsonValue::as_str)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.params.insert(key.into(), value.into());
    }
}

/// Serializes external transformer definitions into a textual model description.
pub trait InterchangeCompiler: Send + Sync {
    /// Serialize the transformer into the interchange format.
    ///
    /// # Errors
    /// Returns an error if the transformer cannot be expressed in the format.
    fn serialize(&self, transformer: &ExternalTransformer) -> Result<String>;
}

/// Loads textual model descriptions into executable models.
pub trait InterchangeInterpreter: Send + Sync {
    /// Compile a model description.
    ///
    /// # Errors
    /// Returns an error if the description is rejected.
    fn load(&self, description: &str) -> Result<Box<dyn PortableModel>>;
}

/// An executable portable model.
///
/// Input and output are JSON objects keyed by positional column names.
pub trait PortableModel: Send + Sync {
    /// Run the model on one record.
    fn transform(&self, input: &JsonValue) -> Result<JsonValue>;

    /// Operator name, for logging.
    fn op(&self) -> &str;

    /// Whether concurrent calls to [`PortableModel::transform`] are allowed.
    ///
    /// Models returning `false` are invoked one call at a time.
    fn is_reentrant(&self) -> bool {
        true
    }
}
