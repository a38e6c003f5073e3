//! Reference JSON interchange format.
//!
//! A model description is a JSON document:
//! ```text
//! { "format": "localscore.bundle/1", "op": "...", "uid": "...", "params": { ... } }
//! ```

use serde::{Deserialize, Serialize};

use super::ops;
use super::{ExternalTransformer, InterchangeCompiler, InterchangeInterpreter, ParamMap, PortableModel};
use crate::error::{Result, ScoringError};

/// Format tag written into every bundle.
pub const BUNDLE_FORMAT: &str = "localscore.bundle/1";

#[derive(Debug, Serialize, Deserialize)]
struct Bundle {
    format: String,
    op: String,
    uid: String,
    #[serde(default)]
    params: ParamMap,
}

/// Interchange compiler and interpreter backed by `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonInterchange;

impl JsonInterchange {
    pub fn new() -> Self {
        Self
    }
}

impl InterchangeCompiler for JsonInterchange {
    fn serialize(&self, transformer: &ExternalTransformer) -> Result<String> {
        if transformer.op.trim().is_empty() {
            return Err(ScoringError::Serialization(format!(
                "transformer '{}' has no op name",
                transformer.uid
            )));
        }
        if !ops::is_supported(&transformer.op) {
            return Err(ScoringError::Serialization(format!(
                "op '{}' has no interchange representation",
                transformer.op
            )));
        }
        let bundle = Bundle {
            format: BUNDLE_FORMAT.to_string(),
            op: transformer.op.clone(),
            uid: transformer.uid.clone(),
            params: transformer.params.clone(),
        };
        Ok(serde_json::to_string(&bundle)?)
    }
}

impl InterchangeInterpreter for JsonInterchange {
    fn load(&self, description: &str) -> Result<Box<dyn PortableModel>> {
        let bundle: Bundle = serde_json::from_str(description)?;
        if bundle.format != BUNDLE_FORMAT {
            return Err(ScoringError::Serialization(format!(
                "unsupported bundle format '{}', expected '{}'",
                bundle.format, BUNDLE_FORMAT
            )));
        }
        ops::build(&bundle.op, &bundle.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scaler() -> ExternalTransformer {
        ExternalTransformer::new("standard_scaler", "ss_1")
            .with_param("inputCol", "input")
            .with_param("outputCol", "output")
            .with_param("mean", json!([10.0]))
            .with_param("std", json!([2.0]))
    }

    #[test]
    fn test_serialize_writes_format_tag() {
        let text = JsonInterchange.serialize(&scaler()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["format"], json!(BUNDLE_FORMAT));
        assert_eq!(parsed["op"], json!("standard_scaler"));
        assert_eq!(parsed["params"]["mean"], json!([10.0]));
    }

    #[test]
    fn test_serialize_then_load() {
        let text = JsonInterchange.serialize(&scaler()).unwrap();
        let model = JsonInterchange.load(&text).unwrap();
        assert_eq!(model.op(), "standard_scaler");

        let out = model.transform(&json!({"input": 14.0})).unwrap();
        assert_eq!(out["output"], json!(2.0));
    }

    #[test]
    fn test_serialize_rejects_unknown_op() {
        let t = ExternalTransformer::new("tokenizer", "tok");
        assert!(matches!(
            JsonInterchange.serialize(&t),
            Err(ScoringError::Serialization(_))
        ));
    }

    #[test]
    fn test_serialize_rejects_empty_op() {
        let t = ExternalTransformer::new("  ", "blank");
        assert!(JsonInterchange.serialize(&t).is_err());
    }

    #[test]
    fn test_load_rejects_wrong_format() {
        let text = r#"{"format":"other/9","op":"standard_scaler","uid":"x","params":{}}"#;
        assert!(JsonInterchange.load(text).is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            JsonInterchange.load("not a bundle"),
            Err(ScoringError::Serialization(_))
        ));
    }
}
