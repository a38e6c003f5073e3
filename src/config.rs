//! Plan compilation settings.

use serde::{Deserialize, Serialize};

/// Configuration for compiling wrapped stages.
///
/// # Example
/// ```ignore
/// let config = CompilerConfig::default()
///     .with_positional_names("in", "out")
///     .with_serialize_non_reentrant(false);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Positional name the interchange format uses for the input column.
    pub input_positional: String,
    /// Positional name the interchange format uses for the output column.
    pub output_positional: String,
    /// If true, models that are not reentrant are called behind a lock;
    /// if false, compiling such a model fails.
    pub serialize_non_reentrant: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input_positional: "input".to_string(),
            output_positional: "output".to_string(),
            serialize_non_reentrant: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the positional input and output column names.
    pub fn with_positional_names(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.input_positional = input.into();
        self.output_positional = output.into();
        self
    }

    /// Set whether non-reentrant models are serialized behind a lock.
    pub fn with_serialize_non_reentrant(mut self, serialize: bool) -> Self {
        self.serialize_non_reentrant = serialize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_positional_names() {
        let config = CompilerConfig::default();
        assert_eq!(config.input_positional, "input");
        assert_eq!(config.output_positional, "output");
        assert!(config.serialize_non_reentrant);
    }

    #[test]
    fn test_builder() {
        let config = CompilerConfig::new()
            .with_positional_names("in", "out")
            .with_serialize_non_reentrant(false);
        assert_eq!(config.input_positional, "in");
        assert_eq!(config.output_positional, "out");
        assert!(!config.serialize_non_reentrant);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"serialize_non_reentrant": false}"#).unwrap();
        assert_eq!(config.input_positional, "input");
        assert!(!config.serialize_non_reentrant);
    }
}
