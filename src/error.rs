//! Error types for plan compilation and row scoring.

use thiserror::Error;

/// Error type for every fallible operation in the crate.
///
/// Compilation errors abort plan construction; every other variant is
/// scoped to the single row being scored.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A stage could not be turned into an executable plan stage.
    #[error("Compilation error in stage '{stage}': {reason}")]
    Compilation { stage: String, reason: String },
    /// A value does not have the shape the bridge or the declared type expects.
    #[error("Value shape error: expected {expected}, got {got}")]
    ValueShape { expected: String, got: String },
    /// The portable interpreter failed or returned an unusable result.
    #[error("Interpretation error: {0}")]
    Interpretation(String),
    /// A native transform failed.
    #[error("Transform error: {0}")]
    Transform(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Failure of one stage while scoring a row.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<ScoringError>,
    },
}

impl ScoringError {
    pub(crate) fn compilation(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoringError::Compilation {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ScoringError::ValueShape {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub(crate) fn in_stage(self, stage: &str) -> Self {
        ScoringError::Stage {
            stage: stage.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through `Stage` wrappers.
    pub fn root(&self) -> &ScoringError {
        match self {
            ScoringError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the failing stage, if the error was raised while scoring.
    pub fn stage(&self) -> Option<&str> {
        match self {
            ScoringError::Stage { stage, .. } | ScoringError::Compilation { stage, .. } => {
                Some(stage)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Serialization(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_compilation() {
        let err = ScoringError::compilation("scaler", "unknown op");
        let msg = err.to_string();
        assert!(msg.contains("Compilation error"));
        assert!(msg.contains("scaler"));
    }

    #[test]
    fn test_error_display_value_shape() {
        let err = ScoringError::shape("list", "map");
        assert_eq!(
            err.to_string(),
            "Value shape error: expected list, got map"
        );
    }

    #[test]
    fn test_error_display_interpretation() {
        let err = ScoringError::Interpretation("missing key".to_string());
        assert!(err.to_string().contains("Interpretation error"));
    }

    #[test]
    fn test_stage_wrapper_root() {
        let err = ScoringError::shape("vector", "text").in_stage("assembler");
        assert_eq!(err.stage(), Some("assembler"));
        assert!(matches!(err.root(), ScoringError::ValueShape { .. }));
        assert!(err.to_string().contains("Stage 'assembler' failed"));
    }

    #[test]
    fn test_error_source_chain() {
        let err = ScoringError::Transform("boom".to_string()).in_stage("age");
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        if let Err(e) = bad {
            let err: ScoringError = e.into();
            assert!(matches!(err, ScoringError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = ScoringError::Interpretation("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
