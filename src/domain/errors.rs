use std::path::PathBuf;
use thiserror::Error;

/// Coarse error classes exposed to callers of the forecasting core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Schema,
    Validation,
    Model,
}

/// Errors raised by preprocessing, training, persistence and inference.
#[derive(Debug, Error)]
pub enum DemandError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data in {path:?}: {reason}")]
    MalformedData { path: PathBuf, reason: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Invalid feature schema: {reason}")]
    InvalidSchema { reason: String },

    #[error("Schema version mismatch: expected {expected}, loaded {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Insufficient training data: need at least {needed} rows, got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    #[error("Model failure: {reason}")]
    Model { reason: String },
}

impl DemandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DemandError::Io { .. } | DemandError::MalformedData { .. } => ErrorKind::Io,
            DemandError::MissingColumn { .. }
            | DemandError::InvalidSchema { .. }
            | DemandError::SchemaMismatch { .. } => ErrorKind::Schema,
            DemandError::InvalidValue { .. } | DemandError::InsufficientData { .. } => {
                ErrorKind::Validation
            }
            DemandError::Model { .. } => ErrorKind::Model,
        }
    }

    pub(crate) fn model(reason: impl std::fmt::Display) -> Self {
        DemandError::Model {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_formatting() {
        let error = DemandError::SchemaMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
        assert_eq!(error.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_error_kinds() {
        let io = DemandError::MalformedData {
            path: PathBuf::from("data/sales.csv"),
            reason: "row 3: bad date".to_string(),
        };
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().contains("row 3"));

        let validation = DemandError::InsufficientData {
            needed: 2,
            actual: 1,
        };
        assert_eq!(validation.kind(), ErrorKind::Validation);
    }
}
