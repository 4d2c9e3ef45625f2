//! Error types for the filter criteria engine

use thiserror::Error;

/// Main error type for the filter criteria engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid criteria: {0}")]
    Construction(String),

    #[error("Parse error at position {position}: {message} ('{fragment}')")]
    Parse {
        message: String,
        fragment: String,
        position: usize,
    },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Unresolved property: {0}")]
    UnresolvedProperty(String),

    #[error("Member '{member}' not found on type '{type_name}'")]
    MemberNotFound { type_name: String, member: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl FilterError {
    /// Build a parse error for `fragment` found at byte offset `position`
    pub fn parse(message: impl Into<String>, fragment: impl Into<String>, position: usize) -> Self {
        FilterError::Parse {
            message: message.into(),
            fragment: fragment.into(),
            position,
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::Deserialization(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<FilterError> for pyo3::PyErr {
    fn from(err: FilterError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};

        match err {
            FilterError::UnresolvedProperty(_) | FilterError::MemberNotFound { .. } => {
                PyKeyError::new_err(err.to_string())
            }
            FilterError::Evaluation(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the filter criteria engine
pub type Result<T> = std::result::Result<T, FilterError>;
