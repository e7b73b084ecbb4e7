use thiserror::Error;

/// Column-level failures. Every variant names the column it failed on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EtlError {
    #[error("Column '{column}' not found")]
    MissingColumn { column: String },

    #[error("Column '{column}' cannot be converted to {dtype}: {reason}")]
    Cast {
        column: String,
        dtype: String,
        reason: String,
    },

    #[error("Unsupported type '{dtype}' requested for column '{column}'")]
    UnknownType { column: String, dtype: String },

    #[error("Column '{column}' has a non-numeric value {value} and cannot be compared")]
    NotNumeric { column: String, value: String },

    #[error("Invalid rule for column '{column}': {reason}")]
    InvalidRule { column: String, reason: String },

    #[error("Constraint violations: {}", .0.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; "))]
    Constraints(Vec<ConstraintViolation>),

    #[error("Cannot derive column '{column}': {reason}")]
    Expression { column: String, reason: String },

    #[error("Failed to read CSV '{path}': {reason}")]
    Csv { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintViolation {
    NotNull { column: String, count: usize },
    Unique { column: String, duplicates: usize },
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintViolation::NotNull { column, count } => {
                write!(f, "Null values found in '{}' ({} rows)", column, count)
            }
            ConstraintViolation::Unique { column, duplicates } => write!(
                f,
                "Duplicate values found in unique column '{}' ({} repeats)",
                column, duplicates
            ),
        }
    }
}
