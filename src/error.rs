use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("No valid data rows found")]
    EmptyBatch,

    #[error("Field '{field}' is out of range: {value}")]
    FieldOutOfRange { field: String, value: String },

    #[error("Cannot read '{value}' as {expected} in field '{field}'")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Scoring service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Scoring service rejected the request ({status}): {message}")]
    ServiceRejected { status: u16, message: String },

    #[error("Scoring service contract violation: {0}")]
    ContractViolation(String),

    #[error("No batch results to export")]
    ExportWithNoData,

    #[error("Invalid state transition: {current} -> {requested}")]
    InvalidTransition { current: String, requested: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy surfaced to the user, without per-instance detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingColumns,
    EmptyBatch,
    FieldOutOfRange,
    TypeCoercionFailure,
    MalformedTable,
    ServiceUnavailable,
    ServiceRejected,
    ContractViolation,
    ExportWithNoData,
    InvalidTransition,
    Internal,
}

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Self::MissingColumns { columns } => Self::MissingColumns {
                columns: columns.clone(),
            },
            Self::EmptyBatch => Self::EmptyBatch,
            Self::FieldOutOfRange { field, value } => Self::FieldOutOfRange {
                field: field.clone(),
                value: value.clone(),
            },
            Self::TypeCoercion {
                field,
                value,
                expected,
            } => Self::TypeCoercion {
                field: field.clone(),
                value: value.clone(),
                expected: *expected,
            },
            Self::MalformedTable(s) => Self::MalformedTable(s.clone()),
            Self::ServiceUnavailable(s) => Self::ServiceUnavailable(s.clone()),
            Self::ServiceRejected { status, message } => Self::ServiceRejected {
                status: *status,
                message: message.clone(),
            },
            Self::ContractViolation(s) => Self::ContractViolation(s.clone()),
            Self::ExportWithNoData => Self::ExportWithNoData,
            Self::InvalidTransition { current, requested } => Self::InvalidTransition {
                current: current.clone(),
                requested: requested.clone(),
            },
            Self::Config(s) => Self::Config(s.clone()),
            Self::Internal(s) => Self::Internal(s.clone()),
            // For errors that can't be cloned, convert to string representation
            Self::Serialization(e) => Self::Internal(format!("Serialization error: {}", e)),
            Self::Yaml(e) => Self::Internal(format!("YAML error: {}", e)),
            Self::Csv(e) => Self::MalformedTable(e.to_string()),
            Self::Io(e) => Self::Internal(format!("IO error: {}", e)),
        }
    }
}

impl Error {
    pub fn out_of_range(field: impl Into<String>, value: impl ToString) -> Self {
        Self::FieldOutOfRange {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn coercion(field: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeCoercion {
            field: field.into(),
            value: value.into(),
            expected,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedTable(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingColumns { .. } => FailureKind::MissingColumns,
            Self::EmptyBatch => FailureKind::EmptyBatch,
            Self::FieldOutOfRange { .. } => FailureKind::FieldOutOfRange,
            Self::TypeCoercion { .. } => FailureKind::TypeCoercionFailure,
            Self::MalformedTable(_) | Self::Csv(_) => FailureKind::MalformedTable,
            Self::ServiceUnavailable(_) => FailureKind::ServiceUnavailable,
            Self::ServiceRejected { .. } => FailureKind::ServiceRejected,
            Self::ContractViolation(_) => FailureKind::ContractViolation,
            Self::ExportWithNoData => FailureKind::ExportWithNoData,
            Self::InvalidTransition { .. } => FailureKind::InvalidTransition,
            Self::Config(_)
            | Self::Serialization(_)
            | Self::Yaml(_)
            | Self::Io(_)
            | Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Failures that only disqualify a single batch row.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            Self::TypeCoercion { .. } | Self::FieldOutOfRange { .. }
        )
    }
}
