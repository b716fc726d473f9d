//! Failure taxonomy for pipeline runs
//!
//! Every failure a pipeline can end with is one of eight classes. Extract and
//! transform failures abort the run as soon as they happen; load failures are
//! classified at the sink boundary by [`classify`] and reported by the loader.

use std::fmt;
use thiserror::Error;

/// Result type used across the pipeline stages
pub type Result<T, E = EtlError> = std::result::Result<T, E>;

/// A classified pipeline failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EtlError {
    /// The statistics provider could not be reached or answered with an error
    #[error("statistics provider unavailable for '{endpoint}': {message}")]
    SourceUnavailable { endpoint: String, message: String },

    /// The provider answered, but not with the result set we expected
    #[error("response from '{endpoint}' does not match the expected schema: {message}")]
    SourceSchemaMismatch { endpoint: String, message: String },

    /// A source column is neither renamed nor explicitly dropped
    #[error("column '{column}' is neither renamed nor dropped")]
    UnmappedColumn { column: String },

    /// A column's value count disagrees with the table's row count
    #[error("{column}: expected {expected} values, found {actual}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("query syntax failure: {0}")]
    QuerySyntaxFailure(String),

    #[error("unexpected failure: {0}")]
    UnknownFailure(String),
}

impl EtlError {
    /// Build a load-time error from a sink's error message
    pub fn from_sink_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match classify(&message) {
            FailureKind::ConstraintViolation => Self::ConstraintViolation(message),
            FailureKind::ConnectionFailure => Self::ConnectionFailure(message),
            FailureKind::QuerySyntaxFailure => Self::QuerySyntaxFailure(message),
            _ => Self::UnknownFailure(message),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SourceUnavailable { .. } => FailureKind::SourceUnavailable,
            Self::SourceSchemaMismatch { .. } => FailureKind::SourceSchemaMismatch,
            Self::UnmappedColumn { .. } => FailureKind::UnmappedColumn,
            Self::ColumnLengthMismatch { .. } => FailureKind::ColumnLengthMismatch,
            Self::ConstraintViolation(_) => FailureKind::ConstraintViolation,
            Self::ConnectionFailure(_) => FailureKind::ConnectionFailure,
            Self::QuerySyntaxFailure(_) => FailureKind::QuerySyntaxFailure,
            Self::UnknownFailure(_) => FailureKind::UnknownFailure,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

/// The closed set of failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    SourceUnavailable,
    SourceSchemaMismatch,
    UnmappedColumn,
    ColumnLengthMismatch,
    ConstraintViolation,
    ConnectionFailure,
    QuerySyntaxFailure,
    UnknownFailure,
}

impl FailureKind {
    /// Exit codes: 1x for extract/transform failures, 2x for load failures
    pub fn exit_code(self) -> u8 {
        match self {
            Self::SourceUnavailable => 10,
            Self::SourceSchemaMismatch => 11,
            Self::UnmappedColumn => 12,
            Self::ColumnLengthMismatch => 13,
            Self::ConstraintViolation => 20,
            Self::ConnectionFailure => 21,
            Self::QuerySyntaxFailure => 22,
            Self::UnknownFailure => 23,
        }
    }

    /// Whether the failure happened while loading into the sink
    pub fn is_load_failure(self) -> bool {
        self.exit_code() >= 20
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceUnavailable => "SourceUnavailable",
            Self::SourceSchemaMismatch => "SourceSchemaMismatch",
            Self::UnmappedColumn => "UnmappedColumn",
            Self::ColumnLengthMismatch => "ColumnLengthMismatch",
            Self::ConstraintViolation => "ConstraintViolation",
            Self::ConnectionFailure => "ConnectionFailure",
            Self::QuerySyntaxFailure => "QuerySyntaxFailure",
            Self::UnknownFailure => "UnknownFailure",
        };
        f.write_str(name)
    }
}

const CONSTRAINT_MARKERS: &[&str] = &[
    "constraint error",
    "duplicate key",
    "contains duplicates",
    "violates primary key",
    "not null constraint",
];

const SYNTAX_MARKERS: &[&str] = &[
    "parser error",
    "syntax error",
    "catalog error",
    "binder error",
];

const CONNECTION_MARKERS: &[&str] = &[
    "connection error",
    "io error",
    "http error",
    "not authenticated",
    "invalid token",
    "token is invalid",
    "token has expired",
    "unauthorized",
    "authentication failed",
    "could not connect",
    "failed to connect",
];

/// Classify a sink error message into one of the load-time failure classes.
///
/// Returns [`FailureKind::UnknownFailure`] when no marker matches.
pub fn classify(message: &str) -> FailureKind {
    let message = message.to_lowercase();
    let matches = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

    if matches(CONSTRAINT_MARKERS) {
        FailureKind::ConstraintViolation
    } else if matches(SYNTAX_MARKERS) {
        FailureKind::QuerySyntaxFailure
    } else if matches(CONNECTION_MARKERS) {
        FailureKind::ConnectionFailure
    } else {
        FailureKind::UnknownFailure
    }
}
