//! Loader trait for loading data to destinations

use crate::error::Result;
use std::fmt;

/// State of the natural-key constraint after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyConstraint {
    /// The constraint was added by this load
    Applied,
    /// The sink reported the constraint was already in place
    AlreadyPresent,
}

impl fmt::Display for KeyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::AlreadyPresent => write!(f, "already present"),
        }
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Destination table name
    pub table: String,
    /// Rows written to the destination
    pub rows: usize,
    pub key: KeyConstraint,
}

/// Loader trait for loading data to a destination
///
/// Load failures are classified and logged by the loader itself before being
/// returned, so callers only decide whether to carry on.
pub trait Loader: Send + Sync {
    /// The type of data to load
    type Item: Send;

    /// Load to the destination
    ///
    /// # Errors
    /// `ConstraintViolation`, `ConnectionFailure`, `QuerySyntaxFailure` or
    /// `UnknownFailure`
    fn load(&self, item: Self::Item) -> Result<LoadReport>;
}
