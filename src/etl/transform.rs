//! Transformer trait for data transformation

use crate::error::Result;

/// Transformer trait for reshaping extracted data
///
/// Implementations must be pure: the same input and configuration always
/// produce the same output.
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform the input
    ///
    /// # Errors
    /// Returns an error if the input does not fit the configured shape
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}
