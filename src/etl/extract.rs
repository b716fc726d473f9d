//! Extractor trait for pulling data from a source

use crate::error::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define how to extract from sources like:
/// - A single stats API endpoint
/// - One endpoint called once per identifier
///
/// # Example
/// ```no_run
/// use nba_stats_etl::error::Result;
/// use nba_stats_etl::etl::Extractor;
/// use nba_stats_etl::table::RawTable;
///
/// struct EmptySource;
///
/// impl Extractor for EmptySource {
///     type Output = RawTable;
///
///     async fn extract(&self) -> Result<Self::Output> {
///         Ok(RawTable::default())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of data extracted
    type Output: Send;

    /// Extract from the source
    ///
    /// # Errors
    /// `SourceUnavailable` when the source cannot be reached,
    /// `SourceSchemaMismatch` when it answers with an unexpected shape.
    fn extract(&self) -> impl std::future::Future<Output = Result<Self::Output>> + Send;
}
