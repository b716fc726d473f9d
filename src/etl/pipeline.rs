//! Pipeline orchestration for ETL operations

use super::{Extractor, LoadReport, Loader, Transformer};
use crate::error::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
/// for one entity
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Output)
/// - `L`: Loader type (must load T::Output)
pub struct Pipeline<E, T, L> {
    name: String,
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Output>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(name: impl Into<String>, extractor: E, transformer: T, loader: L) -> Self {
        Self {
            name: name.into(),
            extractor,
            transformer,
            loader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract from source
    /// 2. Transform
    /// 3. Load to destination
    ///
    /// # Errors
    /// Extract and transform failures abort the run before anything is
    /// loaded. Load failures come back already classified.
    pub async fn run(&self) -> Result<LoadReport> {
        log::info!("Starting {} pipeline", self.name);

        log::debug!("Extracting from source...");
        let extracted = self.extractor.extract().await?;

        log::debug!("Transforming...");
        let transformed = self.transformer.transform(extracted)?;

        log::debug!("Loading to destination...");
        let report = self.loader.load(transformed)?;
        log::info!(
            "{} pipeline loaded {} rows into {}",
            self.name,
            report.rows,
            report.table
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::etl::KeyConstraint;
    use std::sync::{Arc, Mutex};

    struct MockExtractor(Result<Vec<i32>>);

    impl Extractor for MockExtractor {
        type Output = Vec<i32>;
        async fn extract(&self) -> Result<Self::Output> {
            self.0.clone()
        }
    }

    struct DoubleTransformer;

    impl Transformer for DoubleTransformer {
        type Input = Vec<i32>;
        type Output = Vec<i32>;
        fn transform(&self, input: Self::Input) -> Result<Self::Output> {
            Ok(input.into_iter().map(|i| i * 2).collect())
        }
    }

    struct SumLoader(Arc<Mutex<Option<i32>>>);

    impl Loader for SumLoader {
        type Item = Vec<i32>;
        fn load(&self, item: Self::Item) -> Result<LoadReport> {
            *self.0.lock().unwrap() = Some(item.iter().sum());
            Ok(LoadReport {
                table: "sums".to_string(),
                rows: item.len(),
                key: KeyConstraint::Applied,
            })
        }
    }

    #[tokio::test]
    async fn test_pipeline() {
        let result = Arc::new(Mutex::new(None));

        let pipeline = Pipeline::new(
            "numbers",
            MockExtractor(Ok(vec![1, 2, 3])),
            DoubleTransformer,
            SumLoader(result.clone()),
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(pipeline.name(), "numbers");
        assert_eq!(report.rows, 3);
        assert_eq!(*result.lock().unwrap(), Some(12)); // (1+2+3)*2 = 12
    }

    #[tokio::test]
    async fn test_extract_failure_skips_load() {
        let result = Arc::new(Mutex::new(None));

        let pipeline = Pipeline::new(
            "numbers",
            MockExtractor(Err(EtlError::SourceUnavailable {
                endpoint: "numbers".to_string(),
                message: "connection refused".to_string(),
            })),
            DoubleTransformer,
            SumLoader(result.clone()),
        );

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.exit_code(), 10);
        assert!(result.lock().unwrap().is_none());
    }
}
