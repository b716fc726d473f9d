//! One request per identifier, stacked into one table

use super::{Pacer, Params, SleepPacer, select_table};
use crate::client::{ResultSetSelector, StatsProvider};
use crate::error::{EtlError, Result};
use crate::etl::Extractor;
use crate::table::RawTable;
use std::time::{Duration, Instant};

/// Calls one endpoint once per identifier and concatenates the results
///
/// Requests go out in identifier order with a fixed pause between
/// consecutive requests. Rows keep their per-request order, then request
/// order. If any request fails, or any response lacks the selected result
/// set, the whole extraction fails.
pub struct FanOutSource<P, C = SleepPacer> {
    provider: P,
    pacer: C,
    endpoint: String,
    params: Params,
    id_param: String,
    ids: Vec<String>,
    selector: ResultSetSelector,
    delay: Duration,
    max_total: Option<Duration>,
}

impl<P: StatsProvider> FanOutSource<P> {
    /// Fan out over `ids`, sending each one as the `id_param` query parameter
    pub fn new(
        provider: P,
        endpoint: impl Into<String>,
        id_param: impl Into<String>,
        ids: Vec<String>,
        selector: ResultSetSelector,
    ) -> Self {
        Self {
            provider,
            pacer: SleepPacer,
            endpoint: endpoint.into(),
            params: Vec::new(),
            id_param: id_param.into(),
            ids,
            selector,
            delay: Duration::from_secs(2),
            max_total: None,
        }
    }
}

impl<P: StatsProvider, C: Pacer> FanOutSource<P, C> {
    /// Replace the pacer (tests use a recording one)
    pub fn with_pacer<D: Pacer>(self, pacer: D) -> FanOutSource<P, D> {
        FanOutSource {
            provider: self.provider,
            pacer,
            endpoint: self.endpoint,
            params: self.params,
            id_param: self.id_param,
            ids: self.ids,
            selector: self.selector,
            delay: self.delay,
            max_total: self.max_total,
        }
    }

    /// Pause between consecutive requests (default 2 s)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Give up once the whole fan-out has taken longer than `limit`
    pub fn with_max_total(mut self, limit: Duration) -> Self {
        self.max_total = Some(limit);
        self
    }

    /// Parameters sent with every request, before the identifier
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    async fn fetch_one(&self, id: &str) -> Result<RawTable> {
        let mut params = self.params.clone();
        params.push((self.id_param.clone(), id.to_string()));

        let response = self.provider.fetch(&self.endpoint, &params).await?;
        select_table(&self.endpoint, &response, &self.selector).map_err(|e| match e {
            EtlError::SourceSchemaMismatch { endpoint, message } => {
                EtlError::SourceSchemaMismatch {
                    endpoint,
                    message: format!("{} for {} {}", message, self.id_param, id),
                }
            }
            other => other,
        })
    }
}

impl<P: StatsProvider, C: Pacer> Extractor for FanOutSource<P, C> {
    type Output = RawTable;

    async fn extract(&self) -> Result<Self::Output> {
        let started = Instant::now();
        let mut combined = RawTable::default();

        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                self.pacer.pause(self.delay).await;
                if let Some(limit) = self.max_total.filter(|limit| started.elapsed() > *limit) {
                    return Err(EtlError::SourceUnavailable {
                        endpoint: self.endpoint.clone(),
                        message: format!(
                            "gave up after {:?} with {} of {} requests done",
                            limit,
                            i,
                            self.ids.len()
                        ),
                    });
                }
            }

            log::debug!(
                "Fetching {} for {} {} ({}/{})",
                self.endpoint,
                self.id_param,
                id,
                i + 1,
                self.ids.len()
            );
            let table = self.fetch_one(id).await?;
            combined
                .append(table)
                .map_err(|e| EtlError::SourceSchemaMismatch {
                    endpoint: self.endpoint.clone(),
                    message: format!("{} {}: {}", self.id_param, id, e),
                })?;
        }

        log::info!(
            "Extracted {} rows from {} request(s) to {}",
            combined.row_count(),
            self.ids.len(),
            self.endpoint
        );

        Ok(combined)
    }
}
