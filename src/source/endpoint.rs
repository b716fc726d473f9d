//! Single-request source

use super::{Params, select_table};
use crate::client::{ResultSetSelector, StatsProvider};
use crate::error::Result;
use crate::etl::Extractor;
use crate::table::RawTable;

/// Reads one result set from a single stats API request
///
/// Used for players, scoreboard and standings, where one call returns the
/// whole snapshot.
pub struct EndpointSource<P> {
    provider: P,
    endpoint: String,
    params: Params,
    selector: ResultSetSelector,
}

impl<P: StatsProvider> EndpointSource<P> {
    pub fn new(provider: P, endpoint: impl Into<String>, selector: ResultSetSelector) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            params: Vec::new(),
            selector,
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<P: StatsProvider> Extractor for EndpointSource<P> {
    type Output = RawTable;

    async fn extract(&self) -> Result<Self::Output> {
        let response = self.provider.fetch(&self.endpoint, &self.params).await?;
        let table = select_table(&self.endpoint, &response, &self.selector)?;

        log::info!(
            "Extracted {} rows x {} columns from {}",
            table.row_count(),
            table.columns().len(),
            self.endpoint
        );

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EtlError, FailureKind};
    use crate::source::testing::ScriptedProvider;
    use crate::table::Scalar;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_extract_selects_indexed_result_set() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let response = serde_json::from_value(json!({
            "resultSets": [{
                "name": "PlayerIndex",
                "headers": ["PERSON_ID", "PLAYER_LAST_NAME"],
                "rowSet": [[1628369, "Tatum"], [1627759, "Brown"]]
            }]
        }))
        .unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(response)], journal));

        let source = EndpointSource::new(provider.clone(), "playerindex", ResultSetSelector::Index(0))
            .param("LeagueID", "00")
            .param("Season", "2024-25");
        let table = source.extract().await.unwrap();

        assert_eq!(source.endpoint(), "playerindex");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1], Scalar::from("Brown"));

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            vec![
                ("LeagueID".to_string(), "00".to_string()),
                ("Season".to_string(), "2024-25".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(
            vec![Err(EtlError::SourceUnavailable {
                endpoint: "leaguestandingsv3".to_string(),
                message: "HTTP 503".to_string(),
            })],
            journal,
        );

        let source = EndpointSource::new(provider, "leaguestandingsv3", ResultSetSelector::Index(0));
        let err = source.extract().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_absent_result_set_is_not_an_empty_table() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let response = serde_json::from_value(json!({
            "resultSets": [{"name": "GameHeader", "headers": ["GAME_ID"], "rowSet": []}]
        }))
        .unwrap();
        let provider = ScriptedProvider::new(vec![Ok(response)], journal);

        let source = EndpointSource::new(
            provider,
            "scoreboardv2",
            ResultSetSelector::Name("LineScore".to_string()),
        );
        let err = source.extract().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::SourceSchemaMismatch);
    }
}
