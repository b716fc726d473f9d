//! Tabular sources backed by the stats API
//!
//! [`EndpointSource`] reads one result set from one request.
//! [`FanOutSource`] repeats the same request once per identifier and stacks
//! the result sets, pausing between requests to stay under the API's rate
//! limit.

mod endpoint;
mod fan_out;
mod pacer;

pub use endpoint::EndpointSource;
pub use fan_out::FanOutSource;
pub use pacer::{Pacer, SleepPacer};

use crate::client::{ResultSetSelector, StatsResponse};
use crate::error::{EtlError, Result};
use crate::table::{RawTable, Scalar};

/// Query parameters, in the order they are sent
pub type Params = Vec<(String, String)>;

/// Turn the selected result set of a response into a [`RawTable`]
pub(crate) fn select_table(
    endpoint: &str,
    response: &StatsResponse,
    selector: &ResultSetSelector,
) -> Result<RawTable> {
    let set = response
        .select(selector)
        .ok_or_else(|| EtlError::SourceSchemaMismatch {
            endpoint: endpoint.to_string(),
            message: format!(
                "result set {} not found (available: {})",
                selector,
                response
                    .result_sets
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })?;

    let rows = set
        .row_set
        .iter()
        .map(|row| row.iter().map(Scalar::from).collect())
        .collect();

    RawTable::try_new(set.headers.clone(), rows).map_err(|e| EtlError::SourceSchemaMismatch {
        endpoint: endpoint.to_string(),
        message: format!("result set {}: {}", selector, e),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider and recording pacer shared by source tests

    use super::Pacer;
    use crate::client::{StatsProvider, StatsResponse};
    use crate::error::{EtlError, Result};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Everything the provider and pacer saw, in order
    pub type Journal = Arc<Mutex<Vec<String>>>;

    pub struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<StatsResponse>>>,
        pub calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
        journal: Journal,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<Result<StatsResponse>>, journal: Journal) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                journal,
            }
        }
    }

    impl StatsProvider for ScriptedProvider {
        async fn fetch(
            &self,
            endpoint: &str,
            params: &[(String, String)],
        ) -> Result<StatsResponse> {
            let rendered = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            self.journal
                .lock()
                .unwrap()
                .push(format!("fetch {}?{}", endpoint, rendered));
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), params.to_vec()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(EtlError::SourceUnavailable {
                        endpoint: endpoint.to_string(),
                        message: "script exhausted".to_string(),
                    })
                })
        }
    }

    pub struct RecordingPacer {
        journal: Journal,
    }

    impl RecordingPacer {
        pub fn new(journal: Journal) -> Self {
            Self { journal }
        }
    }

    impl Pacer for RecordingPacer {
        async fn pause(&self, duration: Duration) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("pause {}ms", duration.as_millis()));
        }
    }
}
