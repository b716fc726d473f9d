//! Build pipelines from definitions and run them one after another

use crate::client::StatsProvider;
use crate::config::{Definitions, Entity, PipelineDefinition, RunContext};
use crate::error::{EtlError, Result};
use crate::etl::{LoadReport, Pipeline};
use crate::sink::{Credential, Sink, TableLoader};
use crate::source::{EndpointSource, FanOutSource};

/// Build and run the pipeline one definition describes
pub async fn run_definition<P, S>(
    definition: &PipelineDefinition,
    context: &RunContext,
    provider: P,
    sink: S,
    credential: Credential,
) -> Result<LoadReport>
where
    P: StatsProvider,
    S: Sink,
{
    let source = &definition.source;
    let params = source.resolve_params(context);
    let transformer = definition.transformer();
    let loader = TableLoader::new(sink, credential, &definition.table, &definition.key);

    match &source.fan_out {
        Some(fan_out) => {
            let mut extractor = FanOutSource::new(
                provider,
                &source.endpoint,
                &fan_out.param,
                fan_out.ids.clone(),
                source.result_set.clone(),
            )
            .with_params(params)
            .with_delay(fan_out.delay());
            if let Some(limit) = fan_out.max_total() {
                extractor = extractor.with_max_total(limit);
            }
            Pipeline::new(&definition.entity, extractor, transformer, loader)
                .run()
                .await
        }
        None => {
            let extractor =
                EndpointSource::new(provider, &source.endpoint, source.result_set.clone())
                    .with_params(params);
            Pipeline::new(&definition.entity, extractor, transformer, loader)
                .run()
                .await
        }
    }
}

/// Outcome of a multi-entity run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<(Entity, LoadReport)>,
    pub failures: Vec<(Entity, EtlError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 0 when everything loaded, otherwise the code of the first failure
    pub fn exit_code(&self) -> u8 {
        self.failures
            .first()
            .map(|(_, e)| e.exit_code())
            .unwrap_or(0)
    }
}

/// Run each entity's pipeline in turn
///
/// A failing pipeline is logged and recorded; the remaining ones still run.
pub async fn run_all<P, S>(
    entities: &[Entity],
    definitions: &Definitions,
    context: &RunContext,
    provider: P,
    sink: S,
    credential: &Credential,
) -> eyre::Result<RunSummary>
where
    P: StatsProvider + Clone,
    S: Sink + Clone,
{
    let mut summary = RunSummary::default();

    for &entity in entities {
        let definition = definitions
            .get(entity)
            .ok_or_else(|| eyre::eyre!("No pipeline definition for {}", entity))?;

        match run_definition(
            definition,
            context,
            provider.clone(),
            sink.clone(),
            credential.clone(),
        )
        .await
        {
            Ok(report) => summary.reports.push((entity, report)),
            Err(e) => {
                log::error!("{} pipeline failed [{}]: {}", entity, e.kind(), e);
                summary.failures.push((entity, e));
            }
        }
    }

    log::info!(
        "Run finished: {} loaded, {} failed",
        summary.reports.len(),
        summary.failures.len()
    );
    Ok(summary)
}
