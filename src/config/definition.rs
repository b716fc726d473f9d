//! Pipeline definition files
//!
//! Each entity is described by one YAML file:
//!
//! ```yaml
//! entity: teams
//! table: teams
//! key: team_id
//! source:
//!   endpoint: teamdetails
//!   result_set:
//!     name: TeamBackground
//!   fan_out:
//!     param: TeamID
//!     ids: ["1610612737", "1610612738"]
//!     delay_ms: 2000
//! drop: []
//! columns:
//!   TEAM_ID: team_id
//!   CITY: city
//! derived:
//!   - name: team_logo
//!     template: "https://cdn.nba.com/logos/nba/{id}/primary/L/logo.svg"
//! ```
//!
//! Parameter values may contain `{season}` and `{game_date}`, filled in from
//! the [`RunContext`] when the pipeline is built.

use crate::client::ResultSetSelector;
use crate::source::Params;
use crate::transform::{ColumnMap, DerivedColumn, TableTransformer};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use eyre::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Values a definition's parameters are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Season in the API's `2024-25` form
    pub season: String,
    /// The moment the run started; `{game_date}` is derived from it
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new(season: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            season: season.into(),
            now,
        }
    }
}

fn default_delay_ms() -> u64 {
    2000
}

fn time_zone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Tz>, D::Error> {
    let name: Option<String> = Option::deserialize(deserializer)?;
    name.map(|n| n.parse::<Tz>().map_err(serde::de::Error::custom))
        .transpose()
}

struct ParamsVisitor;

impl<'de> Visitor<'de> for ParamsVisitor {
    type Value = Params;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of query parameter names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut params = Params::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            if params.iter().any(|(k, _)| *k == key) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate query parameter '{}'",
                    key
                )));
            }
            params.push((key, value));
        }
        Ok(params)
    }
}

/// Query parameters in file order
fn ordered_params<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
    deserializer.deserialize_map(ParamsVisitor)
}

/// Repeat the request once per identifier
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanOutDefinition {
    /// Query parameter carrying the identifier
    pub param: String,
    pub ids: Vec<String>,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub max_total_secs: Option<u64>,
}

impl FanOutDefinition {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_total(&self) -> Option<Duration> {
        self.max_total_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDefinition {
    pub endpoint: String,
    pub result_set: ResultSetSelector,
    #[serde(default, deserialize_with = "ordered_params")]
    pub params: Params,
    /// Time zone `{game_date}` is computed in (UTC when absent)
    #[serde(default, deserialize_with = "time_zone")]
    pub time_zone: Option<Tz>,
    #[serde(default)]
    pub fan_out: Option<FanOutDefinition>,
}

impl SourceDefinition {
    /// Parameters with `{season}` and `{game_date}` filled in
    pub fn resolve_params(&self, context: &RunContext) -> Vec<(String, String)> {
        let game_date = context
            .now
            .with_timezone(&self.time_zone.unwrap_or(Tz::UTC))
            .format("%Y-%m-%d")
            .to_string();

        self.params
            .iter()
            .map(|(key, value)| {
                let value = value
                    .replace("{season}", &context.season)
                    .replace("{game_date}", &game_date);
                (key.clone(), value)
            })
            .collect()
    }
}

/// A column computed from the source's identifiers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedDefinition {
    pub name: String,
    /// `{id}` is replaced with each identifier
    pub template: String,
}

/// Everything needed to build one entity's pipeline
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineDefinition {
    pub entity: String,
    /// Destination table
    pub table: String,
    /// Natural key column (after renaming)
    pub key: String,
    pub source: SourceDefinition,
    #[serde(default)]
    pub drop: Vec<String>,
    pub columns: ColumnMap,
    #[serde(default)]
    pub derived: Vec<DerivedDefinition>,
}

impl PipelineDefinition {
    /// Parse and validate a definition
    pub fn from_yaml(text: &str) -> Result<Self> {
        let definition: Self =
            serde_yaml::from_str(text).context("Failed to parse pipeline definition")?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read a definition from disk
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid definition in {}", path.display()))
    }

    /// Check the definition is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            eyre::bail!("{}: table name is empty", self.entity);
        }

        if let Some(column) = self.drop.iter().find(|d| self.columns.get(d).is_some()) {
            eyre::bail!(
                "{}: column '{}' is both dropped and renamed",
                self.entity,
                column
            );
        }

        let mut derived_names: Vec<&str> = Vec::new();
        for derived in &self.derived {
            if self.columns.contains_destination(&derived.name)
                || derived_names.contains(&derived.name.as_str())
            {
                eyre::bail!(
                    "{}: derived column '{}' collides with another column",
                    self.entity,
                    derived.name
                );
            }
            derived_names.push(&derived.name);
        }
        if !self.derived.is_empty() && self.source.fan_out.is_none() {
            eyre::bail!(
                "{}: derived columns are built from fan-out identifiers, but the source has no fan_out",
                self.entity
            );
        }

        if !self.columns.contains_destination(&self.key) && !derived_names.contains(&self.key.as_str())
        {
            eyre::bail!(
                "{}: key column '{}' is not produced by the column map",
                self.entity,
                self.key
            );
        }

        Ok(())
    }

    /// Build the transformer this definition describes
    pub fn transformer(&self) -> TableTransformer {
        let ids: &[String] = self
            .source
            .fan_out
            .as_ref()
            .map(|f| f.ids.as_slice())
            .unwrap_or(&[]);

        self.derived.iter().fold(
            TableTransformer::new(self.columns.clone()).with_drop(self.drop.iter().cloned()),
            |transformer, derived| {
                transformer.with_derived(DerivedColumn::from_template(
                    &derived.name,
                    &derived.template,
                    ids,
                ))
            },
        )
    }
}
