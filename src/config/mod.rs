//! Pipeline configuration
//!
//! Every entity has a YAML definition under `pipelines/`. The files are
//! embedded in the binary; a directory given at run time overrides them file
//! by file.

mod definition;
mod entity;

pub use definition::{
    DerivedDefinition, FanOutDefinition, PipelineDefinition, RunContext, SourceDefinition,
};
pub use entity::Entity;

use eyre::{Result, WrapErr};
use std::collections::HashMap;
use std::path::Path;

fn builtin_yaml(entity: Entity) -> &'static str {
    match entity {
        Entity::Players => include_str!("../../pipelines/players.yml"),
        Entity::Scoreboard => include_str!("../../pipelines/scoreboard.yml"),
        Entity::Standings => include_str!("../../pipelines/standings.yml"),
        Entity::Teams => include_str!("../../pipelines/teams.yml"),
    }
}

/// One definition per entity
#[derive(Debug, Clone)]
pub struct Definitions {
    definitions: HashMap<Entity, PipelineDefinition>,
}

impl Definitions {
    /// The definitions compiled into the binary
    pub fn builtin() -> Result<Self> {
        let mut definitions = HashMap::new();
        for entity in Entity::ALL {
            let definition = PipelineDefinition::from_yaml(builtin_yaml(entity))
                .wrap_err_with(|| format!("Built-in definition for {} is invalid", entity))?;
            definitions.insert(entity, checked(entity, definition)?);
        }
        Ok(Self { definitions })
    }

    /// Built-in definitions, replaced by `<dir>/<entity>.yml` where present
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            eyre::bail!("Pipeline directory {} does not exist", dir.display());
        }

        let mut loaded = Self::builtin()?;
        for entity in Entity::ALL {
            let path = dir.join(entity.file_name());
            if path.exists() {
                log::debug!("Using {} for {}", path.display(), entity);
                let definition = PipelineDefinition::read(&path)?;
                loaded.definitions.insert(entity, checked(entity, definition)?);
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, entity: Entity) -> Option<&PipelineDefinition> {
        self.definitions.get(&entity)
    }
}

fn checked(entity: Entity, definition: PipelineDefinition) -> Result<PipelineDefinition> {
    if definition.entity != entity.as_str() {
        eyre::bail!(
            "Definition for {} declares entity '{}'",
            entity,
            definition.entity
        );
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResultSetSelector;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_definitions() {
        let definitions = Definitions::builtin().unwrap();

        for entity in Entity::ALL {
            let definition = definitions.get(entity).unwrap();
            assert_eq!(definition.table, entity.as_str());
        }

        let teams = definitions.get(Entity::Teams).unwrap();
        assert_eq!(teams.key, "team_id");
        assert_eq!(teams.source.fan_out.as_ref().unwrap().ids.len(), 30);
        assert_eq!(teams.derived[0].name, "team_logo");

        let scoreboard = definitions.get(Entity::Scoreboard).unwrap();
        assert_eq!(
            scoreboard.source.result_set,
            ResultSetSelector::Name("LineScore".to_string())
        );
        assert!(scoreboard.drop.iter().any(|c| c == "PTS_OT10"));
        assert_eq!(scoreboard.source.time_zone, Some(chrono_tz::America::Los_Angeles));

        let players = definitions.get(Entity::Players).unwrap();
        assert_eq!(players.key, "person_id");
        assert!(players.drop.is_empty());

        let standings = definitions.get(Entity::Standings).unwrap();
        assert_eq!(standings.columns.get("TeamID"), Some("team_id"));
        assert!(standings.drop.iter().any(|c| c == "TeamCity"));
    }

    #[test]
    fn test_directory_overrides_single_entity() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("standings.yml"),
            r#"
entity: standings
table: standings_test
key: team_id
source:
  endpoint: leaguestandingsv3
  result_set: { index: 0 }
columns:
  TeamID: team_id
"#,
        )
        .unwrap();

        let definitions = Definitions::from_dir(dir.path()).unwrap();
        assert_eq!(
            definitions.get(Entity::Standings).unwrap().table,
            "standings_test"
        );
        assert_eq!(definitions.get(Entity::Teams).unwrap().table, "teams");
    }

    #[test]
    fn test_override_must_match_entity() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("teams.yml"), builtin_yaml(Entity::Players)).unwrap();

        let err = Definitions::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("declares entity 'players'"), "{}", err);
    }

    #[test]
    fn test_missing_directory() {
        assert!(Definitions::from_dir("/nonexistent/pipelines").is_err());
    }
}
