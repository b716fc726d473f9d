use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// The entities this tool knows how to load
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Entity {
    Players,
    Scoreboard,
    Standings,
    Teams,
}

impl Entity {
    /// Every entity, in the order a full run processes them
    pub const ALL: [Entity; 4] = [
        Entity::Players,
        Entity::Scoreboard,
        Entity::Standings,
        Entity::Teams,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Scoreboard => "scoreboard",
            Self::Standings => "standings",
            Self::Teams => "teams",
        }
    }

    /// File name of the entity's pipeline definition
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.as_str())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = eyre::Report;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| eyre::eyre!("Unknown entity '{}'", s))
    }
}
