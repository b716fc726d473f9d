//! Declarative column renames

use eyre::Result;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// Ordered mapping from provider column names to table column names
///
/// Source names and destination names are each unique.
///
/// # Example
/// ```
/// use nba_stats_etl::transform::ColumnMap;
///
/// let map = ColumnMap::try_from_pairs([("TEAM_ID", "team_id"), ("CITY", "team_city")]).unwrap();
/// assert_eq!(map.get("CITY"), Some("team_city"));
/// assert!(ColumnMap::try_from_pairs([("A", "x"), ("B", "x")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_pairs<I, S, D>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        let mut map = Self::new();
        for (source, destination) in pairs {
            map.insert(source, destination)?;
        }
        Ok(map)
    }

    /// Add a rename
    ///
    /// # Errors
    /// Returns an error if either name is already mapped
    pub fn insert(&mut self, source: impl Into<String>, destination: impl Into<String>) -> Result<()> {
        let (source, destination) = (source.into(), destination.into());
        if self.get(&source).is_some() {
            eyre::bail!("Column '{}' is mapped more than once", source);
        }
        if let Some((other, _)) = self.entries.iter().find(|(_, d)| *d == destination) {
            eyre::bail!(
                "Columns '{}' and '{}' both map to '{}'",
                other,
                source,
                destination
            );
        }
        self.entries.push((source, destination));
        Ok(())
    }

    /// Destination name for a source column
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, d)| d.as_str())
    }

    pub fn contains_destination(&self, destination: &str) -> bool {
        self.entries.iter().any(|(_, d)| d == destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct ColumnMapVisitor;

impl<'de> Visitor<'de> for ColumnMapVisitor {
    type Value = ColumnMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of source column to destination column")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = ColumnMap::new();
        while let Some((source, destination)) = access.next_entry::<String, String>()? {
            map.insert(source, destination)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for ColumnMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ColumnMapVisitor)
    }
}
