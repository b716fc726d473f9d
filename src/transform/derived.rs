//! Columns appended after the renamed ones

use crate::table::Scalar;

/// A new column with pre-computed values, one per row
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    name: String,
    values: Vec<Scalar>,
}

impl DerivedColumn {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build the column by substituting each identifier into `template`
    /// at every `{id}`
    ///
    /// # Example
    /// ```
    /// use nba_stats_etl::transform::DerivedColumn;
    ///
    /// let ids = vec!["1610612738".to_string()];
    /// let logo = DerivedColumn::from_template(
    ///     "team_logo",
    ///     "https://cdn.nba.com/logos/nba/{id}/primary/L/logo.svg",
    ///     &ids,
    /// );
    /// assert_eq!(
    ///     logo.values()[0].to_string(),
    ///     "https://cdn.nba.com/logos/nba/1610612738/primary/L/logo.svg"
    /// );
    /// ```
    pub fn from_template(name: impl Into<String>, template: &str, ids: &[String]) -> Self {
        let values = ids
            .iter()
            .map(|id| Scalar::Text(template.replace("{id}", id)))
            .collect();
        Self::new(name, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
