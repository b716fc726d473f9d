//! Drop, rename and extend a provider table

use super::{ColumnMap, DerivedColumn};
use crate::error::{EtlError, Result};
use crate::etl::Transformer;
use crate::table::{RawTable, Scalar, Table};

/// Transformer that normalizes a [`RawTable`] into a [`Table`]
///
/// Every provider column must be either listed in the drop list or renamed by
/// the column map. Anything else is an `UnmappedColumn` error, so new
/// upstream columns surface instead of slipping into the table unnamed.
///
/// Output columns are the renamed columns in provider order, followed by the
/// derived columns in the order they were added.
///
/// # Example
/// ```
/// use nba_stats_etl::etl::Transformer;
/// use nba_stats_etl::table::{RawTable, Scalar};
/// use nba_stats_etl::transform::{ColumnMap, TableTransformer};
///
/// let raw = RawTable::try_new(
///     vec!["TEAM_ID".into(), "TEAM_NAME".into()],
///     vec![vec![Scalar::Int(1610612738), "Celtics".into()]],
/// )
/// .unwrap();
/// let transformer = TableTransformer::new(ColumnMap::try_from_pairs([("TEAM_ID", "team_id")]).unwrap())
///     .with_drop(["TEAM_NAME"]);
///
/// let table = transformer.transform(raw).unwrap();
/// assert_eq!(table.columns(), &["team_id"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableTransformer {
    columns: ColumnMap,
    drop: Vec<String>,
    derived: Vec<DerivedColumn>,
}

impl TableTransformer {
    pub fn new(columns: ColumnMap) -> Self {
        Self {
            columns,
            drop: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// Provider columns to discard
    pub fn with_drop<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a derived column
    pub fn with_derived(mut self, column: DerivedColumn) -> Self {
        self.derived.push(column);
        self
    }

    fn is_dropped(&self, column: &str) -> bool {
        self.drop.iter().any(|d| d == column)
    }

    /// Pair each kept provider column index with its new name
    fn plan(&self, columns: &[String]) -> Result<Vec<(usize, String)>> {
        let mut kept = Vec::new();
        for (index, column) in columns.iter().enumerate() {
            if self.is_dropped(column) {
                continue;
            }
            match self.columns.get(column) {
                Some(destination) => kept.push((index, destination.to_string())),
                None => {
                    return Err(EtlError::UnmappedColumn {
                        column: column.clone(),
                    });
                }
            }
        }

        for (source, _) in self.columns.iter() {
            if !columns.iter().any(|c| c == source) {
                log::warn!("Mapped column '{}' is not in the provider table", source);
            }
        }
        for dropped in &self.drop {
            if !columns.contains(dropped) {
                log::debug!("Dropped column '{}' is not in the provider table", dropped);
            }
        }

        Ok(kept)
    }
}

impl Transformer for TableTransformer {
    type Input = RawTable;
    type Output = Table;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let (columns, rows) = input.into_parts();
        let kept = self.plan(&columns)?;

        if let Some(column) = self.derived.iter().find(|d| d.len() != rows.len()) {
            return Err(EtlError::ColumnLengthMismatch {
                column: column.name().to_string(),
                expected: rows.len(),
                actual: column.len(),
            });
        }

        let names: Vec<String> = kept
            .iter()
            .map(|(_, name)| name.clone())
            .chain(self.derived.iter().map(|d| d.name().to_string()))
            .collect();

        let rows: Vec<Vec<Scalar>> = rows
            .into_iter()
            .enumerate()
            .map(|(r, mut row)| {
                kept.iter()
                    .map(|(index, _)| std::mem::take(&mut row[*index]))
                    .chain(self.derived.iter().map(|d| d.values()[r].clone()))
                    .collect()
            })
            .collect();

        log::info!(
            "Transformed {} rows into {} columns ({} dropped, {} derived)",
            rows.len(),
            names.len(),
            columns.len() - kept.len(),
            self.derived.len()
        );

        Ok(Table::from_aligned(names, rows))
    }
}
