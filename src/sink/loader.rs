//! Replace-then-key table loader

use super::{Credential, Sink, SinkConnection, quote_ident};
use crate::error::{EtlError, FailureKind, Result};
use crate::etl::{KeyConstraint, LoadReport, Loader};
use crate::table::Table;

/// Loader that replaces a destination table wholesale and keys it
///
/// Within one connection it:
/// 1. registers the rows under `<table>__incoming`
/// 2. runs `CREATE OR REPLACE TABLE <table> AS SELECT * FROM <table>__incoming`
/// 3. runs `ALTER TABLE <table> ADD PRIMARY KEY (<key>)`
///
/// Re-running with the same or newer rows supersedes the previous snapshot.
/// If step 3 fails because the key is already there, the load still counts
/// as a success. If it fails on duplicate keys, the replaced table stays in
/// place without the constraint and the load reports `ConstraintViolation`.
///
/// The connection is closed whether or not the steps succeed.
pub struct TableLoader<S> {
    sink: S,
    credential: Credential,
    table: String,
    key_column: String,
}

impl<S: Sink> TableLoader<S> {
    pub fn new(
        sink: S,
        credential: Credential,
        table: impl Into<String>,
        key_column: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            credential,
            table: table.into(),
            key_column: key_column.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn transient_name(&self) -> String {
        format!("{}__incoming", self.table)
    }

    pub fn replace_statement(&self) -> String {
        format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
            quote_ident(&self.table),
            quote_ident(&self.transient_name())
        )
    }

    pub fn key_statement(&self) -> String {
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            quote_ident(&self.table),
            quote_ident(&self.key_column)
        )
    }

    fn write(&self, conn: &mut S::Connection, table: &Table) -> Result<KeyConstraint> {
        conn.register(&self.transient_name(), table)?;
        conn.execute(&self.replace_statement())?;

        match conn.execute(&self.key_statement()) {
            Ok(()) => Ok(KeyConstraint::Applied),
            Err(e) if key_already_present(&e) => {
                log::warn!(
                    "Primary key on {}.{} already present: {}",
                    self.table,
                    self.key_column,
                    e
                );
                Ok(KeyConstraint::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }

    fn open_and_write(&self, table: &Table) -> Result<KeyConstraint> {
        let mut conn = self.sink.open(&self.credential)?;
        let written = self.write(&mut conn, table);

        match (written, conn.close()) {
            (Ok(key), Ok(())) => Ok(key),
            (Ok(key), Err(e)) => {
                log::warn!("Loaded {} but closing the connection failed: {}", self.table, e);
                Ok(key)
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    log::debug!("Closing after failure also failed: {}", close_error);
                }
                Err(e)
            }
        }
    }
}

fn key_already_present(error: &EtlError) -> bool {
    if error.kind() == FailureKind::ConstraintViolation {
        return false;
    }
    let message = error.to_string().to_lowercase();
    message.contains("primary key") && message.contains("already")
}

impl<S: Sink> Loader for TableLoader<S> {
    type Item = Table;

    fn load(&self, table: Self::Item) -> Result<LoadReport> {
        if !table.columns().iter().any(|c| *c == self.key_column) {
            log::warn!(
                "Key column '{}' is not among the columns of {}",
                self.key_column,
                self.table
            );
        }
        if table.row_count() == 0 {
            log::warn!("Loading an empty snapshot into {}", self.table);
        }

        match self.open_and_write(&table) {
            Ok(key) => {
                log::info!(
                    "Replaced {} with {} rows (primary key {} {})",
                    self.table,
                    table.row_count(),
                    self.key_column,
                    key
                );
                Ok(LoadReport {
                    table: self.table.clone(),
                    rows: table.row_count(),
                    key,
                })
            }
            Err(e) => {
                let hint = match &e {
                    EtlError::ConstraintViolation(_) => {
                        "duplicate or missing key values; table replaced without its primary key"
                    }
                    EtlError::ConnectionFailure(_) => "check the database locator and MotherDuck token",
                    EtlError::QuerySyntaxFailure(_) => "generated SQL or table reference is wrong",
                    _ => "unexpected error",
                };
                log::error!("Loading {} failed [{}]: {} ({})", self.table, e.kind(), e, hint);
                Err(e)
            }
        }
    }
}
