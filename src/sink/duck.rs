//! DuckDB / MotherDuck sink

use super::{Credential, Sink, SinkConnection, quote_ident};
use crate::error::{EtlError, Result};
use crate::table::{Scalar, Table};
use duckdb::types::Value;
use duckdb::{Connection, appender_params_from_iter};

const MOTHERDUCK_PREFIX: &str = "md:";

impl From<duckdb::Error> for EtlError {
    fn from(error: duckdb::Error) -> Self {
        EtlError::from_sink_message(error.to_string())
    }
}

/// DuckDB database, local or on MotherDuck
///
/// `md:` locators (e.g. `md:nba_data_staging`) need a token, which is passed
/// as `motherduck_token` on the connection string. File paths and `:memory:`
/// open without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuckDbSink {
    database: String,
}

impl DuckDbSink {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_motherduck(&self) -> bool {
        self.database.starts_with(MOTHERDUCK_PREFIX)
    }

    fn connection_string(&self, credential: &Credential) -> Result<String> {
        if !self.is_motherduck() {
            return Ok(self.database.clone());
        }
        let token = credential.token().ok_or_else(|| {
            EtlError::ConnectionFailure(format!(
                "{} needs a MotherDuck token but {} is not set",
                self.database,
                super::TOKEN_VAR
            ))
        })?;
        let separator = if self.database.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}motherduck_token={}",
            self.database, separator, token
        ))
    }
}

impl Sink for DuckDbSink {
    type Connection = DuckDbConnection;

    fn open(&self, credential: &Credential) -> Result<Self::Connection> {
        let connection_string = self.connection_string(credential)?;
        log::debug!("Opening DuckDB database {}", self.database);

        let conn = if self.database == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&connection_string)
        }
        .map_err(|e| {
            let mut message = e.to_string();
            if let Some(token) = credential.token() {
                message = message.replace(token, "<redacted>");
            }
            // Whatever stopped us from opening, the load can't proceed
            match EtlError::from_sink_message(message.clone()) {
                EtlError::UnknownFailure(_) => EtlError::ConnectionFailure(message),
                other => other,
            }
        })?;

        Ok(DuckDbConnection { conn })
    }
}

/// An open DuckDB connection
pub struct DuckDbConnection {
    conn: Connection,
}

impl DuckDbConnection {
    /// Borrow the underlying connection, e.g. to query a loaded table
    pub fn inner(&self) -> &Connection {
        &self.conn
    }
}

impl SinkConnection for DuckDbConnection {
    fn register(&mut self, name: &str, table: &Table) -> Result<()> {
        let types: Vec<ColumnType> = (0..table.columns().len())
            .map(|i| ColumnType::infer(table.rows().iter().map(|row| &row[i])))
            .collect();

        let definitions = table
            .columns()
            .iter()
            .zip(&types)
            .map(|(column, ty)| format!("{} {}", quote_ident(column), ty.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} ({})",
            quote_ident(name),
            definitions
        ))?;

        if table.row_count() == 0 {
            return Ok(());
        }

        // Unqualified appender lookup searches the temp catalog first
        let mut appender = self.conn.appender(name)?;
        appender.append_rows(table.rows().iter().map(|row| {
            appender_params_from_iter(row.iter().zip(&types).map(|(value, ty)| ty.coerce(value)))
        }))?;
        appender.flush()?;

        log::debug!("Registered {} rows as {}", table.row_count(), name);
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        log::debug!("Executing: {}", statement);
        self.conn.execute_batch(statement)?;
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

/// SQL type of a registered column, inferred from its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Boolean,
    BigInt,
    Double,
    Varchar,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
        }
    }

    /// Integers widen to doubles; any other mix, or no values at all, is text
    fn infer<'a>(values: impl Iterator<Item = &'a Scalar>) -> Self {
        let mut inferred: Option<Self> = None;
        for value in values {
            let ty = match value {
                Scalar::Null => continue,
                Scalar::Bool(_) => Self::Boolean,
                Scalar::Int(_) => Self::BigInt,
                Scalar::Float(_) => Self::Double,
                Scalar::Text(_) => Self::Varchar,
            };
            inferred = Some(match (inferred, ty) {
                (None, ty) => ty,
                (Some(a), b) if a == b => a,
                (Some(Self::BigInt), Self::Double) | (Some(Self::Double), Self::BigInt) => {
                    Self::Double
                }
                _ => Self::Varchar,
            });
        }
        inferred.unwrap_or(Self::Varchar)
    }

    fn coerce(self, value: &Scalar) -> Value {
        match (self, value) {
            (_, Scalar::Null) => Value::Null,
            (Self::Boolean, Scalar::Bool(b)) => Value::Boolean(*b),
            (Self::BigInt, Scalar::Int(i)) => Value::BigInt(*i),
            (Self::Double, Scalar::Int(i)) => Value::Double(*i as f64),
            (Self::Double, Scalar::Float(x)) => Value::Double(*x),
            (_, other) => Value::Text(other.to_string()),
        }
    }
}
