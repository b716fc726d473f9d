//! Sink databases and the table loader
//!
//! A [`Sink`] hands out connections; a [`SinkConnection`] can register rows
//! under a transient name, execute statements and close. [`TableLoader`]
//! drives the three-step replace-then-key sequence over one connection.

mod credential;
mod duck;
mod loader;

pub use credential::{Credential, TOKEN_VAR};
pub use duck::DuckDbSink;
pub use loader::TableLoader;

use crate::error::Result;
use crate::table::Table;

/// A database that can be opened with a credential
pub trait Sink: Send + Sync {
    type Connection: SinkConnection;

    /// Open a connection
    ///
    /// # Errors
    /// `ConnectionFailure` when the credential is missing or rejected, or
    /// the database cannot be reached
    fn open(&self, credential: &Credential) -> Result<Self::Connection>;
}

/// An open sink connection
pub trait SinkConnection {
    /// Make `table` queryable as `name` for the life of the connection
    fn register(&mut self, name: &str, table: &Table) -> Result<()>;

    /// Execute one statement
    fn execute(&mut self, statement: &str) -> Result<()>;

    /// Release the connection
    fn close(self) -> Result<()>;
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
