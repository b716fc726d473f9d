//! NBA Stats ETL
//!
//! Pulls snapshots from the NBA stats API, renames their columns and replaces
//! DuckDB / MotherDuck tables with them, one pipeline per entity.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod runner;
pub mod sink;
pub mod source;
pub mod table;
pub mod transform;

// Re-exports for convenience
pub use client::{StatsClient, StatsProvider};
pub use config::{Definitions, Entity, PipelineDefinition, RunContext};
pub use error::{EtlError, FailureKind, Result};
pub use etl::{Extractor, LoadReport, Loader, Pipeline, Transformer};
pub use runner::{RunSummary, run_all, run_definition};
pub use sink::{Credential, DuckDbSink, Sink, TableLoader};
pub use source::{EndpointSource, FanOutSource};
pub use table::{RawTable, Scalar, Table};
pub use transform::{ColumnMap, TableTransformer};
