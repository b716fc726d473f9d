//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides trait definitions for building pipelines that
//! extract a table from the statistics provider, normalize it, and load it
//! into the sink database.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::{KeyConstraint, LoadReport, Loader};
pub use pipeline::Pipeline;
pub use transform::Transformer;
