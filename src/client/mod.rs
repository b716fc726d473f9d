//! NBA stats API client.
//!
//! This module provides the [`StatsClient`] for calling the stats API, along
//! with the response model ([`StatsResponse`], [`ResultSet`]) and the
//! [`StatsProvider`] trait sources depend on.

mod stats;

pub use stats::{
    ClientOptions, DEFAULT_BASE_URL, ResultSet, ResultSetSelector, StatsClient, StatsProvider,
    StatsResponse,
};
