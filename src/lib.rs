//! Read-only HTTP API over COVID-19 case data.
//!
//! Serves confirmed, deaths, and recovered counts from the JHU CSSE global
//! time series. Every request fetches and parses the source tables again and
//! builds its own snapshot; nothing is cached or shared between requests.
//!
//! ```text
//! GET /current            {country: {confirmed, deaths, recovered}, dt, ts}
//! GET /country/de         resolves DE -> "Germany", substring match
//! GET /timeseries/deaths  {deaths: [{date, count}], dt, ts}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`data`]: Case tables, CSV parsing, sources, and the per-request model
//! - [`country`]: ISO alpha-2 lookup and country matching
//! - [`api`]: HTTP API routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod country;
pub mod data;
pub mod error;
pub mod metrics;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
