//! Case data: raw tables, parsing, providers, and the per-request model.
//!
//! This module handles:
//! - Case kinds and per-country statistics
//! - Parsing of the JHU CSSE time-series CSV files
//! - Data sources (remote, directory, static)
//! - The per-request case model and its response views

pub mod model;
pub mod parser;
pub mod source;
pub mod types;

pub use model::{CaseModel, CaseSnapshot, Stamp, TimeSeriesSnapshot};
pub use source::{
    sample_dataset, CaseSource, DatasetBuilder, DirectorySource, RemoteSource, StaticSource,
};
pub use types::{CaseKind, CaseTable, CountryStats, RawDataset, TimePoint};
