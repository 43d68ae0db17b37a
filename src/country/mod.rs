//! Country resolution for `/country/{name}`.
//!
//! This module handles:
//! - The ISO 3166-1 alpha-2 table
//! - Code-to-name lookup
//! - The exact/substring matching policy

pub mod iso;
pub mod lookup;
pub mod matcher;

pub use lookup::{CountryLookup, IsoCountryLookup};
pub use matcher::{match_countries, MatchMode, RESERVED_NAMES};
