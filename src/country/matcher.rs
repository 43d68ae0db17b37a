//! Matching policy for `/country/{name}`.
//!
//! A two-character name is treated as an ISO alpha-2 code, resolved to a
//! country name, and matched as a case-insensitive substring of the snapshot's
//! country names. `us` and `uk` are the exception: they are matched exactly,
//! like every name whose length is not two.

use std::collections::BTreeMap;

use tracing::debug;

use super::lookup::CountryLookup;
use crate::error::MatchError;

/// Two-letter names always matched literally.
pub const RESERVED_NAMES: [&str; 2] = ["us", "uk"];

/// How a request name is compared against country names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive equality with this lower-cased name.
    Exact(String),
    /// Case-insensitive containment of this lower-cased, resolved name.
    Contains(String),
}

impl MatchMode {
    /// Decide the mode for a request name, resolving codes through `lookup`.
    pub fn for_name(name: &str, lookup: &dyn CountryLookup) -> Result<Self, MatchError> {
        let lowered = name.to_lowercase();
        if RESERVED_NAMES.contains(&lowered.as_str()) || name.chars().count() != 2 {
            return Ok(MatchMode::Exact(lowered));
        }

        let resolved = lookup.lookup(name)?;
        debug!(code = %name, resolved = %resolved, "Resolved country code");
        Ok(MatchMode::Contains(resolved.to_lowercase()))
    }

    /// Whether `country` satisfies this mode.
    pub fn matches(&self, country: &str) -> bool {
        let country = country.to_lowercase();
        match self {
            MatchMode::Exact(name) => country == *name,
            MatchMode::Contains(name) => country.contains(name.as_str()),
        }
    }
}

/// Select the entries of `countries` matching `name`.
pub fn match_countries<V: Clone>(
    countries: &BTreeMap<String, V>,
    name: &str,
    lookup: &dyn CountryLookup,
) -> Result<BTreeMap<String, V>, MatchError> {
    let mode = MatchMode::for_name(name, lookup)?;
    let matched: BTreeMap<String, V> = countries
        .iter()
        .filter(|(country, _)| mode.matches(country))
        .map(|(country, value)| (country.clone(), value.clone()))
        .collect();

    if matched.is_empty() {
        return Err(MatchError::NoMatch(name.to_string()));
    }
    Ok(matched)
}
