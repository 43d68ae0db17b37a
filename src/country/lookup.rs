//! Country-code resolution.

use std::fmt::Debug;

use super::iso::BY_ALPHA2;
use crate::error::LookupError;

/// Resolves an ISO 3166-1 alpha-2 code to a canonical country name.
pub trait CountryLookup: Debug + Send + Sync {
    /// Resolve `code`, ignoring ASCII case.
    fn lookup(&self, code: &str) -> Result<String, LookupError>;
}

/// Lookup backed by the built-in ISO 3166-1 table.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoCountryLookup;

impl CountryLookup for IsoCountryLookup {
    fn lookup(&self, code: &str) -> Result<String, LookupError> {
        BY_ALPHA2
            .get(code.to_ascii_uppercase().as_str())
            .map(|name| name.to_string())
            .ok_or_else(|| LookupError::UnknownCode(code.to_string()))
    }
}
