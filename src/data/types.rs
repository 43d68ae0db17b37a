//! Case-data types shared by the parser, model, and HTTP layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

use crate::error::ParseError;

/// One of the three tracked metrics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CaseKind {
    /// Confirmed cases.
    Confirmed,
    /// Deaths.
    Deaths,
    /// Recovered cases.
    Recovered,
}

impl CaseKind {
    /// File name of the JHU CSSE global time series for this kind.
    pub fn file_name(&self) -> String {
        format!("time_series_covid19_{self}_global.csv")
    }

    /// All kinds in a fixed order.
    pub fn all() -> impl Iterator<Item = CaseKind> {
        CaseKind::iter()
    }
}

/// Latest cumulative figures for one country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountryStats {
    /// Confirmed cases.
    pub confirmed: u64,
    /// Deaths.
    pub deaths: u64,
    /// Recovered cases.
    pub recovered: u64,
}

impl CountryStats {
    /// Value of a single metric.
    pub fn get(&self, kind: CaseKind) -> u64 {
        match kind {
            CaseKind::Confirmed => self.confirmed,
            CaseKind::Deaths => self.deaths,
            CaseKind::Recovered => self.recovered,
        }
    }

    fn slot(&mut self, kind: CaseKind) -> &mut u64 {
        match kind {
            CaseKind::Confirmed => &mut self.confirmed,
            CaseKind::Deaths => &mut self.deaths,
            CaseKind::Recovered => &mut self.recovered,
        }
    }

    /// Set a single metric.
    pub fn set(&mut self, kind: CaseKind, value: u64) {
        *self.slot(kind) = value;
    }

    /// Add another record into this one.
    pub fn accumulate(&mut self, other: &CountryStats) {
        for kind in CaseKind::all() {
            let slot = self.slot(kind);
            *slot = slot.saturating_add(other.get(kind));
        }
    }
}

/// One entry of a cumulative time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimePoint {
    /// Date as it appears in the source header (e.g. `1/22/20`).
    pub date: String,
    /// Cumulative count on that date.
    pub count: u64,
}

/// A parsed time-series file: dates in column order and, per country, the
/// cumulative values aligned with `dates`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTable {
    /// Date headers in column order.
    pub dates: Vec<String>,
    /// Series per country, province rows already summed.
    pub series: BTreeMap<String, Vec<u64>>,
}

impl CaseTable {
    /// Latest date header, if any.
    pub fn latest_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }

    /// Latest value per country.
    pub fn latest(&self) -> impl Iterator<Item = (&str, u64)> {
        self.series
            .iter()
            .map(|(country, values)| (country.as_str(), values.last().copied().unwrap_or(0)))
    }

    /// Series summed over all countries. Sums saturate; tables accepted by
    /// [`CaseTable::check_totals`] never reach the bound.
    pub fn global_series(&self) -> Vec<TimePoint> {
        self.dates
            .iter()
            .enumerate()
            .map(|(i, date)| TimePoint {
                date: date.clone(),
                count: self
                    .series
                    .values()
                    .map(|values| values.get(i).copied().unwrap_or(0))
                    .fold(0u64, u64::saturating_add),
            })
            .collect()
    }

    /// Fail if any per-date sum across countries overflows a `u64`.
    pub fn check_totals(&self) -> Result<(), ParseError> {
        for (i, date) in self.dates.iter().enumerate() {
            self.series
                .values()
                .map(|values| values.get(i).copied().unwrap_or(0))
                .try_fold(0u64, u64::checked_add)
                .ok_or_else(|| ParseError::Overflow {
                    country: "all countries".to_string(),
                    date: date.clone(),
                })?;
        }
        Ok(())
    }
}

/// The three raw tables a snapshot is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataset {
    /// Confirmed cases table.
    pub confirmed: CaseTable,
    /// Deaths table.
    pub deaths: CaseTable,
    /// Recovered cases table.
    pub recovered: CaseTable,
}

impl RawDataset {
    /// Table for a case kind.
    pub fn table(&self, kind: CaseKind) -> &CaseTable {
        match kind {
            CaseKind::Confirmed => &self.confirmed,
            CaseKind::Deaths => &self.deaths,
            CaseKind::Recovered => &self.recovered,
        }
    }

    /// Mutable table for a case kind.
    pub fn table_mut(&mut self, kind: CaseKind) -> &mut CaseTable {
        match kind {
            CaseKind::Confirmed => &mut self.confirmed,
            CaseKind::Deaths => &mut self.deaths,
            CaseKind::Recovered => &mut self.recovered,
        }
    }
}
