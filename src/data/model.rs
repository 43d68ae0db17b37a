//! Per-request case model.
//!
//! A [`CaseModel`] is built from a freshly fetched [`RawDataset`] at the start
//! of every request and dropped once the response is serialized. Every view it
//! hands out carries the capture stamp (`dt`, `ts`) of the latest date column.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::parser::date_header_timestamp;
use super::types::{CaseKind, CountryStats, RawDataset, TimePoint};
use crate::country::{match_countries, CountryLookup};
use crate::error::{MatchError, ParseError};

/// Capture stamp attached to every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Stamp {
    /// Human-readable date of the latest data column.
    pub dt: String,
    /// Same date as epoch seconds (00:00 UTC).
    pub ts: i64,
}

/// `GET /current` payload: country name to statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStatus {
    /// Statistics per country.
    #[serde(flatten)]
    pub countries: BTreeMap<String, CountryStats>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// `GET /current_list` payload: the same statistics as a sequence of
/// single-entry objects, in country-name order.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStatusList {
    /// One `{country: stats}` entry per country.
    pub countries: Vec<BTreeMap<String, CountryStats>>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// `GET /total` payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Totals {
    /// Totals across all countries.
    #[serde(flatten)]
    pub stats: CountryStats,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// `GET /confirmed|deaths|recovered` payload: a single metric per country.
#[derive(Debug, Clone, Serialize)]
pub struct MetricByCountry {
    /// Metric value per country.
    #[serde(flatten)]
    pub countries: BTreeMap<String, u64>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// `GET /countries` payload: 0-based index to country name.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedCountries {
    /// Index to name, in name order.
    #[serde(flatten)]
    pub countries: BTreeMap<usize, String>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// `GET /country/{name}` payload: the matched subset of [`CurrentStatus`].
#[derive(Debug, Clone, Serialize)]
pub struct CountryReport {
    /// Matched countries.
    #[serde(flatten)]
    pub countries: BTreeMap<String, CountryStats>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// Global cumulative series for every case kind.
#[derive(Debug, Clone)]
pub struct TimeSeriesSnapshot {
    series: BTreeMap<CaseKind, Vec<TimePoint>>,
    stamp: Stamp,
}

/// `GET /timeseries/{case}` payload: `{<case>: [...], dt, ts}`.
#[derive(Debug, Clone, Serialize)]
pub struct CaseSeries {
    /// Exactly one entry keyed by the case name.
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<TimePoint>>,
    /// Capture stamp.
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl TimeSeriesSnapshot {
    /// Restrict the snapshot to one case kind.
    pub fn case(mut self, kind: CaseKind) -> CaseSeries {
        let points = self.series.remove(&kind).unwrap_or_default();
        CaseSeries {
            series: BTreeMap::from([(kind.to_string(), points)]),
            stamp: self.stamp,
        }
    }
}

/// Snapshot of the latest per-country statistics.
#[derive(Debug, Clone)]
pub struct CaseSnapshot {
    countries: BTreeMap<String, CountryStats>,
    stamp: Stamp,
}

impl CaseSnapshot {
    /// Resolve `name` against this snapshot; see [`match_countries`].
    pub fn find_country(
        self,
        name: &str,
        lookup: &dyn CountryLookup,
    ) -> Result<CountryReport, MatchError> {
        let countries = match_countries(&self.countries, name, lookup)?;
        Ok(CountryReport {
            countries,
            stamp: self.stamp,
        })
    }
}

/// Case data for a single request, built from the raw tables.
#[derive(Debug, Clone)]
pub struct CaseModel {
    raw: RawDataset,
    datetime_raw: String,
    timestamp: i64,
}

impl CaseModel {
    /// Build the model. The capture stamp comes from the latest date column
    /// of the confirmed table.
    #[instrument(skip(raw))]
    pub fn new(raw: RawDataset) -> Result<Self, ParseError> {
        let datetime_raw = raw
            .confirmed
            .latest_date()
            .ok_or(ParseError::NoDateColumns)?
            .to_string();
        let timestamp = date_header_timestamp(&datetime_raw)?;
        for kind in CaseKind::all() {
            raw.table(kind).check_totals()?;
        }

        debug!(
            dt = %datetime_raw,
            ts = timestamp,
            countries = raw.confirmed.series.len(),
            "Built case model"
        );

        Ok(Self {
            raw,
            datetime_raw,
            timestamp,
        })
    }

    /// Latest date column as it appears in the source.
    pub fn datetime_raw(&self) -> &str {
        &self.datetime_raw
    }

    /// Latest date column as epoch seconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Capture stamp.
    pub fn stamp(&self) -> Stamp {
        Stamp {
            dt: self.datetime_raw.clone(),
            ts: self.timestamp,
        }
    }

    /// Latest statistics for every country present in any table. A country
    /// missing from a table reports 0 for that metric.
    fn latest_by_country(&self) -> BTreeMap<String, CountryStats> {
        let mut countries: BTreeMap<String, CountryStats> = BTreeMap::new();
        for kind in CaseKind::all() {
            for (country, value) in self.raw.table(kind).latest() {
                countries
                    .entry(country.to_string())
                    .or_default()
                    .set(kind, value);
            }
        }
        countries
    }

    /// Snapshot of the latest per-country statistics.
    pub fn snapshot(&self) -> CaseSnapshot {
        CaseSnapshot {
            countries: self.latest_by_country(),
            stamp: self.stamp(),
        }
    }

    /// Current status keyed by country.
    pub fn current_status(&self) -> CurrentStatus {
        CurrentStatus {
            countries: self.latest_by_country(),
            stamp: self.stamp(),
        }
    }

    /// Current status as an ordered list.
    pub fn current_status_list(&self) -> CurrentStatusList {
        let countries = self
            .latest_by_country()
            .into_iter()
            .map(|(country, stats)| BTreeMap::from([(country, stats)]))
            .collect();
        CurrentStatusList {
            countries,
            stamp: self.stamp(),
        }
    }

    /// Totals across all countries.
    pub fn total(&self) -> Totals {
        let mut stats = CountryStats::default();
        for country in self.latest_by_country().values() {
            stats.accumulate(country);
        }
        Totals {
            stats,
            stamp: self.stamp(),
        }
    }

    /// A single metric per country.
    pub fn cases(&self, kind: CaseKind) -> MetricByCountry {
        let countries = self
            .latest_by_country()
            .into_iter()
            .map(|(country, stats)| (country, stats.get(kind)))
            .collect();
        MetricByCountry {
            countries,
            stamp: self.stamp(),
        }
    }

    /// Confirmed cases per country.
    pub fn confirmed_cases(&self) -> MetricByCountry {
        self.cases(CaseKind::Confirmed)
    }

    /// Deaths per country.
    pub fn deaths(&self) -> MetricByCountry {
        self.cases(CaseKind::Deaths)
    }

    /// Recovered cases per country.
    pub fn recovered(&self) -> MetricByCountry {
        self.cases(CaseKind::Recovered)
    }

    /// Every country present in the data, indexed in name order.
    pub fn affected_countries(&self) -> AffectedCountries {
        let countries = self
            .latest_by_country()
            .into_keys()
            .enumerate()
            .collect();
        AffectedCountries {
            countries,
            stamp: self.stamp(),
        }
    }

    /// Global cumulative series for every case kind.
    pub fn time_series(&self) -> TimeSeriesSnapshot {
        let series = CaseKind::all()
            .map(|kind| (kind, self.raw.table(kind).global_series()))
            .collect();
        TimeSeriesSnapshot {
            series,
            stamp: self.stamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::{sample_dataset, DatasetBuilder};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> CaseModel {
        CaseModel::new(sample_dataset()).unwrap()
    }

    #[test]
    fn stamp_comes_from_latest_confirmed_date() {
        let model = model();
        assert_eq!(model.datetime_raw(), "1/24/20");
        assert_eq!(model.timestamp(), 1_579_824_000);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = CaseModel::new(RawDataset::default()).unwrap_err();
        assert!(matches!(err, ParseError::NoDateColumns));
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let raw = DatasetBuilder::new(["1/22/20"])
            .series(CaseKind::Deaths, "A", &[u64::MAX])
            .series(CaseKind::Deaths, "B", &[1])
            .build();
        let err = CaseModel::new(raw).unwrap_err();
        assert!(matches!(err, ParseError::Overflow { ref date, .. } if date == "1/22/20"));
    }

    #[test]
    fn current_status_serializes_flat() {
        let value = serde_json::to_value(model().current_status()).unwrap();
        assert_eq!(
            value["Germany"],
            json!({ "confirmed": 16, "deaths": 1, "recovered": 12 })
        );
        assert_eq!(value["dt"], json!("1/24/20"));
        assert_eq!(value["ts"], json!(1_579_824_000));
    }

    #[test]
    fn list_and_mapping_carry_the_same_values() {
        let model = model();
        let mapping = model.current_status();
        let list = model.current_status_list();

        assert_eq!(list.countries.len(), mapping.countries.len());
        for entry in &list.countries {
            for (country, stats) in entry {
                assert_eq!(mapping.countries.get(country), Some(stats));
            }
        }
    }

    #[test]
    fn country_missing_from_a_table_reports_zero() {
        let status = model().current_status();
        assert_eq!(status.countries["Canada"].recovered, 0);
        assert_eq!(status.countries["Canada"].confirmed, 4);
    }

    #[test]
    fn totals_sum_every_country() {
        let model = model();
        let totals = model.total();
        let status = model.current_status();
        let confirmed: u64 = status.countries.values().map(|s| s.confirmed).sum();
        assert_eq!(totals.stats.confirmed, confirmed);

        let value = serde_json::to_value(&totals).unwrap();
        assert_eq!(value["confirmed"], json!(confirmed));
        assert_eq!(value["dt"], json!("1/24/20"));
    }

    #[test]
    fn metric_views_keep_one_value_per_country() {
        let deaths = model().deaths();
        assert_eq!(deaths.countries["Germany"], 1);
        assert_eq!(deaths.countries["US"], 3);

        let value = serde_json::to_value(model().confirmed_cases()).unwrap();
        assert_eq!(value["US"], json!(40));
    }

    #[test]
    fn affected_countries_are_indexed_in_name_order() {
        let value = serde_json::to_value(model().affected_countries()).unwrap();
        assert_eq!(value["0"], json!("Canada"));
        assert_eq!(value["1"], json!("Germany"));
        assert!(value.get("dt").is_some());
    }

    #[test]
    fn time_series_case_keeps_only_that_kind() {
        let series = model().time_series().case(CaseKind::Deaths);
        let value = serde_json::to_value(&series).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert!(object.contains_key("deaths"));
        assert_eq!(
            value["deaths"][2],
            json!({ "date": "1/24/20", "count": 4 })
        );
    }
}
