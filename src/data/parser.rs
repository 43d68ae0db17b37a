//! Parsing of the JHU CSSE global time-series CSV files.
//!
//! Layout: `Province/State,Country/Region,Lat,Long,<M/D/YY>...`, one row per
//! province (or per country when the province is empty). Rows are folded into
//! their country by summing the cumulative values column-wise.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use super::types::CaseTable;
use crate::error::ParseError;

/// Header of the column carrying the country name.
const COUNTRY_COLUMN: &str = "Country/Region";

/// Date format used by the source headers.
const DATE_FORMAT: &str = "%m/%d/%y";

static DATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2}$").expect("valid date header regex"));

/// Parse one time-series file.
#[instrument(skip(body), fields(bytes = body.len()))]
pub fn parse_case_table(body: &str) -> Result<CaseTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let country_idx = headers
        .iter()
        .position(|h| h == COUNTRY_COLUMN)
        .ok_or(ParseError::MissingColumn(COUNTRY_COLUMN))?;

    let date_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| DATE_HEADER.is_match(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    if date_columns.is_empty() {
        return Err(ParseError::NoDateColumns);
    }

    let mut table = CaseTable {
        dates: date_columns.iter().map(|(_, d)| d.clone()).collect(),
        ..Default::default()
    };

    let mut rows = 0usize;
    for record in reader.records() {
        let record = record?;
        let country = match record.get(country_idx) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };

        let series = table
            .series
            .entry(country.to_string())
            .or_insert_with(|| vec![0; date_columns.len()]);

        for (slot, (col, date)) in series.iter_mut().zip(&date_columns) {
            let count = parse_count(record.get(*col).unwrap_or(""));
            *slot = slot
                .checked_add(count)
                .ok_or_else(|| ParseError::Overflow {
                    country: country.to_string(),
                    date: date.clone(),
                })?;
        }
        rows += 1;
    }

    debug!(
        rows,
        countries = table.series.len(),
        dates = table.dates.len(),
        "Parsed case table"
    );

    Ok(table)
}

/// Parse a cumulative count cell. Empty, negative, or malformed cells count
/// as zero; fractional values are truncated.
pub fn parse_count(cell: &str) -> u64 {
    if let Ok(v) = cell.parse::<u64>() {
        return v;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

/// Convert a `M/D/YY` header to epoch seconds at 00:00 UTC.
pub fn date_header_timestamp(header: &str) -> Result<i64, ParseError> {
    let date = NaiveDate::parse_from_str(header, DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(header.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ParseError::InvalidDate(header.to_string()))?;
    Ok(midnight.and_utc().timestamp())
}
