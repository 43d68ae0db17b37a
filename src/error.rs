//! Unified error types for the case-data API.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::metrics;

/// Unified error type for the service binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration is present but invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data provider error.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fetching or decoding the raw case tables.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote responded with a non-success status.
    #[error("fetching {url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Base URL could not be joined with a file name.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// File contents could not be parsed.
    #[error("failed to parse {file}: {source}")]
    Parse {
        /// File name being parsed.
        file: String,
        /// Parse failure.
        source: ParseError,
    },

    /// Failure injected by a static source.
    #[error("injected failure: {0}")]
    Injected(String),
}

/// CSV time-series parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A required header column is absent.
    #[error("missing column {0}")]
    MissingColumn(&'static str),

    /// Header carries no date columns.
    #[error("no date columns in header")]
    NoDateColumns,

    /// A date header could not be parsed.
    #[error("invalid date header {0:?}")]
    InvalidDate(String),

    /// Summed counts do not fit in a `u64`.
    #[error("count overflow for {country} on {date}")]
    Overflow { country: String, date: String },
}

/// Country-code resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The code is not an assigned ISO 3166-1 alpha-2 code.
    #[error("unknown country code {0:?}")]
    UnknownCode(String),
}

/// Country matching errors for `/country/{name}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The two-letter code could not be resolved.
    #[error("lookup failed: {0}")]
    LookupFailed(#[from] LookupError),

    /// No country in the snapshot matched.
    #[error("no country matches {0:?}")]
    NoMatch(String),
}

impl MatchError {
    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            MatchError::LookupFailed(_) => "lookup_failed",
            MatchError::NoMatch(_) => "no_match",
        }
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested case kind is not tracked.
    #[error("unknown case kind {0:?}")]
    UnknownCase(String),

    /// Country resolution or matching failed.
    #[error(transparent)]
    Country(#[from] MatchError),

    /// Data provider failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ApiError {
    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::UnknownCase(_) => "unknown_case",
            ApiError::Country(e) => e.reason(),
            ApiError::Source(_) => "source",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownCase(_) | ApiError::Country(_) => StatusCode::NOT_FOUND,
            ApiError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Generic description; never carries the underlying cause.
    pub detail: String,
}

/// Body of every not-found response.
pub const NOT_FOUND_DETAIL: &str = "Item not found";

/// Body of every data-provider failure.
pub const INTERNAL_DETAIL: &str = "Internal server error";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status == StatusCode::NOT_FOUND {
            warn!(reason = self.reason(), error = %self, "Item not found");
            metrics::inc_not_found(self.reason());
            NOT_FOUND_DETAIL
        } else {
            error!(error = %self, "Data source failed");
            metrics::inc_source_failures();
            INTERNAL_DETAIL
        };

        (
            status,
            Json(ErrorBody {
                detail: detail.to_string(),
            }),
        )
            .into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_map_to_404() {
        let err = ApiError::UnknownCase("active".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(MatchError::NoMatch("atlantis".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.reason(), "no_match");

        let err = ApiError::from(MatchError::from(LookupError::UnknownCode("XX".to_string())));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.reason(), "lookup_failed");
    }

    #[test]
    fn source_errors_map_to_500() {
        let err = ApiError::from(SourceError::Injected("boom".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.reason(), "source");
    }

    #[tokio::test]
    async fn error_body_is_generic() {
        let response = ApiError::UnknownCase("active".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "detail": "Item not found" }));
    }
}
