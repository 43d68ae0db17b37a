//! HTTP API handlers.
//!
//! Every data handler loads a fresh [`CaseModel`] from the source and derives
//! its payload from it; nothing is kept between requests.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::country::{CountryLookup, IsoCountryLookup};
use crate::data::model::{
    AffectedCountries, CaseSeries, CountryReport, CurrentStatus, CurrentStatusList,
    MetricByCountry, Totals,
};
use crate::data::{CaseKind, CaseModel, CaseSource};
use crate::error::{ApiError, ErrorBody, NOT_FOUND_DETAIL};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Provider of the raw case tables.
    pub source: Arc<CaseSource>,
    /// Country-code resolution.
    pub lookup: Arc<dyn CountryLookup>,
    /// Prometheus handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state with the built-in ISO lookup and no metrics.
    pub fn new(source: CaseSource) -> Self {
        Self {
            source: Arc::new(source),
            lookup: Arc::new(IsoCountryLookup),
            metrics: None,
        }
    }

    /// Replace the country lookup.
    pub fn with_lookup(mut self, lookup: impl CountryLookup + 'static) -> Self {
        self.lookup = Arc::new(lookup);
        self
    }

    /// Serve `/metrics` from this handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build a fresh model for the current request.
    async fn load_model(&self) -> Result<CaseModel, ApiError> {
        let model = self.source.load_model().await?;
        debug!(dt = %model.datetime_raw(), "Loaded snapshot for request");
        Ok(model)
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("source", &self.source.describe())
            .field("lookup", &self.lookup)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: String,
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "operations",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Prometheus exposition; 404 when metrics are disabled.
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                detail: NOT_FOUND_DETAIL.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Latest statistics keyed by country.
#[utoipa::path(
    get,
    path = "/current",
    tag = "cases",
    responses(
        (status = 200, description = "Country name to {confirmed, deaths, recovered}, plus dt and ts"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn current(State(state): State<AppState>) -> Result<Json<CurrentStatus>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.current_status()))
}

/// Latest statistics as a list of single-country objects.
#[utoipa::path(
    get,
    path = "/current_list",
    tag = "cases",
    responses(
        (status = 200, description = "{countries: [{name: stats}], dt, ts}"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn current_list(
    State(state): State<AppState>,
) -> Result<Json<CurrentStatusList>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.current_status_list()))
}

/// Totals across all countries.
#[utoipa::path(
    get,
    path = "/total",
    tag = "cases",
    responses(
        (status = 200, description = "Global totals", body = Totals),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn total(State(state): State<AppState>) -> Result<Json<Totals>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.total()))
}

/// Confirmed cases per country.
#[utoipa::path(
    get,
    path = "/confirmed",
    tag = "cases",
    responses(
        (status = 200, description = "Country name to confirmed count, plus dt and ts"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn confirmed(State(state): State<AppState>) -> Result<Json<MetricByCountry>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.confirmed_cases()))
}

/// Deaths per country.
#[utoipa::path(
    get,
    path = "/deaths",
    tag = "cases",
    responses(
        (status = 200, description = "Country name to death count, plus dt and ts"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn deaths(State(state): State<AppState>) -> Result<Json<MetricByCountry>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.deaths()))
}

/// Recovered cases per country.
#[utoipa::path(
    get,
    path = "/recovered",
    tag = "cases",
    responses(
        (status = 200, description = "Country name to recovered count, plus dt and ts"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn recovered(State(state): State<AppState>) -> Result<Json<MetricByCountry>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.recovered()))
}

/// Index to name for every country in the data.
#[utoipa::path(
    get,
    path = "/countries",
    tag = "cases",
    responses(
        (status = 200, description = "0-based index to country name, plus dt and ts"),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn countries(
    State(state): State<AppState>,
) -> Result<Json<AffectedCountries>, ApiError> {
    let model = state.load_model().await?;
    Ok(Json(model.affected_countries()))
}

/// Statistics for countries matching a name or ISO alpha-2 code.
#[utoipa::path(
    get,
    path = "/country/{name}",
    tag = "cases",
    params(("name" = String, Path, description = "Country name, or ISO alpha-2 code other than us/uk")),
    responses(
        (status = 200, description = "Matched countries, plus dt and ts"),
        (status = 404, description = "Unknown code or no matching country", body = ErrorBody),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CountryReport>, ApiError> {
    let model = state.load_model().await?;
    let report = model.snapshot().find_country(&name, state.lookup.as_ref())?;
    debug!(matched = report.countries.len(), "Country matched");
    Ok(Json(report))
}

/// Global cumulative series for one case kind.
#[utoipa::path(
    get,
    path = "/timeseries/{case}",
    tag = "cases",
    params(("case" = String, Path, description = "confirmed, deaths, or recovered (any case)")),
    responses(
        (status = 200, description = "{<case>: [{date, count}], dt, ts}"),
        (status = 404, description = "Unknown case kind", body = ErrorBody),
        (status = 500, description = "Data source failed", body = ErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn timeseries(
    State(state): State<AppState>,
    Path(case): Path<String>,
) -> Result<Json<CaseSeries>, ApiError> {
    let model = state.load_model().await?;
    let kind = CaseKind::from_str(&case).map_err(|_| ApiError::UnknownCase(case.clone()))?;
    Ok(Json(model.time_series().case(kind)))
}
