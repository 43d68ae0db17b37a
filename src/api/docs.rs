//! OpenAPI document for the data endpoints.

use utoipa::OpenApi;

use super::handlers;
use crate::data::model::{Stamp, Totals};
use crate::data::{CountryStats, TimePoint};
use crate::error::ErrorBody;

/// OpenAPI description served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "COVID-19 case API",
        description = "Read-only views over the JHU CSSE COVID-19 time series"
    ),
    paths(
        handlers::health,
        handlers::current,
        handlers::current_list,
        handlers::total,
        handlers::confirmed,
        handlers::deaths,
        handlers::recovered,
        handlers::countries,
        handlers::country,
        handlers::timeseries,
    ),
    components(schemas(
        CountryStats,
        TimePoint,
        Stamp,
        Totals,
        ErrorBody,
        handlers::HealthResponse
    )),
    tags(
        (name = "cases", description = "Case data, rebuilt on every request"),
        (name = "operations", description = "Service health")
    )
)]
pub struct ApiDoc;
