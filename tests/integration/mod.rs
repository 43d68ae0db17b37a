//! Integration tests for the case-data API.
//!
//! These drive the full router over the CSV fixtures in `tests/fixtures`
//! through the directory source, so every request re-reads the files.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use covid19_api::api::{create_router, AppState};
use covid19_api::country::CountryLookup;
use covid19_api::data::{CaseKind, CaseSource, DirectorySource};
use covid19_api::error::LookupError;

const DT: &str = "1/25/20";
const TS: i64 = 1_579_910_400;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app() -> Router {
    let source = CaseSource::Directory(DirectorySource::new(fixtures_dir()));
    create_router(AppState::new(source), true)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn assert_stamped(body: &Value) {
    assert_eq!(body["dt"], json!(DT));
    assert_eq!(body["ts"], json!(TS));
}

#[tokio::test]
async fn current_aggregates_provinces() {
    let (status, body) = get(app(), "/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_stamped(&body);
    assert_eq!(
        body["Australia"],
        json!({ "confirmed": 5, "deaths": 1, "recovered": 2 })
    );
    assert_eq!(
        body["Canada"],
        json!({ "confirmed": 4, "deaths": 0, "recovered": 0 })
    );
    // 9 countries plus dt and ts
    assert_eq!(body.as_object().unwrap().len(), 11);
}

#[tokio::test]
async fn current_list_matches_current() {
    let (_, mapping) = get(app(), "/current").await;
    let (status, list) = get(app(), "/current_list").await;
    assert_eq!(status, StatusCode::OK);
    assert_stamped(&list);

    let entries = list["countries"].as_array().unwrap();
    assert_eq!(entries.len(), 9);
    for entry in entries {
        let (country, stats) = entry.as_object().unwrap().iter().next().unwrap();
        assert_eq!(&mapping[country], stats, "{country}");
    }
}

#[tokio::test]
async fn total_sums_all_countries() {
    let (status, body) = get(app(), "/total").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "confirmed": 31, "deaths": 3, "recovered": 11, "dt": DT, "ts": TS })
    );
}

#[tokio::test]
async fn metric_endpoints_restrict_to_one_value() {
    for (uri, country, expected) in [
        ("/confirmed", "Germany", 8),
        ("/deaths", "US", 1),
        ("/recovered", "Afghanistan", 1),
    ] {
        let (status, body) = get(app(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body[country], json!(expected), "{uri}");
        assert_stamped(&body);
    }
}

#[tokio::test]
async fn countries_are_indexed() {
    let (status, body) = get(app(), "/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["0"], json!("Afghanistan"));
    assert_eq!(body["4"], json!("Korea, South"));
    assert_eq!(body["8"], json!("United Kingdom"));
    assert!(body.get("9").is_none());
    assert_stamped(&body);
}

#[tokio::test]
async fn every_country_is_found_by_name_in_any_case() {
    let (_, listing) = get(app(), "/countries").await;
    let names: Vec<String> = listing
        .as_object()
        .unwrap()
        .iter()
        .filter(|(k, _)| k.parse::<usize>().is_ok())
        .map(|(_, v)| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 9);

    for name in names {
        let uri = format!("/country/{}", name.to_uppercase().replace(' ', "%20"));
        let (status, body) = get(app(), &uri).await;
        assert_eq!(status, StatusCode::OK, "{name}");
        assert!(body.get(&name).is_some(), "{name}");
        assert_stamped(&body);
    }
}

#[tokio::test]
async fn reserved_names_use_exact_match() {
    let (status, body) = get(app(), "/country/us").await;
    assert_eq!(status, StatusCode::OK);
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert!(object.contains_key("US"));

    // "uk" is not resolved to the United Kingdom
    let (status, body) = get(app(), "/country/uk").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Item not found" }));
}

#[tokio::test]
async fn iso_codes_match_resolved_name_as_substring() {
    let (status, body) = get(app(), "/country/SD").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("Sudan").is_some());
    assert!(body.get("South Sudan").is_some());

    let (status, body) = get(app(), "/country/gb").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("United Kingdom").is_some());
}

#[tokio::test]
async fn unknown_or_unmatched_codes_are_not_found() {
    for uri in ["/country/XX", "/country/KR", "/country/Atlantis"] {
        let (status, body) = get(app(), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "detail": "Item not found" }), "{uri}");
    }
}

/// Lookup that always fails, standing in for an unavailable resolver.
#[derive(Debug)]
struct UnavailableLookup;

impl CountryLookup for UnavailableLookup {
    fn lookup(&self, code: &str) -> Result<String, LookupError> {
        Err(LookupError::UnknownCode(code.to_string()))
    }
}

#[tokio::test]
async fn lookup_failure_is_reported_as_not_found() {
    let source = CaseSource::Directory(DirectorySource::new(fixtures_dir()));
    let state = AppState::new(source).with_lookup(UnavailableLookup);

    let (status, _) = get(create_router(state.clone(), true), "/country/de").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // full names never reach the lookup
    let (status, _) = get(create_router(state, true), "/country/germany").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn timeseries_returns_only_requested_case() {
    for case in ["confirmed", "Deaths", "RECOVERED"] {
        let (status, body) = get(app(), &format!("/timeseries/{case}")).await;
        assert_eq!(status, StatusCode::OK, "{case}");

        let key = case.to_lowercase();
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 3, "{case}");
        assert_eq!(body[&key].as_array().unwrap().len(), 4, "{case}");
        assert_stamped(&body);
    }

    let (_, body) = get(app(), "/timeseries/confirmed").await;
    let counts: Vec<u64> = body["confirmed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![3, 12, 20, 31]);
}

#[tokio::test]
async fn timeseries_unknown_case_is_not_found() {
    for case in ["active", "confirmed_", "death"] {
        let (status, body) = get(app(), &format!("/timeseries/{case}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{case}");
        assert_eq!(body, json!({ "detail": "Item not found" }));
    }
}

#[tokio::test]
async fn missing_data_directory_is_a_server_error() {
    let source = CaseSource::Directory(DirectorySource::new(fixtures_dir().join("missing")));
    let app = create_router(AppState::new(source), true);

    let (status, body) = get(app.clone(), "/current").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Internal server error" }));

    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn every_request_rereads_the_source_files() {
    let dir = tempfile::tempdir().unwrap();
    for kind in CaseKind::all() {
        std::fs::copy(
            fixtures_dir().join(kind.file_name()),
            dir.path().join(kind.file_name()),
        )
        .unwrap();
    }
    let source = CaseSource::Directory(DirectorySource::new(dir.path()));
    let app = create_router(AppState::new(source), true);

    let (status, body) = get(app.clone(), "/total").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], json!(31));

    let confirmed = dir.path().join(CaseKind::Confirmed.file_name());
    let original = std::fs::read_to_string(&confirmed).unwrap();
    let edited = original.replace(
        ",Afghanistan,33.93911,67.709953,0,0,1,2",
        ",Afghanistan,33.93911,67.709953,0,0,1,12",
    );
    assert_ne!(original, edited);
    std::fs::write(&confirmed, edited).unwrap();

    let (status, body) = get(app.clone(), "/total").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed"], json!(41));

    let (_, body) = get(app, "/country/afghanistan").await;
    assert_eq!(body["Afghanistan"]["confirmed"], json!(12));
}
