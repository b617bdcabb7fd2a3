use std::path::Path;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use medimatch_core::{load_provider_seed, ProviderSeed};
use medimatch_proximity::{EngineSettings, InMemoryDirectory};
use tower::ServiceExt;

use super::*;

fn sample_state() -> AppState {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("providers.yaml");
    let seed = load_provider_seed(&path).expect("sample seed should load");
    let engine = |kind: ProviderKind, entries: &[ProviderSeed]| {
        ProximityEngine::new(
            Arc::new(InMemoryDirectory::from_seed(kind, entries)),
            EngineSettings::default(),
        )
    };

    AppState {
        hospitals: engine(ProviderKind::Hospital, &seed.hospitals),
        doctors: engine(ProviderKind::Doctor, &seed.doctors),
        resolver: Arc::new(LocationResolver::new(Duration::from_secs(1))),
        mapper: Arc::new(SpecialtyMapper::builtin()),
        limits: SearchLimits {
            default_radius_km: 10.0,
            default_limit: 10,
            max_limit: 50,
        },
        pool: None,
    }
}

fn app() -> Router {
    build_app(sample_state(), RateLimitState::per_minute(120))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn ids(list: &serde_json::Value) -> Vec<&str> {
    list.as_array()
        .expect("provider array")
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok_without_database() {
    let (status, json) = get_json(app(), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "not_configured");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_is_propagated() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}

#[tokio::test]
async fn hospitals_nearby_without_location_uses_default_city() {
    let (status, json) = get_json(app(), "/api/v1/hospitals/nearby").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(
        ids(&data["hospitals"]),
        vec!["hosp-blr-002", "hosp-blr-004", "hosp-blr-003"]
    );
    assert_eq!(data["count"], 3);
    assert_eq!(data["searchRadius"], 10.0);
    assert_eq!(data["searchMethod"], "coordinate-scan");
    assert_eq!(data["userLocation"]["source"], "default-fallback");
    assert_eq!(data["hospitals"][1]["distanceIsEstimated"], true);
}

#[tokio::test]
async fn private_forwarded_ip_falls_back_to_default() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/doctors/nearby?limit=1")
                .header("x-forwarded-for", "10.1.2.3, 203.0.113.9")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["userLocation"]["source"], "default-fallback");
    assert_eq!(json["data"]["count"], 1);
}

#[tokio::test]
async fn explicit_coordinates_search_around_them() {
    let (status, json) = get_json(
        app(),
        "/api/v1/hospitals/nearby?lat=13.0827&lng=80.2707&radius=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json["data"]["hospitals"]), vec!["hosp-che-001"]);
    assert_eq!(json["data"]["userLocation"]["source"], "explicit");
}

#[tokio::test]
async fn doctors_nearby_maps_condition_text() {
    let (status, json) = get_json(
        app(),
        "/api/v1/doctors/nearby?specialization=Type%202%20diabetes&limit=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json["data"]["doctors"]), vec!["doc-blr-001"]);
    assert_eq!(json["data"]["specialtyFilterRelaxed"], false);
    assert!(json["data"].get("hospitals").is_none());
}

#[tokio::test]
async fn invalid_input_returns_validation_error() {
    for uri in [
        "/api/v1/hospitals/nearby?lat=12.9",
        "/api/v1/hospitals/nearby?lat=abc&lng=77.5",
        "/api/v1/hospitals/nearby?lat=95&lng=77.5",
        "/api/v1/doctors/nearby?radius=-1",
        "/api/v1/doctors/nearby?limit=0",
    ] {
        let (status, json) = get_json(app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"]["code"], "validation_error", "{uri}");
    }
}

#[tokio::test]
async fn providers_nearby_combines_both_kinds() {
    let (status, json) = get_json(app(), "/api/v1/providers/nearby?limit=2").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    let hospitals = data["hospitals"].as_array().expect("hospitals").len();
    let doctors = data["doctors"].as_array().expect("doctors").len();
    assert!(hospitals <= 2 && doctors <= 2);
    assert_eq!(data["count"], hospitals + doctors);
    assert!(data["searchMethod"].is_string());
    assert!(data["doctorSearchMethod"].is_string());
}

#[tokio::test]
async fn specialties_map_exposes_dictionary() {
    let (status, json) = get_json(
        app(),
        "/api/v1/specialties/map?conditions=skin%20rash,asthma",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"]["specialties"],
        serde_json::json!(["Dermatology", "Pulmonology"])
    );
    assert_eq!(
        json["data"]["conditions"],
        serde_json::json!(["skin rash", "asthma"])
    );
    assert_eq!(
        json["data"]["dictionaryVersion"],
        medimatch_proximity::DICTIONARY_VERSION
    );
}

#[tokio::test]
async fn rate_limit_rejects_after_budget() {
    let app = build_app(sample_state(), RateLimitState::per_minute(1));

    let (first, _) = get_json(app.clone(), "/api/v1/specialties/map?conditions=fever").await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = get_json(app, "/api/v1/specialties/map?conditions=fever").await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
