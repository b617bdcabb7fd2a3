//! Integration tests for `IpApiClient` and the resolver using wiremock HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use medimatch_core::LocationSource;
use medimatch_geo::{GeoError, IpApiClient, LocationInput, LocationResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_retries: u32) -> IpApiClient {
    IpApiClient::with_base_url("medimatch-test", Duration::from_secs(5), max_retries, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn lookup_returns_parsed_location() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "success",
        "country": "India",
        "regionName": "Karnataka",
        "city": "Mysuru",
        "lat": 12.2958,
        "lon": 76.6394,
        "query": "49.37.1.10"
    });

    Mock::given(method("GET"))
        .and(path("/json/49.37.1.10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let lookup = client
        .lookup_ip("49.37.1.10".parse().unwrap())
        .await
        .expect("should parse lookup");

    assert!((lookup.latitude - 12.2958).abs() < 1e-9);
    assert!((lookup.longitude - 76.6394).abs() < 1e-9);
    assert_eq!(lookup.city.as_deref(), Some("Mysuru"));
    assert_eq!(lookup.region.as_deref(), Some("Karnataka"));
    assert_eq!(lookup.country.as_deref(), Some("India"));
}

#[tokio::test]
async fn fail_status_is_a_lookup_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "reserved range",
            "query": "8.8.8.8"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client
        .lookup_ip("8.8.8.8".parse().unwrap())
        .await
        .expect_err("fail status should error");

    assert!(matches!(err, GeoError::Lookup(ref m) if m == "reserved range"));
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client
        .lookup_ip("8.8.8.8".parse().unwrap())
        .await
        .expect_err("html body should not parse");

    assert!(matches!(err, GeoError::Deserialize { .. }));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let err = client
        .lookup_ip("1.1.1.1".parse().unwrap())
        .await
        .expect_err("503 should surface after retries");

    assert!(matches!(err, GeoError::Http(_)));
}

#[tokio::test]
async fn resolver_uses_http_lookup_for_public_ip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/49.37.1.10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "country": "India",
            "regionName": "Tamil Nadu",
            "city": "Chennai",
            "lat": 13.0827,
            "lon": 80.2707
        })))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Duration::from_secs(5))
        .with_geolocator(Arc::new(test_client(&server.uri(), 0)));
    let record = resolver
        .resolve(&LocationInput::from_ip("49.37.1.10"))
        .await;

    assert_eq!(record.source, LocationSource::IpGeolocation);
    assert_eq!(record.city.as_deref(), Some("Chennai"));
    assert_eq!(record.region.as_deref(), Some("Tamil Nadu"));
}

#[tokio::test]
async fn resolver_falls_back_when_lookup_is_slow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success", "lat": 1.0, "lon": 1.0}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Duration::from_millis(200))
        .with_geolocator(Arc::new(test_client(&server.uri(), 0)));
    let record = resolver.resolve(&LocationInput::from_ip("8.8.8.8")).await;

    assert_eq!(record.source, LocationSource::DefaultFallback);
}
