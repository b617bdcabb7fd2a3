//! Integration tests for `NominatimClient` and the geocode cache using wiremock.

use std::sync::Arc;
use std::time::Duration;

use medimatch_core::{Coordinate, LocationRecord, LocationSource};
use medimatch_geo::{
    CachedReverseGeocoder, GeoError, GeocodeCache, LocationResolver, NominatimClient,
    ReverseGeocoder,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> NominatimClient {
    NominatimClient::with_base_url("medimatch-test", Duration::from_secs(5), 0, base_url)
        .expect("client construction should not fail")
}

fn chennai() -> Coordinate {
    Coordinate::new(13.0827, 80.2707).expect("valid coordinate")
}

fn chennai_body() -> serde_json::Value {
    serde_json::json!({
        "place_id": 1234,
        "display_name": "Chennai, Tamil Nadu, India",
        "address": {
            "city": "Chennai",
            "state": "Tamil Nadu",
            "country": "India",
            "country_code": "in"
        }
    })
}

#[tokio::test]
async fn reverse_geocode_returns_place() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("lat", "13.0827"))
        .and(query_param("lon", "80.2707"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chennai_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let place = client
        .reverse_geocode(chennai())
        .await
        .expect("should parse place");

    assert_eq!(place.city.as_deref(), Some("Chennai"));
    assert_eq!(place.region.as_deref(), Some("Tamil Nadu"));
    assert_eq!(place.country.as_deref(), Some("India"));
}

#[tokio::test]
async fn error_payload_is_a_lookup_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"error": "Unable to geocode"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .reverse_geocode(Coordinate::new(0.0, -30.0).unwrap())
        .await
        .expect_err("ocean point should not geocode");

    assert!(matches!(err, GeoError::Lookup(_)));
}

#[tokio::test]
async fn cached_client_hits_server_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chennai_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = GeocodeCache::new(16, Duration::from_secs(60));
    let geocoder = CachedReverseGeocoder::new(test_client(&server.uri()), cache.clone());

    let first = geocoder.reverse(chennai()).await.expect("first lookup");
    let second = geocoder.reverse(chennai()).await.expect("cached lookup");

    assert_eq!(first, second);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn resolver_enrich_marks_reverse_geocode_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chennai_body()))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Duration::from_secs(5))
        .with_reverse_geocoder(Arc::new(test_client(&server.uri())));
    let record = LocationRecord::from_coordinates(chennai(), LocationSource::Explicit);

    let enriched = resolver.enrich(record).await;

    assert_eq!(enriched.source, LocationSource::ReverseGeocode);
    assert_eq!(enriched.city.as_deref(), Some("Chennai"));
    assert_eq!(enriched.coordinates, chennai());
}

#[tokio::test]
async fn resolver_enrich_survives_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Duration::from_secs(5))
        .with_reverse_geocoder(Arc::new(test_client(&server.uri())));
    let record = LocationRecord::from_coordinates(chennai(), LocationSource::Explicit);

    let enriched = resolver.enrich(record.clone()).await;

    assert_eq!(enriched, record);
}
