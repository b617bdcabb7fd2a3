//! End-to-end matching over the sample provider directory in `config/`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use medimatch_core::{load_provider_seed, Coordinate, LocationSource, ProviderKind};
use medimatch_geo::{LocationInput, LocationResolver};
use medimatch_proximity::{
    EngineSettings, InMemoryDirectory, NearbyResponse, ProximityEngine, SearchTier,
    SpecialtyMapper,
};

fn engine_for(kind: ProviderKind) -> ProximityEngine {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("providers.yaml");
    let seed = load_provider_seed(&path).expect("sample seed should load");
    let entries = match kind {
        ProviderKind::Hospital => &seed.hospitals,
        ProviderKind::Doctor => &seed.doctors,
    };
    let directory = InMemoryDirectory::from_seed(kind, entries);
    ProximityEngine::new(Arc::new(directory), EngineSettings::default())
}

fn resolver() -> LocationResolver {
    LocationResolver::new(Duration::from_secs(1))
}

#[tokio::test]
async fn loopback_caller_gets_bengaluru_hospitals() {
    let location = resolver()
        .resolve(&LocationInput::from_ip("127.0.0.1"))
        .await;
    assert_eq!(location.source, LocationSource::DefaultFallback);

    let engine = engine_for(ProviderKind::Hospital);
    let outcome = engine
        .find_nearby(&location, 10.0, &Default::default(), 10)
        .await
        .expect("valid input");

    let ids: Vec<&str> = outcome
        .results
        .iter()
        .map(|r| r.provider.id.as_str())
        .collect();
    // hosp-blr-001 is ~11 km out and falls outside the radius.
    assert_eq!(ids, vec!["hosp-blr-002", "hosp-blr-004", "hosp-blr-003"]);
    assert!(outcome.results[1].distance_is_estimated);
    assert!((outcome.results[1].distance_km - 5.0).abs() < f64::EPSILON);
    assert_eq!(outcome.search_method, SearchTier::CoordinateScan);

    let response = NearbyResponse::new(ProviderKind::Hospital, &outcome, &location, 10.0);
    let json = serde_json::to_value(&response).expect("serializable");
    assert_eq!(json["count"], 3);
    assert_eq!(json["hospitals"][1]["address"], "14 Residency Rd");
    assert_eq!(json["userLocation"]["city"], "Bengaluru");
    assert_eq!(json["userLocation"]["source"], "default-fallback");
}

#[tokio::test]
async fn condition_maps_to_matching_doctor() {
    let location = resolver().resolve(&LocationInput::default()).await;
    let specialties = SpecialtyMapper::builtin().map_conditions(&["Type 2 diabetes"]);

    let outcome = engine_for(ProviderKind::Doctor)
        .find_nearby(&location, 10.0, &specialties, 5)
        .await
        .expect("valid input");

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].provider.id, "doc-blr-001");
    assert!(!outcome.specialty_filter_relaxed);
}

#[tokio::test]
async fn unavailable_specialty_degrades_to_nearby_doctors() {
    let location = resolver().resolve(&LocationInput::default()).await;
    let specialties = SpecialtyMapper::builtin().map_conditions(&["tuberculosis"]);
    assert!(specialties.contains("Pulmonology"));

    let outcome = engine_for(ProviderKind::Doctor)
        .find_nearby(&location, 10.0, &specialties, 5)
        .await
        .expect("valid input");

    let ids: Vec<&str> = outcome
        .results
        .iter()
        .map(|r| r.provider.id.as_str())
        .collect();
    assert_eq!(ids, vec!["doc-blr-001", "doc-blr-003"]);
    assert!(outcome.specialty_filter_relaxed);
    assert_eq!(outcome.search_method, SearchTier::CoordinateScan);
}

#[tokio::test]
async fn explicit_coordinates_in_chennai_use_coordinate_scan_only() {
    let at = Coordinate::new(13.0827, 80.2707).expect("valid");
    let location = resolver()
        .resolve(&LocationInput::from_coordinates(at))
        .await;

    let outcome = engine_for(ProviderKind::Hospital)
        .find_nearby(&location, 5.0, &Default::default(), 5)
        .await
        .expect("valid input");

    assert_eq!(outcome.tiers_attempted, vec![SearchTier::CoordinateScan]);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].provider.id, "hosp-che-001");
    assert!(!outcome.results[0].distance_is_estimated);
}

#[tokio::test]
async fn every_result_respects_radius_and_order() {
    let location = resolver().resolve(&LocationInput::default()).await;
    for kind in [ProviderKind::Hospital, ProviderKind::Doctor] {
        for radius in [1.0, 5.0, 7.5, 30.0, 500.0] {
            let outcome = engine_for(kind)
                .find_nearby(&location, radius, &Default::default(), 50)
                .await
                .expect("valid input");
            let mut seen = std::collections::HashSet::new();
            for pair in outcome.results.windows(2) {
                assert!(pair[0].distance_km <= pair[1].distance_km);
            }
            for result in &outcome.results {
                assert!(result.distance_km <= radius, "{kind} radius {radius}");
                assert!(seen.insert(result.provider.id.clone()), "duplicate id");
            }
        }
    }
}
