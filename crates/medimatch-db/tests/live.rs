//! Live integration tests for medimatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/medimatch-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::collections::BTreeSet;

use medimatch_core::{ProviderKind, ProviderSeedFile};
use medimatch_db::{
    count_providers, health_check, seed_providers, upsert_providers, NewProvider,
    PgProviderDirectory,
};
use medimatch_proximity::ProviderDirectory;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Specialty shapes are mixed on purpose; they are normalized on write.
fn seed_file() -> ProviderSeedFile {
    let hospitals = serde_json::json!([
        {
            "external_id": "h-blr-1",
            "name": "Manipal Hospital",
            "city": "Bengaluru",
            "region": "Karnataka",
            "latitude": 12.9592,
            "longitude": 77.6974,
            "specialties": ["Cardiology", {"name": "Neurology"}],
            "phone": "+91 80 2502 4444"
        },
        {
            "external_id": "h-blr-2",
            "name": "Ward Clinic",
            "city": " bengaluru ",
            "region": "Karnataka",
            "specialties": "General Medicine, Pediatrics"
        },
        {
            "external_id": "h-mys-1",
            "name": "Mysuru General",
            "city": "Mysuru",
            "region": "Karnataka",
            "latitude": 12.2958,
            "longitude": 76.6394
        }
    ]);
    let doctors = serde_json::json!([
        {
            "external_id": "d-blr-1",
            "name": "Dr. Rao",
            "city": "Bengaluru",
            "region": "Karnataka",
            "latitude": 12.97,
            "specialties": [{"name": "Endocrinology"}]
        }
    ]);
    ProviderSeedFile {
        hospitals: serde_json::from_value(hospitals).expect("hospital seed"),
        doctors: serde_json::from_value(doctors).expect("doctor seed"),
    }
}

fn names(records: &[medimatch_core::ProviderRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.name.clone()).collect()
}

// ---------------------------------------------------------------------------
// Section 1: Seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_inserts_then_updates(pool: sqlx::PgPool) {
    let seed = seed_file();

    let first = seed_providers(&pool, &seed).await.expect("first seed");
    assert_eq!(first.hospitals, 3);
    assert_eq!(first.doctors, 1);
    assert_eq!(first.inserted, 4);
    assert_eq!(first.updated, 0);

    let second = seed_providers(&pool, &seed).await.expect("second seed");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 4);

    assert_eq!(
        count_providers(&pool, ProviderKind::Hospital).await.unwrap(),
        3
    );
    assert_eq!(count_providers(&pool, ProviderKind::Doctor).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn same_external_id_is_distinct_per_kind(pool: sqlx::PgPool) {
    let make = |kind| NewProvider {
        kind,
        external_id: "shared-1".to_string(),
        name: "Shared".to_string(),
        city: None,
        region: None,
        country: None,
        latitude: None,
        longitude: None,
        specialties: Vec::new(),
        raw_data: serde_json::json!({}),
    };

    let (inserted, updated) =
        upsert_providers(&pool, &[make(ProviderKind::Hospital), make(ProviderKind::Doctor)])
            .await
            .expect("upsert");
    assert_eq!((inserted, updated), (2, 0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds_on_live_pool(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health check");
}

// ---------------------------------------------------------------------------
// Section 2: Directory queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn city_query_ignores_case_and_whitespace(pool: sqlx::PgPool) {
    seed_providers(&pool, &seed_file()).await.expect("seed");
    let directory = PgProviderDirectory::new(pool, ProviderKind::Hospital);

    let found = directory.query_by_city("BENGALURU ").await.expect("query");
    assert_eq!(
        names(&found),
        BTreeSet::from(["Manipal Hospital".to_string(), "Ward Clinic".to_string()])
    );

    assert!(directory.query_by_city("  ").await.expect("blank").is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn region_query_is_scoped_to_kind(pool: sqlx::PgPool) {
    seed_providers(&pool, &seed_file()).await.expect("seed");
    let hospitals = PgProviderDirectory::new(pool.clone(), ProviderKind::Hospital);
    let doctors = PgProviderDirectory::new(pool, ProviderKind::Doctor);

    assert_eq!(hospitals.query_by_region("karnataka").await.unwrap().len(), 3);
    let found = doctors.query_by_region("Karnataka").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, ProviderKind::Doctor);
    assert!(found[0].specialties.contains("Endocrinology"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn coordinate_query_returns_only_located_rows(pool: sqlx::PgPool) {
    seed_providers(&pool, &seed_file()).await.expect("seed");
    let hospitals = PgProviderDirectory::new(pool.clone(), ProviderKind::Hospital);
    let doctors = PgProviderDirectory::new(pool, ProviderKind::Doctor);

    let located = hospitals.query_with_coordinates().await.unwrap();
    assert_eq!(
        names(&located),
        BTreeSet::from([
            "Manipal Hospital".to_string(),
            "Mysuru General".to_string()
        ])
    );
    assert!(located.iter().all(|r| r.coordinates.is_some()));

    // Dr. Rao has a latitude but no longitude.
    assert!(doctors.query_with_coordinates().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_by_id_round_trips_public_id(pool: sqlx::PgPool) {
    seed_providers(&pool, &seed_file()).await.expect("seed");
    let hospitals = PgProviderDirectory::new(pool.clone(), ProviderKind::Hospital);
    let doctors = PgProviderDirectory::new(pool, ProviderKind::Doctor);

    let manipal = hospitals
        .query_by_city("Bengaluru")
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "Manipal Hospital")
        .expect("seeded hospital");

    let found = hospitals.find_by_id(&manipal.id).await.unwrap();
    assert_eq!(found.as_ref().map(|r| r.name.as_str()), Some("Manipal Hospital"));
    assert_eq!(found.unwrap().raw["phone"], "+91 80 2502 4444");

    assert!(doctors.find_by_id(&manipal.id).await.unwrap().is_none());
    assert!(hospitals.find_by_id("not-a-uuid").await.unwrap().is_none());
}
