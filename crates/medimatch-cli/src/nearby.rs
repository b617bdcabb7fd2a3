//! `nearby`: resolve, map, rank and format from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use medimatch_core::{
    build_app_config, load_app_config, load_provider_seed, AppConfig, ConfigError, Coordinate,
    ProviderKind,
};
use medimatch_db::PgProviderDirectory;
use medimatch_geo::{LocationInput, LocationResolver};
use medimatch_proximity::{
    EngineSettings, InMemoryDirectory, NearbyResponse, ProviderDirectory, ProximityEngine,
    SpecialtyMapper,
};

#[derive(Debug, Args)]
pub(crate) struct NearbyArgs {
    /// `hospital` or `doctor`
    #[arg(long, default_value = "hospital")]
    pub kind: ProviderKind,
    /// Caller latitude; requires --lng
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Caller longitude; requires --lat
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// Caller IP address, used when no coordinates are given
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub ip: Option<String>,
    /// Search radius in kilometres (defaults to MEDIMATCH_DEFAULT_RADIUS_KM)
    #[arg(long)]
    pub radius: Option<f64>,
    /// Maximum results (defaults to MEDIMATCH_DEFAULT_LIMIT, capped at MEDIMATCH_MAX_LIMIT)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Condition, symptom or specialty text; repeatable
    #[arg(long = "condition")]
    pub conditions: Vec<String>,
    /// Search this YAML seed file in memory instead of the database
    #[arg(long)]
    pub seed_file: Option<PathBuf>,
}

/// Config for offline runs. The in-memory directory never reads
/// `DATABASE_URL`, so it may be absent.
fn offline_config() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| match std::env::var(key) {
        Err(_) if key == "DATABASE_URL" => Ok(String::new()),
        other => other,
    })
}

/// # Errors
///
/// Returns an error for invalid config, an unreadable seed file, an
/// unreachable database, or rejected search input.
pub(crate) async fn run_nearby(args: &NearbyArgs) -> anyhow::Result<()> {
    let (config, directory): (AppConfig, Arc<dyn ProviderDirectory>) = match &args.seed_file {
        Some(path) => {
            let config = offline_config()?;
            let seed = load_provider_seed(path)?;
            let entries = match args.kind {
                ProviderKind::Hospital => &seed.hospitals,
                ProviderKind::Doctor => &seed.doctors,
            };
            let snapshot = InMemoryDirectory::from_seed(args.kind, entries);
            tracing::info!(
                path = %path.display(),
                providers = snapshot.len(),
                "searching in-memory directory"
            );
            let directory: Arc<dyn ProviderDirectory> = Arc::new(snapshot);
            (config, directory)
        }
        None => {
            let config = load_app_config()?;
            let pool = medimatch_db::connect_pool_from_config(&config).await?;
            let directory: Arc<dyn ProviderDirectory> =
                Arc::new(PgProviderDirectory::new(pool, args.kind));
            (config, directory)
        }
    };

    let coordinates = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)?),
        _ => None,
    };
    let input = LocationInput {
        coordinates,
        ip_address: args.ip.clone(),
    };

    let resolver = LocationResolver::from_config(&config)?;
    let mapper = SpecialtyMapper::from_config(&config)?;
    let engine = ProximityEngine::new(directory, EngineSettings::from_config(&config));

    let radius = args.radius.unwrap_or(config.default_radius_km);
    let limit = args
        .limit
        .unwrap_or(config.default_limit)
        .min(config.max_limit);
    let specialties = mapper.specialties_for_query(&args.conditions);

    let location = resolver.resolve_enriched(&input).await;
    let outcome = engine
        .find_nearby(&location, radius, &specialties, limit)
        .await?;
    tracing::debug!(
        tiers = ?outcome.tiers_attempted,
        relaxed = outcome.specialty_filter_relaxed,
        "search complete"
    );

    let response = NearbyResponse::new(args.kind, &outcome, &location, radius);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
