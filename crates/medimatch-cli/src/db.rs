//! Database maintenance commands.

use std::path::Path;

use medimatch_core::{load_app_config, load_provider_seed};

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns an error if config is invalid, the database is unreachable, or a
/// migration fails.
pub(crate) async fn run_migrate() -> anyhow::Result<()> {
    let config = load_app_config()?;
    let pool = medimatch_db::connect_pool_from_config(&config).await?;
    let applied = medimatch_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load `file` and upsert its providers.
///
/// The seed file is validated before any connection is opened.
///
/// # Errors
///
/// Returns an error if the seed file is invalid or any database write fails.
pub(crate) async fn run_seed(file: &Path) -> anyhow::Result<()> {
    let seed = load_provider_seed(file)?;
    let config = load_app_config()?;
    let pool = medimatch_db::connect_pool_from_config(&config).await?;

    let summary = medimatch_db::seed_providers(&pool, &seed).await?;
    println!(
        "seeded {} hospital(s) and {} doctor(s): {} new, {} updated",
        summary.hospitals, summary.doctors, summary.inserted, summary.updated
    );
    Ok(())
}
