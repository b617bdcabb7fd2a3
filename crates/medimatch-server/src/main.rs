mod api;
mod middleware;

use std::{net::SocketAddr, sync::Arc};

use medimatch_core::ProviderKind;
use medimatch_db::PgProviderDirectory;
use medimatch_geo::LocationResolver;
use medimatch_proximity::{EngineSettings, ProximityEngine, SpecialtyMapper};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, SearchLimits},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(medimatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = medimatch_db::connect_pool_from_config(&config).await?;
    let applied = medimatch_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let settings = EngineSettings::from_config(&config);
    let engine = |kind| {
        ProximityEngine::new(
            Arc::new(PgProviderDirectory::new(pool.clone(), kind)),
            settings.clone(),
        )
    };
    let state = AppState {
        hospitals: engine(ProviderKind::Hospital),
        doctors: engine(ProviderKind::Doctor),
        resolver: Arc::new(LocationResolver::from_config(&config)?),
        mapper: Arc::new(SpecialtyMapper::from_config(&config)?),
        limits: SearchLimits::from_config(&config),
        pool: Some(pool.clone()),
    };
    let app = build_app(state, RateLimitState::per_minute(config.rate_limit_per_minute));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        env = %config.env,
        specialty_policy = %config.specialty_policy,
        "medimatch-server listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
