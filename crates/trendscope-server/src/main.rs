mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trendscope_core::{AppConfig, Environment};
use trendscope_pipeline::{Orchestrator, OrchestratorConfig, PgJobStages};

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(trendscope_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, "server: starting");
    check_source_key(&config)?;

    let pool_config = trendscope_db::PoolConfig::from_app_config(&config);
    let pool = trendscope_db::connect_pool(&config.database_url, pool_config).await?;
    trendscope_db::run_migrations(&pool).await?;

    let stages = Arc::new(PgJobStages::new(pool.clone(), (*config).clone()));
    let orchestrator = Orchestrator::new(stages, OrchestratorConfig::from_app_config(&config));

    let _scheduler =
        scheduler::build_scheduler(orchestrator.clone(), config.refresh_cron.as_deref()).await?;

    let app = build_app(AppState {
        pool,
        orchestrator,
        config: Arc::clone(&config),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server: listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// A missing API key is fatal in production and a warning elsewhere.
fn check_source_key(config: &AppConfig) -> anyhow::Result<()> {
    if config.source_api_key.is_some() {
        return Ok(());
    }
    if matches!(config.env, Environment::Production) {
        anyhow::bail!("TIKHUB_API_KEY must be set when TRENDSCOPE_ENV=production");
    }
    tracing::warn!(
        env = %config.env,
        "TIKHUB_API_KEY is not set; refresh runs will fail at the collect stage"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
