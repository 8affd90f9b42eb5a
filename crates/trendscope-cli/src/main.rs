mod collect;
mod stats;

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendscope_core::{AppConfig, SnapshotLimits};

#[derive(Debug, Parser)]
#[command(name = "trendscope-cli")]
#[command(about = "Trendscope ingestion and export command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Collect trending posts, tags, and comments into the store
    Collect {
        /// Number of collect sessions to run
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        sessions: u32,
        /// Minutes to wait between sessions
        #[arg(long, default_value_t = 30)]
        delay_minutes: u64,
    },
    /// Write the dashboard snapshot from the current store contents
    Export,
    /// Print store totals and the most used tags
    Stats {
        /// Number of tags to list
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("trendscope-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = trendscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = connect(&config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            trendscope_db::health_check(&pool).await?;
            println!("database reachable");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = trendscope_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::Collect {
            sessions,
            delay_minutes,
        } => {
            collect::run_collect_sessions(
                &pool,
                &config,
                sessions,
                Duration::from_secs(delay_minutes * 60),
            )
            .await?;
        }
        Commands::Export => run_export(&pool, &config).await?,
        Commands::Stats { limit } => stats::run_stats(&pool, limit).await?,
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = trendscope_db::PoolConfig::from_app_config(config);
    let pool = trendscope_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

/// Runs one export-only pass and reports what was written.
async fn run_export(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let snapshot = trendscope_pipeline::run_export_only(
        pool,
        &config.snapshot_path,
        SnapshotLimits::default(),
        Duration::from_secs(config.export_timeout_secs),
    )
    .await?;

    println!("snapshot written to {}", config.snapshot_path.display());
    println!(
        "  posts: {}  comments: {}  tags: {}",
        snapshot.stats.total_videos, snapshot.stats.total_comments, snapshot.stats.total_hashtags
    );
    println!(
        "  phrases: {}  top comments: {}  recent posts: {}",
        snapshot.top_phrases.len(),
        snapshot.top_comments.len(),
        snapshot.recent_videos.len()
    );
    Ok(())
}
