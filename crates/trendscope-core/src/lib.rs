//! Shared configuration and domain records for trendscope.

mod app_config;
mod config;
mod content;
mod snapshot;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use content::{EngagementStats, NewComment, NewPost, SourcedPost};
pub use snapshot::{
    PhraseCount, RecentVideo, Snapshot, SnapshotLimits, SnapshotStats, TagCount, TopComment,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
