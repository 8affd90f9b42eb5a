use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Where the exporter writes the dashboard snapshot document.
    pub snapshot_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Bearer key for the content source. Collection fails without it;
    /// export and the dashboard keep working.
    pub source_api_key: Option<String>,
    pub source_base_url: String,
    pub source_request_timeout_secs: u64,
    pub source_user_agent: String,
    pub source_max_retries: u32,
    pub source_retry_backoff_base_secs: u64,
    /// Upper bound on the collect stage of a refresh run.
    pub collect_timeout_secs: u64,
    /// Upper bound on a single export pass.
    pub export_timeout_secs: u64,
    /// Cron expression for scheduled refresh runs. `None` disables them.
    pub refresh_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("snapshot_path", &self.snapshot_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "source_api_key",
                &self.source_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("source_base_url", &self.source_base_url)
            .field(
                "source_request_timeout_secs",
                &self.source_request_timeout_secs,
            )
            .field("source_user_agent", &self.source_user_agent)
            .field("source_max_retries", &self.source_max_retries)
            .field(
                "source_retry_backoff_base_secs",
                &self.source_retry_backoff_base_secs,
            )
            .field("collect_timeout_secs", &self.collect_timeout_secs)
            .field("export_timeout_secs", &self.export_timeout_secs)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
