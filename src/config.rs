use crate::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(name = "chado-jbrowse")]
#[command(about = "JBrowse REST connector for Chado databases")]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "CHADO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CHADO_PORT", default_value = "8080")]
    pub port: u16,

    /// Public service address used in track catalog URLs (e.g., https://example.com)
    #[arg(long, env = "CHADO_BASE_URL")]
    pub base_url: Option<String>,

    /// PostgreSQL connection string for the Chado database
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// JSON dataset served from memory instead of a database
    #[arg(long, env = "CHADO_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Surface every backend failure as an error instead of an empty result
    #[arg(long, env = "CHADO_STRICT_ERRORS", default_value = "false")]
    pub strict_errors: bool,

    /// Deadline applied to each backend query, in seconds
    #[arg(long, env = "CHADO_QUERY_TIMEOUT")]
    pub query_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Service address with any trailing slash removed.
    pub fn effective_base_url(&self) -> Result<String> {
        let raw = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port));

        Url::parse(&raw)
            .map_err(|e| Error::InvalidInput(format!("invalid base url {}: {}", raw, e)))?;

        Ok(raw.trim_end_matches('/').to_string())
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}
