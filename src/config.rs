use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::http::connection::ConnectionSettings;

pub const DEFAULT_WORKERS: usize = 1024;
pub const DEFAULT_DOCUMENT_ROOT: &str = "www";
pub const DEFAULT_SERVER_NAME: &str = "Lantern";

/// Command line options. Anything given here overrides the config file.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lantern")]
#[command(about = "Serves static files over HTTP/1.1")]
#[command(version)]
pub struct Args {
    /// Number of concurrent workers; falls back to the default when not a
    /// positive integer
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<String>,

    /// Directory to serve files from
    #[arg(short = 'r', long = "root")]
    pub root: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// How accepted connections are handed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// At most `workers` connections in flight; extra connections are dropped.
    #[default]
    Bounded,
    /// One task per connection, no limit.
    Unbounded,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub server_name: String,
    pub workers: usize,
    pub dispatch: DispatchMode,
    pub read_timeout_secs: u64,
    pub max_header_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFilesConfig {
    pub document_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            workers: DEFAULT_WORKERS,
            dispatch: DispatchMode::Bounded,
            read_timeout_secs: 10,
            max_header_bytes: 8192,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from(DEFAULT_DOCUMENT_ROOT),
        }
    }
}

impl Config {
    /// Defaults, then the config file if one was given, then CLI overrides.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(workers) = &args.workers {
            cfg.server.workers = parse_workers(workers);
        }

        if let Some(root) = &args.root {
            cfg.static_files.document_root = root.clone();
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let mut cfg: Config = serde_yaml::from_str(raw)?;

        if !valid_workers(cfg.server.workers) {
            cfg.server.workers = DEFAULT_WORKERS;
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_timeout: Duration::from_secs(self.server.read_timeout_secs),
            max_header_bytes: self.server.max_header_bytes,
        }
    }
}

/// Lenient worker count: anything but a positive integer the dispatcher can
/// hold permits for gives the default.
pub fn parse_workers(raw: &str) -> usize {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| valid_workers(n))
        .unwrap_or(DEFAULT_WORKERS)
}

fn valid_workers(n: usize) -> bool {
    n > 0 && n <= Semaphore::MAX_PERMITS
}
