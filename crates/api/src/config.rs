use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_concurrent_calls: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Wall-clock budget per document; 0 means unbounded
    pub max_parse_seconds: u64,
    /// Reload the engine after this many documents; absent disables reloads
    pub reload_after: Option<usize>,
    pub strict_dependencies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            max_concurrent_calls: 16,
        }
    }
}

/// Linguistic annotation server.
#[derive(Debug, Parser)]
#[command(name = "annotate-server", version)]
pub struct Cli {
    /// Listening port
    pub port: Option<u16>,

    /// Maximum number of in-flight calls
    pub max_concurrent_calls: Option<usize>,

    /// Maximum analysis seconds per document (0 = unbounded)
    pub max_parse_seconds: Option<u64>,

    /// JSON configuration file; command line values take precedence
    #[arg(long, env = "ANNOTATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    /// Reload the analysis engine after this many documents
    #[arg(long)]
    pub reload_after: Option<usize>,

    /// Reject dependency graphs with tokens unreachable from a root
    #[arg(long)]
    pub strict_dependencies: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Defaults, then the config file, then command line values.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(calls) = cli.max_concurrent_calls {
            self.server.max_concurrent_calls = calls;
        }
        if let Some(seconds) = cli.max_parse_seconds {
            self.analysis.max_parse_seconds = seconds;
        }
        if cli.reload_after.is_some() {
            self.analysis.reload_after = cli.reload_after;
        }
        if cli.strict_dependencies {
            self.analysis.strict_dependencies = true;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.max_concurrent_calls == 0 {
            anyhow::bail!("max_concurrent_calls must be at least 1");
        }
        if self.analysis.reload_after == Some(0) {
            anyhow::bail!("reload_after must be at least 1 when set");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
