use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Reject files whose header lacks one of the mapped source columns
    pub strict_columns: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_DATA_PATH),
            strict_columns: true,
        }
    }
}

impl DataConfig {
    /// Column strictness for one load; `lenient` only ever relaxes the configured mode
    pub fn strict_for(&self, lenient: bool) -> bool {
        self.strict_columns && !lenient
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            file_prefix: constants::DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus exporter listen address; the exporter stays off when unset
    pub addr: Option<String>,
}

impl Config {
    /// Load configuration from `path` (or `config.toml`), falling back to
    /// defaults when the file does not exist, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some();
        let config_path = path.unwrap_or_else(|| Path::new(constants::DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(config_path).map_err(|e| {
                DashboardError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else if explicit {
            return Err(DashboardError::Config(format!(
                "Config file '{}' does not exist",
                config_path.display()
            )));
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var(constants::ENV_DATA_PATH) {
            if !path.trim().is_empty() {
                self.data.path = PathBuf::from(path.trim());
            }
        }
        if let Ok(port) = std::env::var(constants::ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| {
                DashboardError::Config(format!(
                    "{} must be a port number, got '{}'",
                    constants::ENV_PORT,
                    port
                ))
            })?;
        }
        if let Ok(addr) = std::env::var(constants::ENV_METRICS_ADDR) {
            if !addr.trim().is_empty() {
                self.metrics.addr = Some(addr.trim().to_string());
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                DashboardError::Config(format!(
                    "Invalid listen address '{}:{}': {}",
                    self.server.host, self.server.port, e
                ))
            })
    }

    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>> {
        match &self.metrics.addr {
            None => Ok(None),
            Some(addr) => addr.parse().map(Some).map_err(|e| {
                DashboardError::Config(format!("Invalid metrics address '{}': {}", addr, e))
            }),
        }
    }
}
