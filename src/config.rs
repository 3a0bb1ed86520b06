use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::{DataSource, RetryPolicy};

/// Environment variable overriding the configured connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub connect_retries: u32,
    pub connect_delay_secs: u64,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            database_url: "sqlite://items.db".to_string(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            connect_retries: retry.attempts,
            connect_delay_secs: retry.delay.as_secs(),
        }
    }
}

impl ItemsConfig {
    pub fn data_source(&self) -> crate::Result<DataSource> {
        DataSource::parse(&self.database_url)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.connect_retries,
            delay: Duration::from_secs(self.connect_delay_secs),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Replace the connection string with `value` when one is given
    pub fn override_database_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.database_url = url;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("items-api.toml")
}

/// Load the config file, falling back to defaults when it does not exist
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ItemsConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(ItemsConfig::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ItemsConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &ItemsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Create the parent directory of a file-backed database
pub fn ensure_db_dir(source: &DataSource) -> anyhow::Result<()> {
    if let DataSource::File(db_path) = source {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
