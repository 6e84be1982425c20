//! Layered application configuration: defaults, then an optional YAML
//! file, then `EPIC_`-prefixed environment variables.

use std::path::Path;

use anyhow::Context;
use crm::CrmConfig;
use crm_db::ConnectOpts;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "EPIC_";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub crm: CrmConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite://epic.db?mode=rwc".to_owned(),
            max_conns: None,
            min_conns: None,
            connect_timeout_secs: None,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            max_conns: self.max_conns,
            min_conns: self.min_conns,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Merge the YAML file at `path` (when given) and the environment over defaults.
    ///
    /// # Errors
    /// Fails when the file is missing or a value does not deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            anyhow::ensure!(path.is_file(), "config file {} not found", path.display());
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")?;
        config.crm.validate().context("invalid crm configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_sources() {
        figment::Jail::expect_with(|_| {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.logging.format, LogFormat::Text);
            Ok(())
        });
    }

    #[test]
    fn yaml_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "epic.yaml",
                "server:\n  bind_addr: 0.0.0.0:9000\n\
                 database:\n  dsn: sqlite://crm.db\n  max_conns: 4\n\
                 logging:\n  format: json\n\
                 crm:\n  session_ttl_secs: 600\n",
            )?;
            jail.set_env("EPIC_DATABASE__MAX_CONNS", "8");
            jail.set_env("EPIC_CRM__DEFAULT_PAGE_SIZE", "20");

            let config = AppConfig::load(Some(Path::new("epic.yaml"))).unwrap();
            assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
            assert_eq!(config.database.dsn, "sqlite://crm.db");
            assert_eq!(config.database.connect_opts().max_conns, Some(8));
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.crm.session_ttl_secs, 600);
            assert_eq!(config.crm.default_page_size, 20);
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  port: 80").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/epic.yaml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn shipped_config_parses() {
        let raw = include_str!("../config/epic.yaml");
        let config: AppConfig = serde_saphyr::from_str(raw).unwrap();
        assert_eq!(config.crm.max_page_size, 1000);
    }
}
