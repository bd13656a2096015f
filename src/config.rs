//! Configuration for the registry and the demo binary.
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. JSON config file, when one is given
//! 3. Environment variables (`ACAD_CERTS_*`)

use crate::certs::CodeFormat;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE: &str = "ACAD_CERTS_DB";
pub const ENV_MAX_ATTEMPTS: &str = "ACAD_CERTS_MAX_ATTEMPTS";
pub const ENV_CACHE_CAPACITY: &str = "ACAD_CERTS_CACHE_CAPACITY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Sqlite file; `:memory:` selects an in-memory database.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub max_issue_attempts: u32,
    pub code_groups: usize,
    pub code_group_len: usize,
    /// 0 disables the validation cache.
    pub cache_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let format = CodeFormat::default();
        Self {
            max_issue_attempts: 5,
            code_groups: format.groups,
            code_group_len: format.group_len,
            cache_capacity: 1024,
        }
    }
}

impl RegistryConfig {
    pub fn code_format(&self) -> CodeFormat {
        CodeFormat {
            groups: self.code_groups,
            group_len: self.code_group_len,
        }
    }
}

/// Workload for the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub users: i64,
    pub courses: i64,
    pub issue_requests: usize,
    pub metrics_csv: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            users: 20,
            courses: 5,
            issue_requests: 200,
            metrics_csv: PathBuf::from("registry_metrics.csv"),
        }
    }
}

impl Config {
    /// Defaults, then the optional file, then the environment; validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Apply overrides looked up through `var`, so tests need not touch the process env.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(db) = var(ENV_DATABASE) {
            self.store.backend = StoreBackend::Sqlite;
            self.store.database_path = Some(PathBuf::from(db));
        }
        if let Some(raw) = var(ENV_MAX_ATTEMPTS) {
            self.registry.max_issue_attempts = parse_env(ENV_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = var(ENV_CACHE_CAPACITY) {
            self.registry.cache_capacity = parse_env(ENV_CACHE_CAPACITY, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_issue_attempts == 0 {
            return Err(ConfigError::Invalid(
                "registry.max_issue_attempts must be at least 1".into(),
            ));
        }
        let format = self.registry.code_format();
        if !format.is_strong_enough() {
            return Err(ConfigError::Invalid(format!(
                "validation codes need at least {} symbols, got {}x{}",
                crate::certs::code::MIN_CODE_SYMBOLS,
                format.groups,
                format.group_len
            )));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.database_path.is_none() {
            return Err(ConfigError::Invalid(
                "store.database_path is required for the sqlite backend".into(),
            ));
        }
        if self.demo.users < 1 || self.demo.courses < 1 {
            return Err(ConfigError::Invalid(
                "demo needs at least one user and one course".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}: cannot parse {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.registry.max_issue_attempts, 5);
        assert_eq!(config.registry.code_format().symbols(), 16);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(
            r#"{ "store": { "backend": "sqlite", "database_path": "certs.db" },
                 "registry": { "cache_capacity": 0 } }"#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.database_path, Some(PathBuf::from("certs.db")));
        assert_eq!(config.registry.cache_capacity, 0);
        assert_eq!(config.registry.max_issue_attempts, 5);
        assert_eq!(config.demo.issue_requests, 200);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE, "/tmp/certs.db"),
            (ENV_MAX_ATTEMPTS, " 8 "),
            (ENV_CACHE_CAPACITY, "16"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.registry.max_issue_attempts, 8);
        assert_eq!(config.registry.cache_capacity, 16);
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == ENV_MAX_ATTEMPTS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ATTEMPTS));
    }

    #[test]
    fn weak_code_format_is_rejected() {
        let mut config = Config::default();
        config.registry.code_groups = 3;
        config.registry.code_group_len = 4;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn sqlite_without_path_is_rejected() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Sqlite;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = Config::default();
        config.registry.max_issue_attempts = 0;
        assert!(config.validate().is_err());
    }
}
