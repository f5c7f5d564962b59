//! Configuration management for ChainLab

use crate::eligibility::DEFAULT_MIN_AGE;
use crate::error::{LabError, Result};
use crate::identity::Identity;
use crate::registry::RegistryMode;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    /// Hex identity of the admin, or a label hashed into one.
    #[serde(default = "default_admin")]
    pub admin: String,
    #[serde(default = "default_mode")]
    pub mode: RegistryMode,
}

#[derive(Debug, Deserialize)]
pub struct EligibilityConfig {
    #[serde(default = "default_min_age")]
    pub min_age: u64,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            mode: default_mode(),
        }
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_age: default_min_age(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

impl Config {
    pub fn admin_identity(&self) -> Identity {
        crate::identity::resolve(&self.registry.admin)
    }
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_mode() -> RegistryMode {
    RegistryMode::AdminManaged
}

fn default_min_age() -> u64 {
    DEFAULT_MIN_AGE
}

fn default_data_path() -> String {
    "./data/chainlab.db".to_string()
}

/// Parse a config document and validate critical values.
pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)?;

    if config.database.path.trim().is_empty() {
        return Err(LabError::ConfigError(
            "database.path must be set in config.toml".to_string(),
        ));
    }

    let admin = config.registry.admin.trim();
    if admin.is_empty() {
        return Err(LabError::ConfigError(
            "registry.admin must be set in config.toml".to_string(),
        ));
    }
    // 64 characters means the value was meant as hex: it has to parse.
    if admin.len() == 64 {
        Identity::from_hex(admin)
            .map_err(|e| LabError::ConfigError(format!("registry.admin: {}", e)))?;
    }

    Ok(config)
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(Path::new(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.eligibility.min_age, 18);
        assert_eq!(config.registry.mode, RegistryMode::AdminManaged);
        assert_eq!(config.admin_identity(), Identity::from_label("admin"));
        assert_eq!(config.database.path, "./data/chainlab.db");
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(
            r#"
            [registry]
            mode = "self_service"

            [eligibility]
            min_age = 21
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.mode, RegistryMode::SelfService);
        assert_eq!(config.eligibility.min_age, 21);
        assert_eq!(config.registry.admin, "admin");
    }

    #[test]
    fn test_hex_admin() {
        let admin = Identity::from_label("root");
        let config = parse_config(&format!("[registry]\nadmin = \"{}\"\n", admin.to_hex())).unwrap();
        assert_eq!(config.admin_identity(), admin);
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let result = parse_config("[database]\npath = \"\"\n");
        assert!(matches!(result, Err(LabError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_malformed_hex_admin() {
        let bad = "z".repeat(64);
        let result = parse_config(&format!("[registry]\nadmin = \"{}\"\n", bad));
        assert!(matches!(result, Err(LabError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(matches!(parse_config("[registry"), Err(LabError::ConfigError(_))));
    }
}
