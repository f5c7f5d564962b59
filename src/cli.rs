//! Shared helpers for the `lab-*` binaries

use crate::config::{load_config, Config};
use crate::error::Result;
use crate::persistence::Database;
use std::fs;
use std::path::Path;
use tracing::{debug, Level};

pub const REGISTRY_KEY: &str = "registry";
pub const BALLOT_KEY: &str = "ballot";
pub const ELIGIBILITY_KEY: &str = "eligibility";

/// Install a stderr `tracing` subscriber. `verbose` lowers the level to DEBUG.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the SQLite store named by `config`, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    let path = config.database.path.as_str();
    if path != ":memory:" {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }
    debug!("opening database at {}", path);
    Database::open(path)
}

/// Load `config.toml` from the working directory and open its database.
pub fn load_store_from_config() -> Result<(Config, Database)> {
    let config = load_config()?;
    let db = open_database(&config)?;
    Ok((config, db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::persistence::KeyValueStore;
    use tempfile::TempDir;

    #[test]
    fn test_open_database_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("lab.db");
        let config = parse_config(&format!(
            "[database]\npath = \"{}\"\n",
            db_path.display().to_string().replace('\\', "/")
        ))
        .unwrap();

        let db = open_database(&config).unwrap();
        db.put("k", b"v").unwrap();
        assert!(db_path.exists());
    }
}
