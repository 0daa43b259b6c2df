//! Server configuration.

use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path
    pub database_path: PathBuf,
    /// TCP address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("desk.db"),
            bind_addr: "127.0.0.1:8090".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment, falling back to defaults.
    ///
    /// - `DESK_DATABASE_PATH` - SQLite database file
    /// - `DESK_BIND_ADDR` - listen address, e.g. `0.0.0.0:8090`
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DESK_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("DESK_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_path.ends_with("desk.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:8090");
    }

    #[test]
    fn test_config_clone() {
        let config1 = Config::default();
        let config2 = config1.clone();
        assert_eq!(config1.database_path, config2.database_path);
        assert_eq!(config1.bind_addr, config2.bind_addr);
    }
}
