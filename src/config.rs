use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Namespace for every collection and table in the database file.
    pub db_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// SNAIL_DB_NAME is required; SNAIL_DB_PATH defaults to "./snail.redb".
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_name = var("SNAIL_DB_NAME").ok_or(ConfigError::Missing("SNAIL_DB_NAME"))?;
        if db_name.is_empty() || db_name.contains('/') {
            return Err(ConfigError::Invalid(
                "SNAIL_DB_NAME",
                "must be non-empty and contain no '/'",
            ));
        }

        let db_path = var("SNAIL_DB_PATH")
            .unwrap_or_else(|| "./snail.redb".to_string())
            .into();

        let listen_addr = var("SNAIL_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SNAIL_LISTEN_ADDR", "must be a valid socket address"))?;

        Ok(Config {
            listen_addr,
            db_path,
            db_name,
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SNAIL_DB_NAME", "shop")]).unwrap();
        assert_eq!(config.db_name, "shop");
        assert_eq!(config.db_path, PathBuf::from("./snail.redb"));
        assert_eq!(config.listen_addr.port(), 3000);
    }

    #[test]
    fn test_missing_db_name() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("SNAIL_DB_NAME"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SNAIL_DB_NAME", "a/b")]),
            Err(ConfigError::Invalid("SNAIL_DB_NAME", _))
        ));
        assert!(matches!(
            load(&[("SNAIL_DB_NAME", "shop"), ("SNAIL_LISTEN_ADDR", "nowhere")]),
            Err(ConfigError::Invalid("SNAIL_LISTEN_ADDR", _))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SNAIL_DB_NAME", "shop"),
            ("SNAIL_DB_PATH", "/var/lib/snail/data.redb"),
            ("SNAIL_LISTEN_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/snail/data.redb"));
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
    }
}
