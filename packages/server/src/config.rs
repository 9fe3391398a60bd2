//! Server configuration from environment variables
//!
//! - `SPECTREE_DB_PATH`: database file (default: `./data/spectree.db`)
//! - `SPECTREE_PORT`: listen port (default: 3001)
//! - `CORS_ALLOW_ORIGIN`: single allowed origin (default: local dev origins)
//!
//! Invalid values fall back to the defaults with a warning.

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "./data/spectree.db";
pub const DEFAULT_PORT: u16 = 3001;

/// Local frontend dev servers allowed when no origin is configured
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:1420",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("SPECTREE_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(port) = lookup("SPECTREE_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) if port > 0 => config.port = port,
                _ => tracing::warn!(
                    value = %port,
                    default = DEFAULT_PORT,
                    "Invalid SPECTREE_PORT, using default"
                ),
            }
        }

        if let Some(origin) = lookup("CORS_ALLOW_ORIGIN").filter(|o| !o.trim().is_empty()) {
            config.allowed_origins = vec![origin.trim().to_string()];
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3001);
        assert_eq!(config.allowed_origins.len(), 3);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SPECTREE_DB_PATH", "/tmp/specs.db"),
            ("SPECTREE_PORT", "8080"),
            ("CORS_ALLOW_ORIGIN", "http://example.test"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/specs.db"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.allowed_origins, vec!["http://example.test"]);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        for bad in ["abc", "0", "70000", ""] {
            let config = ServerConfig::from_lookup(lookup(&[("SPECTREE_PORT", bad)]));
            assert_eq!(config.port, DEFAULT_PORT, "port value {bad:?}");
        }
    }
}
