//! Server configuration, read once at startup

use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const BIND_ENV: &str = "LEADERBOARD_BIND";
/// Unset means the durable backend is not configured
pub const DATABASE_ENV: &str = "LEADERBOARD_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_path: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            bind_addr: get(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_path: get(DATABASE_ENV).map(PathBuf::from),
        }
    }
}
