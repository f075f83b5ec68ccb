//! Process configuration, read once from the environment at startup.

use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_DATABASE_URL: &str = "sqlite:data/visitlog.db";
const DEFAULT_TABLE_NAME: &str = "visits";
const DEFAULT_COLLECTION: &str = "visits";
const DEFAULT_APP_VERSION: &str = "1.0.0.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API_TOKENS entry {0:?}, expected token=subject")]
    InvalidToken(String),
}

/// Storage backend selection. The document block wins when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Table {
        database_url: String,
        table_name: String,
    },
    Document {
        directory: PathBuf,
        collection: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityConfig {
    pub client_id: Option<String>,
    pub authority: Option<String>,
    /// Bearer tokens accepted by the built-in verifier, mapped to their subject.
    pub api_tokens: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub authorization_disabled: bool,
    pub app_version: String,
    pub cors_allowed_origin: Option<String>,
    /// Answer `GET /visit` with 404 instead of `[]` when there are no visits.
    /// On by default for compatibility with existing callers.
    pub empty_list_not_found: bool,
}

impl Config {
    /// Load from the process environment (after `.env`, if any).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match var("DOCUMENT_STORE_DIR") {
            Some(directory) => StorageConfig::Document {
                directory: PathBuf::from(directory),
                collection: var("DOCUMENT_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            },
            None => StorageConfig::Table {
                database_url: var("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                table_name: var("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            },
        };

        let api_tokens = match var("API_TOKENS") {
            Some(raw) => parse_tokens(&raw)?,
            None => HashMap::new(),
        };

        Ok(Self {
            bind_address: parse_or_default("BIND_ADDRESS", var("BIND_ADDRESS"), default_bind_address()),
            storage,
            identity: IdentityConfig {
                client_id: var("IDENTITY_CLIENT_ID"),
                authority: var("IDENTITY_AUTHORITY"),
                api_tokens,
            },
            authorization_disabled: parse_or_default(
                "AUTHORIZATION_DISABLED",
                var("AUTHORIZATION_DISABLED"),
                false,
            ),
            app_version: var("APP_VERSION").unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
            cors_allowed_origin: var("CORS_ALLOWED_ORIGIN"),
            empty_list_not_found: parse_or_default(
                "VISIT_EMPTY_LIST_NOT_FOUND",
                var("VISIT_EMPTY_LIST_NOT_FOUND"),
                true,
            ),
        })
    }

    /// Row store on `database_url`, everything else at its default.
    pub fn with_table_store(database_url: &str) -> Self {
        Self {
            bind_address: default_bind_address(),
            storage: StorageConfig::Table {
                database_url: database_url.to_string(),
                table_name: DEFAULT_TABLE_NAME.to_string(),
            },
            identity: IdentityConfig::default(),
            authorization_disabled: false,
            app_version: DEFAULT_APP_VERSION.to_string(),
            cors_allowed_origin: None,
            empty_list_not_found: true,
        }
    }

    pub fn log_summary(&self) {
        info!("Bind address: {}", self.bind_address);
        info!("Storage: {:?}", self.storage);
        info!("Identity client id: {:?}", self.identity.client_id);
        info!("Identity authority: {:?}", self.identity.authority);
        info!("Accepted API tokens: {}", self.identity.api_tokens.len());
        info!("Authorization disabled: {}", self.authorization_disabled);
        info!("App version: {}", self.app_version);
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn parse_or_default<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = value else {
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

fn parse_tokens(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((token, subject)) if !token.trim().is_empty() && !subject.trim().is_empty() => {
                Ok((token.trim().to_string(), subject.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidToken(pair.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_select_the_row_store() {
        let config = load(&[]).unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Table {
                database_url: "sqlite:data/visitlog.db".to_string(),
                table_name: "visits".to_string(),
            }
        );
        assert!(!config.authorization_disabled);
        assert!(config.empty_list_not_found);
        assert_eq!(config.app_version, "1.0.0.1");
        assert_eq!(config.bind_address.port(), 3000);
    }

    #[test]
    fn document_block_selects_the_document_store() {
        let config = load(&[
            ("DOCUMENT_STORE_DIR", "/var/lib/visitlog"),
            ("DATABASE_URL", "sqlite::memory:"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Document {
                directory: PathBuf::from("/var/lib/visitlog"),
                collection: "visits".to_string(),
            }
        );
    }

    #[test]
    fn unparsable_flags_fall_back_to_defaults() {
        let config = load(&[
            ("AUTHORIZATION_DISABLED", "yes please"),
            ("BIND_ADDRESS", "not an address"),
        ])
        .unwrap();
        assert!(!config.authorization_disabled);
        assert_eq!(config.bind_address.port(), 3000);

        let config = load(&[("AUTHORIZATION_DISABLED", "true")]).unwrap();
        assert!(config.authorization_disabled);
    }

    #[test]
    fn api_tokens_are_parsed() {
        let config = load(&[("API_TOKENS", "abc=alice, def=bob,")]).unwrap();
        assert_eq!(config.identity.api_tokens.get("abc").map(String::as_str), Some("alice"));
        assert_eq!(config.identity.api_tokens.get("def").map(String::as_str), Some("bob"));

        assert!(matches!(
            load(&[("API_TOKENS", "nosubject")]),
            Err(ConfigError::InvalidToken(_))
        ));
    }
}
