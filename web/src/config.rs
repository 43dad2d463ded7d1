//! Configuration management for the registration server.
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::Context;
use dance_registry_core::catalog::{CatalogDocument, InMemoryCatalog};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Path to the JSON event catalog; `None` starts with an empty catalog
    pub catalog_path: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    /// `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shutdown timeout as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | variable             | default   |
    /// |----------------------|-----------|
    /// | `HOST`               | `0.0.0.0` |
    /// | `PORT`               | `8080`    |
    /// | `SHUTDOWN_TIMEOUT`   | `30`      |
    /// | `EVENT_CATALOG_PATH` | unset     |
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.host),
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.port),
                shutdown_timeout: env::var("SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(defaults.shutdown_timeout),
            },
            catalog_path: env::var("EVENT_CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Loads the configured catalog, or an empty one when no path is set.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not a valid catalog document,
    /// or carries a malformed category ladder.
    pub fn load_catalog(&self) -> anyhow::Result<InMemoryCatalog> {
        match &self.catalog_path {
            Some(path) => load_catalog(path),
            None => Ok(InMemoryCatalog::default()),
        }
    }
}

/// Reads and validates a JSON catalog document.
///
/// # Errors
///
/// See [`Config::load_catalog`].
pub fn load_catalog(path: &Path) -> anyhow::Result<InMemoryCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading event catalog {}", path.display()))?;
    parse_catalog(&raw).with_context(|| format!("loading event catalog {}", path.display()))
}

/// Parses and validates a JSON catalog document.
///
/// # Errors
///
/// Fails on malformed JSON or a malformed category ladder.
pub fn parse_catalog(raw: &str) -> anyhow::Result<InMemoryCatalog> {
    let document: CatalogDocument = serde_json::from_str(raw).context("parsing catalog JSON")?;
    let catalog = InMemoryCatalog::from_document(document)?;
    Ok(catalog)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..ServerConfig::default()
        };
        assert_eq!(server.bind_address(), "127.0.0.1:3000");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_server_section_fields() {
        let value = serde_json::to_value(ServerConfig::default()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["host", "port", "shutdown_timeout"]);
    }

    #[test]
    fn test_parse_catalog() {
        let raw = r#"{
            "categories": [
                { "name": "Infantil", "min_age": 12, "max_age": 14 },
                { "name": "Juvenil", "min_age": 15, "max_age": 17 }
            ],
            "events": [{
                "event_id": "6f1c2a7e-4d4b-4b7a-9f55-0b6b1f7c2d11",
                "policy": { "enabled": true, "criterion": "category", "max_difference": 1 },
                "modalities": [
                    { "name": "Pareja", "price_per_entry": 3500, "requires_couple": true }
                ]
            }]
        }"#;
        let catalog = parse_catalog(raw).unwrap();
        assert_eq!(catalog.categories().len(), 2);
        assert_eq!(catalog.event_count(), 1);
    }

    #[test]
    fn test_parse_catalog_rejects_gaps() {
        let raw = r#"{ "categories": [
            { "name": "Infantil", "min_age": 12, "max_age": 14 },
            { "name": "Adulto", "min_age": 18, "max_age": 35 }
        ] }"#;
        let err = parse_catalog(raw).unwrap_err();
        assert!(format!("{err:#}").contains("Adulto"));
    }
}
