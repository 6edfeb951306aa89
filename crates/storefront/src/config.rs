//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `KIRANA_HOST` - Bind address (default: 127.0.0.1)
//! - `KIRANA_PORT` - Listen port (default: 3000)
//! - `KIRANA_CATALOG_URL` - Product catalog endpoint (default: the public demo catalog)
//! - `KIRANA_DATA_DIR` - Directory holding the persisted cart (default: .kirana)
//! - `KIRANA_ADD_COOLDOWN_MS` - Add-to-cart button cooldown (default: 1000)
//! - `KIRANA_CURRENCY` - ISO 4217 display currency (default: INR)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use kirana_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Catalog endpoint used when `KIRANA_CATALOG_URL` is unset.
pub const DEFAULT_CATALOG_URL: &str = "https://api.npoint.io/91c48db9bb00466a5574";

const DEFAULT_COOLDOWN_MS: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Product catalog endpoint
    pub catalog_url: Url,
    /// Directory holding the durable cart slot
    pub data_dir: PathBuf,
    /// How long an add-to-cart button stays disabled after a click
    pub add_cooldown: Duration,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            catalog_url: default_catalog_url(),
            data_dir: PathBuf::from(".kirana"),
            add_cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = parse_or(&lookup, "KIRANA_HOST", defaults.host)?;
        let port = parse_or(&lookup, "KIRANA_PORT", defaults.port)?;
        let catalog_url = parse_or(&lookup, "KIRANA_CATALOG_URL", defaults.catalog_url)?;
        let data_dir = lookup("KIRANA_DATA_DIR").map_or(defaults.data_dir, PathBuf::from);
        let add_cooldown = parse_or(&lookup, "KIRANA_ADD_COOLDOWN_MS", DEFAULT_COOLDOWN_MS)
            .map(Duration::from_millis)?;
        let currency = parse_or(&lookup, "KIRANA_CURRENCY", defaults.currency)?;

        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());
        let sentry_environment = lookup("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate(&lookup, "SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?;
        let sentry_traces_sample_rate = parse_rate(
            &lookup,
            "SENTRY_TRACES_SAMPLE_RATE",
            defaults.sentry_traces_sample_rate,
        )?;

        Ok(Self {
            host,
            port,
            catalog_url,
            data_dir,
            add_cooldown,
            currency,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::expect_used)] // constant URL, covered by tests
fn default_catalog_url() -> Url {
    Url::parse(DEFAULT_CATALOG_URL).expect("default catalog URL is valid")
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Parse a sample rate in `0.0..=1.0`.
fn parse_rate(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let rate = parse_or(lookup, key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.catalog_url.as_str(), DEFAULT_CATALOG_URL);
        assert_eq!(config.add_cooldown, Duration::from_secs(1));
        assert_eq!(config.currency, CurrencyCode::INR);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("KIRANA_HOST", "0.0.0.0"),
            ("KIRANA_PORT", "8080"),
            ("KIRANA_CATALOG_URL", "http://localhost:9000/products.json"),
            ("KIRANA_DATA_DIR", "/var/lib/kirana"),
            ("KIRANA_ADD_COOLDOWN_MS", "250"),
            ("KIRANA_CURRENCY", "usd"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.catalog_url.host_str(), Some("localhost"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/kirana"));
        assert_eq!(config.add_cooldown, Duration::from_millis(250));
        assert_eq!(config.currency, CurrencyCode::USD);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_invalid_port() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("KIRANA_PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "KIRANA_PORT"));
    }

    #[test]
    fn test_invalid_catalog_url() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("KIRANA_CATALOG_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_invalid_currency() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("KIRANA_CURRENCY", "XYZ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("SENTRY_SAMPLE_RATE", "1.5")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_empty_sentry_dsn_is_none() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[("SENTRY_DSN", "")])).unwrap();
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::default();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
