//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https://` enables `Secure` cookies)
//! - `COMMERCE_BACKEND_URL` - Commerce backend origin (e.g., <https://commerce.example.com>)
//! - `COMMERCE_PUBLISHABLE_KEY` - Publishable API key sent with every backend call
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `COMMERCE_REQUEST_TIMEOUT_SECS` - Transport timeout for backend calls (default: 10)
//! - `COMMERCE_RELAY_URL` - Same-origin relay for backend calls; enables the fetch proxy
//! - `COMMERCE_RELAY_MODE` - `always` or `fallback` (default: fallback)
//! - `REGION_CACHE_TTL_SECS` - Region cache TTL (default: 300)
//! - `METHOD_CACHE_TTL_SECS` - Shipping/payment method cache TTL (default: 30)
//! - `IDENTITY_TIMEOUT_MS` - Soft deadline for the customer lookup (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::transport::RewriteMode;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Commerce backend configuration
    pub commerce: CommerceConfig,
    /// Cache lifetimes
    pub cache: CacheConfig,
    /// Soft deadline for the identity lookup
    pub identity_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Commerce backend configuration.
///
/// Implements `Debug` manually to redact the publishable key.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Backend origin
    pub backend_url: Url,
    /// Publishable API key
    pub publishable_key: SecretString,
    /// Transport timeout for every outbound call
    pub request_timeout: Duration,
    /// Fetch proxy relay, when configured
    pub relay: Option<RelayConfig>,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("publishable_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("relay", &self.relay)
            .finish()
    }
}

/// Where and when backend calls are relayed.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay base URL; the original request path is appended to it
    pub url: Url,
    /// Rewrite every call, or only retry through the relay after a transient failure
    pub mode: RewriteMode,
}

/// Cache lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Region lookups (minutes scale)
    pub region_ttl: Duration,
    /// Shipping and payment method lookups (seconds scale)
    pub method_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            region_ttl: Duration::from_secs(300),
            method_ttl: Duration::from_secs(30),
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
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the publishable key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("STOREFRONT_PORT", "8000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let commerce = CommerceConfig::from_env()?;

        let cache = CacheConfig {
            region_ttl: Duration::from_secs(parse_env_or_default("REGION_CACHE_TTL_SECS", "300")?),
            method_ttl: Duration::from_secs(parse_env_or_default("METHOD_CACHE_TTL_SECS", "30")?),
        };
        let identity_timeout =
            Duration::from_millis(parse_env_or_default("IDENTITY_TIMEOUT_MS", "3000")?);

        Ok(Self {
            host,
            port,
            base_url,
            commerce,
            cache,
            identity_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over TLS, which makes cookies `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend_url = parse_url("COMMERCE_BACKEND_URL", &get_required_env("COMMERCE_BACKEND_URL")?)?;
        let publishable_key = get_validated_secret("COMMERCE_PUBLISHABLE_KEY")?;
        let request_timeout =
            Duration::from_secs(parse_env_or_default("COMMERCE_REQUEST_TIMEOUT_SECS", "10")?);

        let relay = match get_optional_env("COMMERCE_RELAY_URL") {
            Some(raw) => Some(RelayConfig {
                url: parse_url("COMMERCE_RELAY_URL", &raw)?,
                mode: parse_env_or_default("COMMERCE_RELAY_MODE", "fallback")?,
            }),
            None => None,
        };

        Ok(Self {
            backend_url,
            publishable_key,
            request_timeout,
            relay,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating an empty value as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    let secret = SecretString::from(value);
    if secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingEnvVar(key.to_string()));
    }
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            base_url: base_url.to_string(),
            commerce: CommerceConfig {
                backend_url: Url::parse("http://localhost:9000").unwrap(),
                publishable_key: SecretString::from("pk_0f3c9a7e1b"),
                request_timeout: Duration::from_secs(10),
                relay: None,
            },
            cache: CacheConfig::default(),
            identity_timeout: Duration::from_secs(3),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-publishable-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("pk_01HZX7Q2M4K9", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config("http://localhost:8000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_is_secure_follows_scheme() {
        assert!(!test_config("http://localhost:8000").is_secure());
        assert!(test_config("https://shop.example.com").is_secure());
    }

    #[test]
    fn test_commerce_config_debug_redacts_key() {
        let config = test_config("http://localhost:8000");
        let debug_output = format!("{:?}", config.commerce);

        assert!(debug_output.contains("localhost:9000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pk_0f3c9a7e1b"));
    }

    #[test]
    fn test_relay_mode_parses() {
        assert_eq!("always".parse::<RewriteMode>().unwrap(), RewriteMode::Always);
        assert_eq!(
            "Fallback".parse::<RewriteMode>().unwrap(),
            RewriteMode::OnTransientFailure
        );
        assert!("sometimes".parse::<RewriteMode>().is_err());
    }
}
