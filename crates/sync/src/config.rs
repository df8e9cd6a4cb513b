//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HADIYA_API_BASE_URL` - Base URL of the Hadiya shop API (https in production)
//!
//! ## Optional
//! - `HADIYA_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `HADIYA_STASH_PATH` - Path of the anonymous cart stash file
//!   (default: `hadiya/cart-stash.json` under the working directory)
//! - `HADIYA_LOG` - Tracing filter directive (default: `info`), read by
//!   [`crate::telemetry::init`]

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default stash location relative to the working directory.
const DEFAULT_STASH_PATH: &str = "hadiya/cart-stash.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Synchronization engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote cart/favorites service.
    pub api_base_url: Url,
    /// Timeout applied to every remote call.
    pub request_timeout: Duration,
    /// Location of the device-local anonymous cart stash.
    pub stash_path: PathBuf,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("HADIYA_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("HADIYA_API_BASE_URL".to_string(), e.to_string())
            })?;

        let timeout_secs = get_env_or_default(
            "HADIYA_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("HADIYA_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let stash_path =
            PathBuf::from(get_env_or_default("HADIYA_STASH_PATH", DEFAULT_STASH_PATH));

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            stash_path,
        })
    }

    /// Build a configuration directly, for embedding and tests.
    #[must_use]
    pub fn new(api_base_url: Url, stash_path: PathBuf) -> Self {
        Self {
            api_base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stash_path,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
