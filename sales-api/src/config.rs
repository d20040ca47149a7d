//! API Configuration Module
//!
//! This module provides configuration for CORS, the result cache and the
//! listening address. Configuration is loaded from environment variables
//! with sensible defaults for development.

use std::net::SocketAddr;
use std::time::Duration;

use sales_storage::CacheConfig;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, caching and the listening socket.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://reports.example.com,https://admin.example.com"
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Result Cache Configuration
    // ========================================================================
    /// How long a report result stays cached.
    pub cache_ttl: Duration,

    /// Maximum number of cached report results.
    pub cache_max_entries: usize,

    // ========================================================================
    // Listener
    // ========================================================================
    pub bind_host: String,
    pub port: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours

            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 128,

            bind_host: "0.0.0.0".to_string(),
            port: "8000".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SALES_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `SALES_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `CACHE_TTL_SECONDS`: Result cache TTL (default: 300)
    /// - `SALES_CACHE_MAX_ENTRIES`: Result cache capacity (default: 128)
    /// - `SALES_API_BIND`: Listen host (default: 0.0.0.0)
    /// - `PORT` or `SALES_API_PORT`: Listen port (default: 8000)
    ///
    /// Unparsable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cors_origins = lookup("SALES_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = lookup("SALES_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let cache_ttl = lookup("CACHE_TTL_SECONDS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let cache_max_entries = lookup("SALES_CACHE_MAX_ENTRIES")
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.cache_max_entries);

        let bind_host = lookup("SALES_API_BIND").unwrap_or(defaults.bind_host);
        let port = lookup("PORT")
            .or_else(|| lookup("SALES_API_PORT"))
            .unwrap_or(defaults.port);

        Self {
            cors_origins,
            cors_max_age_secs,
            cache_ttl,
            cache_max_entries,
            bind_host,
            port,
        }
    }

    /// Result cache settings derived from this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_ttl(self.cache_ttl)
            .with_max_entries(self.cache_max_entries)
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let port = self.port.parse::<u16>().map_err(|_| {
            ApiError::invalid_input(format!("Invalid port value: {}", self.port))
        })?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}
