//! Commission API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;

/// Commission API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database path
    pub database_path: String,

    /// Metrics feed file (JSON map of employee id -> sales metrics),
    /// dropped by the dealer-management export job
    pub metrics_file: String,

    /// Allow Open -> Resolved dispute transitions without review
    pub auto_resolve_disputes: bool,

    /// Bound on concurrent per-employee calculations in a batch
    pub worker_limit: usize,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("COMMISSION_HTTP_PORT")
                .unwrap_or_else(|_| "8900".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("COMMISSION_HTTP_PORT".to_string()))?,

            database_path: env::var("COMMISSION_DATABASE_PATH")
                .unwrap_or_else(|_| "commission.db".to_string()),

            metrics_file: env::var("COMMISSION_METRICS_FILE")
                .unwrap_or_else(|_| "sales_metrics.json".to_string()),

            auto_resolve_disputes: env::var("COMMISSION_AUTO_RESOLVE_DISPUTES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("COMMISSION_AUTO_RESOLVE_DISPUTES".to_string())
                })?,

            worker_limit: env::var("COMMISSION_WORKER_LIMIT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("COMMISSION_WORKER_LIMIT".to_string()))?,
        };

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only sound when the env vars are unset, which is the test default
        let config = ApiConfig::load().unwrap();
        assert_eq!(config.http_port, 8900);
        assert_eq!(config.worker_limit, 4);
        assert!(!config.auto_resolve_disputes);
    }
}
