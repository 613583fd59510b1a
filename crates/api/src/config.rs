use std::str::FromStr;

use buildcrm_core::display::CurrencyFormat;
use buildcrm_core::stats::AggregationMode;

use crate::auth::jwt::JwtConfig;

/// A configuration variable is missing or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// Deployment name reported by `/health` (default: `development`).
    pub environment: String,
    /// Whether stats try the SQL aggregation functions first.
    pub stats_mode: AggregationMode,
    /// Money display convention for dashboard figures.
    pub currency: CurrencyFormat,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `APP_ENV`               | `development`              |
    /// | `STATS_RPC_ENABLED`     | `true`                     |
    /// | `CURRENCY_FORMAT`       | `en_us` (or `euro`)        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("PORT", &lookup, 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", &lookup, 30u64)?;
        let shutdown_timeout_secs = parse_or("SHUTDOWN_TIMEOUT_SECS", &lookup, 30u64)?;
        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".into());

        let stats_mode = if parse_or("STATS_RPC_ENABLED", &lookup, true)? {
            AggregationMode::PreferRpc
        } else {
            AggregationMode::FallbackOnly
        };

        let currency = match lookup("CURRENCY_FORMAT").as_deref() {
            None | Some("en_us") => CurrencyFormat::en_us(),
            Some("euro") => CurrencyFormat::euro(),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "CURRENCY_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let jwt = JwtConfig::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            environment,
            stats_mode,
            currency,
            jwt,
        })
    }
}

/// Parse `var` if present, otherwise return `default`.
pub(crate) fn parse_or<T: FromStr>(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
