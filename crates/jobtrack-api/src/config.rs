//! API configuration.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Signing secret used outside production when `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "jobtrack-development-secret";

/// Default token lifetime (30 days).
const DEFAULT_JWT_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which store implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "firestore" => Ok(Self::Firestore),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per IP, general API)
    pub rate_limit_rps: u32,
    /// Requests allowed per IP on auth routes within `auth_rate_limit_window`
    pub auth_rate_limit_max: u32,
    pub auth_rate_limit_window: Duration,
    /// Take client IPs from `X-Forwarded-For` / `X-Real-IP`
    pub trust_proxy_headers: bool,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_lifetime: Duration,
    pub bcrypt_cost: u32,
    pub store_backend: StoreBackend,
    /// Read-only demo account, if any
    pub demo_user_email: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            auth_rate_limit_max: 10,
            auth_rate_limit_window: Duration::from_secs(15 * 60),
            trust_proxy_headers: false,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime: DEFAULT_JWT_LIFETIME,
            bcrypt_cost: 10,
            store_backend: StoreBackend::Memory,
            demo_user_email: None,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let production = environment.to_lowercase() == "production";

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if production => return Err(ConfigError::MissingJwtSecret),
            _ => defaults.jwt_secret,
        };

        let jwt_lifetime = match std::env::var("JWT_LIFETIME") {
            Ok(raw) => parse_lifetime(&raw).ok_or(ConfigError::Invalid {
                name: "JWT_LIFETIME",
                value: raw,
            })?,
            Err(_) => defaults.jwt_lifetime,
        };

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.store_backend,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            auth_rate_limit_max: env_parse("AUTH_RATE_LIMIT_MAX")
                .unwrap_or(defaults.auth_rate_limit_max),
            auth_rate_limit_window: env_parse("AUTH_RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.auth_rate_limit_window),
            trust_proxy_headers: env_parse("TRUST_PROXY_HEADERS")
                .unwrap_or(defaults.trust_proxy_headers),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment,
            jwt_secret,
            jwt_lifetime,
            bcrypt_cost: env_parse("BCRYPT_COST").unwrap_or(defaults.bcrypt_cost),
            store_backend,
            demo_user_email: std::env::var("DEMO_USER_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a token lifetime such as `30d`, `12h`, `45m`, `90s` or plain seconds.
pub fn parse_lifetime(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last()? {
        (i, 'd') => (&raw[..i], 24 * 60 * 60),
        (i, 'h') => (&raw[..i], 60 * 60),
        (i, 'm') => (&raw[..i], 60),
        (i, 's') => (&raw[..i], 1),
        _ => (raw, 1),
    };
    let value: u64 = digits.trim().parse().ok()?;
    if value == 0 {
        return None;
    }
    value.checked_mul(unit_secs).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime("30d"), Some(Duration::from_secs(2_592_000)));
        assert_eq!(parse_lifetime("12h"), Some(Duration::from_secs(43_200)));
        assert_eq!(parse_lifetime("45m"), Some(Duration::from_secs(2_700)));
        assert_eq!(parse_lifetime("3600"), Some(Duration::from_secs(3_600)));
        assert_eq!(parse_lifetime("0d"), None);
        assert_eq!(parse_lifetime("soon"), None);
        assert_eq!(parse_lifetime(""), None);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("Firestore".parse::<StoreBackend>().unwrap(), StoreBackend::Firestore);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    #[serial]
    fn test_production_requires_secret() {
        std::env::set_var("ENVIRONMENT", "production");
        std::env::remove_var("JWT_SECRET");
        assert!(matches!(ApiConfig::from_env(), Err(ConfigError::MissingJwtSecret)));

        std::env::set_var("JWT_SECRET", "s3cret");
        let config = ApiConfig::from_env().unwrap();
        assert!(config.is_production());
        assert_eq!(config.jwt_secret, "s3cret");

        std::env::remove_var("ENVIRONMENT");
        std::env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        for name in [
            "ENVIRONMENT",
            "JWT_SECRET",
            "JWT_LIFETIME",
            "STORE_BACKEND",
            "AUTH_RATE_LIMIT_MAX",
            "TRUST_PROXY_HEADERS",
        ] {
            std::env::remove_var(name);
        }
        std::env::set_var("JWT_LIFETIME", "1h");

        let config = ApiConfig::from_env().unwrap();
        assert!(!config.is_production());
        assert_eq!(config.jwt_lifetime, Duration::from_secs(3600));
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.auth_rate_limit_max, 10);
        assert_eq!(config.auth_rate_limit_window, Duration::from_secs(900));
        assert!(!config.trust_proxy_headers);

        std::env::set_var("TRUST_PROXY_HEADERS", "true");
        assert!(ApiConfig::from_env().unwrap().trust_proxy_headers);

        std::env::remove_var("TRUST_PROXY_HEADERS");
        std::env::remove_var("JWT_LIFETIME");
    }
}
