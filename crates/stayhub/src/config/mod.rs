use chrono::Duration;
use std::env;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let bearer_secret = env::var("APP_BEARER_SECRET")
            .unwrap_or_else(|_| "stayhub-development-secret".to_string());
        let session_ttl_days = parse_env_i64("APP_SESSION_TTL_DAYS", 7)?;
        let lockout_max_failures = parse_env_u32("APP_LOCKOUT_MAX_FAILURES", 5)?;
        let lockout_minutes = parse_env_i64("APP_LOCKOUT_MINUTES", 15)?;
        let verification_ttl_hours = parse_env_i64("APP_VERIFICATION_TTL_HOURS", 24)?;
        let reset_ttl_hours = parse_env_i64("APP_RESET_TTL_HOURS", 1)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                bearer_secret,
                session_ttl_days,
                lockout_max_failures,
                lockout_minutes,
                verification_ttl_hours,
                reset_ttl_hours,
            },
        })
    }
}

fn parse_env_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidInteger { key }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidInteger { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credential and token policy knobs for the account-security core.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub bearer_secret: String,
    pub session_ttl_days: i64,
    pub lockout_max_failures: u32,
    pub lockout_minutes: i64,
    pub verification_ttl_hours: i64,
    pub reset_ttl_hours: i64,
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_ttl_days)
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::minutes(self.lockout_minutes)
    }

    pub fn verification_ttl(&self) -> Duration {
        Duration::hours(self.verification_ttl_hours)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::hours(self.reset_ttl_hours)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("{key} must be a valid integer")]
    InvalidInteger { key: &'static str },
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
}
