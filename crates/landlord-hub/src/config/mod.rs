use crate::workflows::invites::MAX_EXPIRATION_DAYS;
use crate::workflows::maintenance::OverduePolicy;
use std::env;
use std::fmt;
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

/// How far invite issuance may degrade when the server path fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    /// Server-issued codes only; failures surface to the caller.
    Strict,
    /// Server, then a locally generated code written straight to the store.
    Offline,
    /// Server, offline, then an unvalidated demo code.
    Demo,
}

impl FallbackMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" | "server" => Ok(Self::Strict),
            "offline" | "local" => Ok(Self::Offline),
            "demo" => Ok(Self::Demo),
            _ => Err(ConfigError::InvalidFallback(value.to_string())),
        }
    }

    fn default_for(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Production => Self::Strict,
            AppEnvironment::Development | AppEnvironment::Test => Self::Demo,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub invites: InviteConfig,
    pub overdue: OverduePolicy,
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

        let join_base_url =
            env::var("APP_JOIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let ttl_days = parse_number("APP_INVITE_TTL_DAYS", 7)?;
        if ttl_days == 0 || ttl_days > MAX_EXPIRATION_DAYS {
            return Err(ConfigError::InvalidNumber {
                key: "APP_INVITE_TTL_DAYS",
            });
        }
        let fallback = match env::var("APP_INVITE_FALLBACK") {
            Ok(raw) => FallbackMode::parse(&raw)?,
            Err(_) => FallbackMode::default_for(environment),
        };

        let defaults = OverduePolicy::default();
        let overdue = OverduePolicy {
            pending_hours: parse_number("APP_PENDING_OVERDUE_HOURS", defaults.pending_hours)?,
            unscheduled_hours: parse_number(
                "APP_UNSCHEDULED_OVERDUE_HOURS",
                defaults.unscheduled_hours,
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            invites: InviteConfig {
                join_base_url,
                ttl_days,
                fallback,
            },
            overdue,
        })
    }
}

fn parse_number(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
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

/// Invite code lifetime, join links, and degradation policy.
#[derive(Debug, Clone)]
pub struct InviteConfig {
    pub join_base_url: String,
    pub ttl_days: u32,
    pub fallback: FallbackMode,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            join_base_url: "http://localhost:3000".to_string(),
            ttl_days: 7,
            fallback: FallbackMode::Strict,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFallback(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a whole number within its allowed range")
            }
            ConfigError::InvalidFallback(value) => write!(
                f,
                "APP_INVITE_FALLBACK must be one of strict, offline, demo (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFallback(_) => None,
        }
    }
}
