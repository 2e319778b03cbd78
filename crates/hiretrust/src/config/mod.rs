use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub assessment: AssessmentConfig,
    pub oracle: OracleConfig,
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
        let log_format = env::var("APP_LOG_FORMAT")
            .map(|value| LogFormat::from_str(&value))
            .unwrap_or_default();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            assessment: AssessmentConfig::from_env()?,
            oracle: OracleConfig::from_env(),
        })
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

/// Line format of the log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Engine dials: oracle deadline, degradation score and feature unlock threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    pub oracle_timeout: Duration,
    pub fallback_score: u8,
    pub chat_unlock_score: u8,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_secs(15),
            fallback_score: 3,
            chat_unlock_score: 50,
        }
    }
}

impl AssessmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let oracle_timeout = match env::var("ASSESSMENT_ORACLE_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidOracleTimeout(raw)),
            },
            Err(_) => defaults.oracle_timeout,
        };

        let fallback_score = match env::var("ASSESSMENT_FALLBACK_SCORE") {
            Ok(raw) => match raw.trim().parse::<u8>() {
                Ok(score) if score <= 6 => score,
                _ => return Err(ConfigError::InvalidFallbackScore(raw)),
            },
            Err(_) => defaults.fallback_score,
        };

        let chat_unlock_score = match env::var("ASSESSMENT_CHAT_UNLOCK_SCORE") {
            Ok(raw) => match raw.trim().parse::<u8>() {
                Ok(score) if score <= 100 => score,
                _ => return Err(ConfigError::InvalidUnlockScore(raw)),
            },
            Err(_) => defaults.chat_unlock_score,
        };

        Ok(Self {
            oracle_timeout,
            fallback_score,
            chat_unlock_score,
        })
    }
}

/// Hosted generative model settings. Without an API key the service runs offline.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl OracleConfig {
    fn from_env() -> Self {
        let api_key = env::var("ORACLE_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            api_key,
            model: env::var("ORACLE_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            base_url: env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidOracleTimeout(String),
    InvalidFallbackScore(String),
    InvalidUnlockScore(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidOracleTimeout(raw) => write!(
                f,
                "ASSESSMENT_ORACLE_TIMEOUT_SECS must be a positive integer (found '{raw}')"
            ),
            ConfigError::InvalidFallbackScore(raw) => write!(
                f,
                "ASSESSMENT_FALLBACK_SCORE must be between 0 and 6 (found '{raw}')"
            ),
            ConfigError::InvalidUnlockScore(raw) => write!(
                f,
                "ASSESSMENT_CHAT_UNLOCK_SCORE must be between 0 and 100 (found '{raw}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidOracleTimeout(_)
            | ConfigError::InvalidFallbackScore(_)
            | ConfigError::InvalidUnlockScore(_) => None,
        }
    }
}
