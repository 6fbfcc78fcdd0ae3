//! Configuration types, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Service name sent to collaborators in `X-Service-Name`.
pub const SERVICE_NAME: &str = "ussd-service";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct UssdConfig {
    /// Address the callback server binds to.
    pub bind_addr: String,
    /// Sessions idle longer than this are treated as absent.
    pub session_timeout: Duration,
    /// How often the expiry sweep runs.
    pub sweep_interval: Duration,
    /// Collaborator client settings.
    pub gateway: GatewayConfig,
}

impl Default for UssdConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8085".to_string(),
            session_timeout: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            gateway: GatewayConfig::default(),
        }
    }
}

impl UssdConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = std::env::var("USSD_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let session_timeout = match env_parse::<u64>("USSD_SESSION_TIMEOUT_MIN") {
            Some(minutes) => session_timeout_from_minutes(minutes)?,
            None => defaults.session_timeout,
        };

        let sweep_interval = env_parse::<u64>("USSD_SWEEP_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        if sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "USSD_SWEEP_INTERVAL_SECS".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            session_timeout,
            sweep_interval,
            gateway: GatewayConfig::from_env()?,
        })
    }
}

/// Settings for calls to the platform's API gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Optional bearer token for service-to-service calls.
    pub api_key: Option<SecretString>,
    pub connect_timeout: Duration,
    /// Per-attempt request timeout.
    pub read_timeout: Duration,
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// First backoff delay; doubles on every retry.
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
    /// How long a positive registration lookup is trusted.
    pub registration_cache_ttl: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            connect_timeout: Duration::from_millis(3000),
            read_timeout: Duration::from_millis(5000),
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            registration_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl GatewayConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = std::env::var("USSD_GATEWAY_URL").unwrap_or(defaults.base_url);
        let base_url = validate_base_url(&base_url)?;

        let api_key = std::env::var("USSD_GATEWAY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let max_attempts = env_parse::<u32>("USSD_RETRY_MAX_ATTEMPTS")
            .unwrap_or(defaults.max_attempts)
            .max(1);

        Ok(Self {
            base_url,
            api_key,
            connect_timeout: env_parse::<u64>("USSD_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: env_parse::<u64>("USSD_READ_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),
            max_attempts,
            base_delay: env_parse::<u64>("USSD_RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: defaults.max_delay,
            registration_cache_ttl: env_parse::<u64>("USSD_REGISTRATION_CACHE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.registration_cache_ttl),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Accept only absolute http(s) URLs; strip any trailing slash.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = reqwest::Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: "USSD_GATEWAY_URL".to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: "USSD_GATEWAY_URL".to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Convert the configured session timeout, rejecting zero and overflow.
fn session_timeout_from_minutes(minutes: u64) -> Result<Duration, ConfigError> {
    match minutes.checked_mul(60) {
        Some(0) => Err(ConfigError::InvalidValue {
            key: "USSD_SESSION_TIMEOUT_MIN".to_string(),
            message: "must be at least 1 minute".to_string(),
        }),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Err(ConfigError::InvalidValue {
            key: "USSD_SESSION_TIMEOUT_MIN".to_string(),
            message: format!("{minutes} minutes is out of range"),
        }),
    }
}
