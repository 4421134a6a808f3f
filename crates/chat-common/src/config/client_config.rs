//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use chat_core::Intents;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bot token, sent in IDENTIFY/RESUME and as the REST `Authorization` header
    pub token: String,
    pub env: Environment,
    pub gateway: GatewayConfig,
    pub reconnect: ReconnectConfig,
    pub rest: RestConfig,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::InvalidValue("CHAT_ENV", s.to_string())),
        }
    }
}

/// Properties reported in the IDENTIFY payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            browser: default_library_name(),
            device: default_library_name(),
        }
    }
}

/// Gateway connection configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Fixed gateway URL; resolved through `GET /gateway` when absent
    pub url: Option<String>,
    pub api_version: u8,
    pub intents: Intents,
    /// Member count above which a server is sent without offline members
    pub large_threshold: u32,
    /// `(shard_id, shard_count)`
    pub shard: Option<(u32, u32)>,
    pub properties: IdentifyProperties,
    /// Capacity of the event bus broadcast channel
    pub event_buffer: usize,
    /// Outbound frame budget per `frame_window`
    pub frame_limit: u32,
    pub frame_window: Duration,
    /// How long to wait for servers announced as unavailable in READY before giving up
    pub server_load_timeout: Duration,
}

impl GatewayConfig {
    /// Append version and encoding query parameters to a gateway base URL
    #[must_use]
    pub fn connect_url(&self, base: &str) -> String {
        format!(
            "{}/?v={}&encoding=json",
            base.trim_end_matches('/'),
            self.api_version
        )
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_version: default_api_version(),
            intents: Intents::default(),
            large_threshold: default_large_threshold(),
            shard: None,
            properties: IdentifyProperties::default(),
            event_buffer: default_event_buffer(),
            frame_limit: default_frame_limit(),
            frame_window: default_frame_window(),
            server_load_timeout: default_server_load_timeout(),
        }
    }
}

/// Reconnect and re-identify timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
    /// Random delay window before re-identifying after INVALID_SESSION
    pub invalid_session_delay_min: Duration,
    pub invalid_session_delay_max: Duration,
    /// Minimum spacing between two IDENTIFY frames
    pub identify_interval: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            max_attempts: None,
            invalid_session_delay_min: default_invalid_session_delay_min(),
            invalid_session_delay_max: default_invalid_session_delay_max(),
            identify_interval: default_identify_interval(),
        }
    }
}

/// REST client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Attempts allowed on a rate limited route before giving up
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            user_agent: default_user_agent(),
            max_retries: default_max_retries(),
            request_timeout: default_request_timeout(),
        }
    }
}

// Default value functions
fn default_library_name() -> String {
    "chat-gateway".to_string()
}

fn default_api_version() -> u8 {
    10
}

fn default_large_threshold() -> u32 {
    250
}

fn default_event_buffer() -> usize {
    1024
}

fn default_frame_limit() -> u32 {
    120
}

fn default_frame_window() -> Duration {
    Duration::from_secs(60)
}

fn default_server_load_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_invalid_session_delay_min() -> Duration {
    Duration::from_secs(1)
}

fn default_invalid_session_delay_max() -> Duration {
    Duration::from_secs(5)
}

fn default_identify_interval() -> Duration {
    Duration::from_millis(5100)
}

fn default_rest_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_user_agent() -> String {
    format!(
        "DiscordBot (https://github.com/chat-gateway, {})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl ClientConfig {
    /// Fully defaulted configuration for the given token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            env: Environment::default(),
            gateway: GatewayConfig::default(),
            reconnect: ReconnectConfig::default(),
            rest: RestConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CHAT_TOKEN` is missing or a variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &'static str| lookup(key).filter(|s| !s.trim().is_empty());

        let token = var("CHAT_TOKEN").ok_or(ConfigError::MissingVar("CHAT_TOKEN"))?;

        let env = var("CHAT_ENV")
            .map(|s| s.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let intents = parse::<u32>("CHAT_INTENTS", var("CHAT_INTENTS"))?
            .map_or_else(Intents::default, Intents::from_bits_truncate);

        let shard = var("CHAT_SHARD").map(|s| parse_shard(&s)).transpose()?;

        let gateway = GatewayConfig {
            url: var("CHAT_GATEWAY_URL"),
            api_version: parse("CHAT_API_VERSION", var("CHAT_API_VERSION"))?
                .unwrap_or_else(default_api_version),
            intents,
            large_threshold: parse("CHAT_LARGE_THRESHOLD", var("CHAT_LARGE_THRESHOLD"))?
                .unwrap_or_else(default_large_threshold),
            shard,
            properties: IdentifyProperties::default(),
            event_buffer: parse("CHAT_EVENT_BUFFER", var("CHAT_EVENT_BUFFER"))?
                .unwrap_or_else(default_event_buffer),
            frame_limit: default_frame_limit(),
            frame_window: default_frame_window(),
            server_load_timeout: parse::<u64>(
                "CHAT_SERVER_LOAD_TIMEOUT_MS",
                var("CHAT_SERVER_LOAD_TIMEOUT_MS"),
            )?
            .map_or_else(default_server_load_timeout, Duration::from_millis),
        };

        let millis = |key: &'static str, default: fn() -> Duration| {
            parse::<u64>(key, var(key)).map(|v| v.map_or_else(default, Duration::from_millis))
        };

        let reconnect = ReconnectConfig {
            initial_delay: millis("CHAT_RECONNECT_INITIAL_DELAY_MS", default_initial_delay)?,
            max_delay: millis("CHAT_RECONNECT_MAX_DELAY_MS", default_max_delay)?,
            max_attempts: parse("CHAT_RECONNECT_MAX_ATTEMPTS", var("CHAT_RECONNECT_MAX_ATTEMPTS"))?,
            invalid_session_delay_min: millis(
                "CHAT_INVALID_SESSION_DELAY_MIN_MS",
                default_invalid_session_delay_min,
            )?,
            invalid_session_delay_max: millis(
                "CHAT_INVALID_SESSION_DELAY_MAX_MS",
                default_invalid_session_delay_max,
            )?,
            identify_interval: millis("CHAT_IDENTIFY_INTERVAL_MS", default_identify_interval)?,
        };

        if reconnect.invalid_session_delay_min > reconnect.invalid_session_delay_max {
            return Err(ConfigError::InvalidValue(
                "CHAT_INVALID_SESSION_DELAY_MIN_MS",
                "greater than the maximum delay".to_string(),
            ));
        }

        let rest = RestConfig {
            base_url: var("CHAT_REST_BASE_URL").unwrap_or_else(default_rest_base_url),
            user_agent: var("CHAT_REST_USER_AGENT").unwrap_or_else(default_user_agent),
            max_retries: parse("CHAT_REST_MAX_RETRIES", var("CHAT_REST_MAX_RETRIES"))?
                .unwrap_or_else(default_max_retries),
            request_timeout: parse::<u64>(
                "CHAT_REST_TIMEOUT_SECS",
                var("CHAT_REST_TIMEOUT_SECS"),
            )?
            .map_or_else(default_request_timeout, Duration::from_secs),
        };

        Ok(Self {
            token,
            env,
            gateway,
            reconnect,
            rest,
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, s.clone()))
        })
        .transpose()
}

/// Parse `"<id>/<count>"`
fn parse_shard(s: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidValue("CHAT_SHARD", s.to_string());
    let (id, count) = s.split_once('/').ok_or_else(invalid)?;
    let id: u32 = id.trim().parse().map_err(|_| invalid())?;
    let count: u32 = count.trim().parse().map_err(|_| invalid())?;
    if count == 0 || id >= count {
        return Err(invalid());
    }
    Ok((id, count))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
