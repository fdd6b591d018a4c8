// Configuration management for the trend trading bot

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

/// Candle width accepted by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandleInterval {
    OneMin,
    FiveMin,
    ThirtyMin,
    Hour,
    Day,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMin => "oneMin",
            CandleInterval::FiveMin => "fiveMin",
            CandleInterval::ThirtyMin => "thirtyMin",
            CandleInterval::Hour => "hour",
            CandleInterval::Day => "day",
        }
    }
}

/// Which candle price becomes the tick price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    #[serde(alias = "O")]
    Open,
    #[serde(alias = "H")]
    High,
    #[serde(alias = "L")]
    Low,
    #[serde(alias = "C")]
    Close,
}

/// What to do when the book cannot fill the whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFillPolicy {
    /// Take what the book offers and keep the remainder.
    Accept,
    /// Skip the cycle unless the whole order fills.
    RequireFull,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub market: String,
    #[serde(default = "default_candle_interval")]
    pub candle_interval: CandleInterval,
    #[serde(default = "default_price_field")]
    pub price_field: PriceField,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_partial_fill_policy")]
    pub partial_fill_policy: PartialFillPolicy,
    #[serde(default)]
    pub resume: bool,
}

impl SessionConfig {
    /// Split "BTC-LTC" into ("BTC", "LTC"): base first, secondary second.
    pub fn currencies(&self) -> Option<(&str, &str)> {
        let (base, secondary) = self.market.split_once('-')?;
        if base.is_empty() || secondary.is_empty() || secondary.contains('-') {
            return None;
        }
        Some((base, secondary))
    }
}

/// Starting balances of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesConfig {
    #[serde(default)]
    pub base: Decimal,
    #[serde(default)]
    pub secondary: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_history_url")]
    pub history_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_order_book_depth")]
    pub order_book_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_execution_log")]
    pub execution_log: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub balances: BalancesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default value functions
fn default_candle_interval() -> CandleInterval { CandleInterval::OneMin }
fn default_price_field() -> PriceField { PriceField::Open }
fn default_window_size() -> usize { 20 }
fn default_fee_rate() -> Decimal { dec!(0.0025) }
fn default_poll_interval() -> u64 { 60 }
fn default_partial_fill_policy() -> PartialFillPolicy { PartialFillPolicy::Accept }
fn default_rest_url() -> String { "https://bittrex.com/api/v1.1".to_string() }
fn default_history_url() -> String { "https://bittrex.com/Api/v2.0".to_string() }
fn default_request_timeout() -> u64 { 10 }
fn default_order_book_depth() -> usize { 20 }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 500 }
fn default_max_delay_ms() -> u64 { 30_000 }
fn default_multiplier() -> f64 { 2.0 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_execution_log() -> PathBuf { PathBuf::from("logs/executions.jsonl") }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            history_url: default_history_url(),
            request_timeout_secs: default_request_timeout(),
            order_book_depth: default_order_book_depth(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            execution_log: default_execution_log(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                market: "BTC-LTC".to_string(),
                candle_interval: default_candle_interval(),
                price_field: default_price_field(),
                window_size: default_window_size(),
                fee_rate: default_fee_rate(),
                poll_interval_secs: default_poll_interval(),
                partial_fill_policy: default_partial_fill_policy(),
                resume: false,
            },
            balances: BalancesConfig {
                base: Decimal::ZERO,
                secondary: dec!(100),
            },
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::FileWrite(e.to_string()))?;
            }
        }

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.currencies().is_none() {
            return Err(ConfigError::Validation(format!(
                "market must look like BASE-SECONDARY, got '{}'",
                self.session.market
            )));
        }

        if self.session.window_size == 0 {
            return Err(ConfigError::Validation("window_size must be greater than 0".to_string()));
        }

        if self.session.fee_rate < Decimal::ZERO || self.session.fee_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(format!(
                "fee_rate must be in [0, 1), got {}",
                self.session.fee_rate
            )));
        }

        if self.session.poll_interval_secs == 0 {
            return Err(ConfigError::Validation("poll_interval_secs must be greater than 0".to_string()));
        }

        if self.balances.base < Decimal::ZERO || self.balances.secondary < Decimal::ZERO {
            return Err(ConfigError::Validation("balances must be non-negative".to_string()));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Validation("request_timeout_secs must be greater than 0".to_string()));
        }

        if self.api.order_book_depth == 0 {
            return Err(ConfigError::Validation("order_book_depth must be greater than 0".to_string()));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Validation("retry.max_attempts must be at least 1".to_string()));
        }

        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::Validation("retry.multiplier must be at least 1.0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
