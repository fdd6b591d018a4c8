//! Crate-wide error type for the trend trading bot
//!
//! Module errors (`WindowError`, `BookError`, `ExecutionError`, ...) stay
//! precise inside their modules and convert into `TradingError` at the
//! session boundary, where the retry and skip decisions are made.

use std::fmt;
use std::io;
use rust_decimal::Decimal;
use crate::backtesting::BacktestError;
use crate::config::ConfigError;
use crate::core::execution_log::LogError;
use crate::core::portfolio::PortfolioError;
use crate::core::price_window::WindowError;
use crate::simulation::execution_simulator::ExecutionError;
use crate::simulation::order_book::BookError;

/// Main error type for the trend trading bot
#[derive(Debug)]
pub enum TradingError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // API errors
    ApiConnection(String),
    ApiAuthentication(String),
    ApiRateLimit(String),
    ApiResponse(String),
    ApiTimeout(String),

    /// A collaborator call that failed for good, after `attempts` tries.
    CallFailed {
        operation: String,
        attempts: u32,
        source: Box<TradingError>,
    },

    // Validation errors
    ValidationFailed(String),

    // Signal and execution errors
    InvalidParameter(String, String), // (parameter_name, reason)
    WindowNotWarm(usize, usize),      // (have, need)
    MalformedBook(String),
    EmptyBook(String),
    InvalidQuantity(Decimal),
    InsufficientFunds {
        currency: String,
        required: Decimal,
        available: Decimal,
    },
    OrderRejected(String),
    InsufficientData(String),

    // IO errors
    FileNotFound(String),
    FileRead(String),
    FileWrite(String),
    ExecutionLog(String),

    // General errors
    Internal(String),
}

impl TradingError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            TradingError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: trend-bot init\n\
                    2. Edit config.toml with your market and balances\n\
                    3. Try again",
                    path
                )
            }
            TradingError::ConfigValidation(msg) => {
                format!(
                    "Configuration validation error: {}\n\n\
                    💡 Check config.toml for:\n\
                    - A window size of at least 1\n\
                    - A fee rate in [0, 1)\n\
                    - Non-negative starting balances",
                    msg
                )
            }
            TradingError::ApiAuthentication(msg) => {
                format!(
                    "API authentication failed: {}\n\n\
                    💡 Public market data needs no key; check api.rest_url \
                    points at the exchange and not a private endpoint",
                    msg
                )
            }
            TradingError::InsufficientFunds { currency, required, available } => {
                format!(
                    "Insufficient {} funds for operation\n\
                    Required: {}\n\
                    Available: {}\n\n\
                    💡 Either:\n\
                    - Fund the account on the exchange\n\
                    - Lower the [balances] section in config.toml",
                    currency, required, available
                )
            }
            TradingError::ApiRateLimit(msg) => {
                format!(
                    "API rate limit exceeded: {}\n\n\
                    💡 Raise session.poll_interval_secs or wait before retrying",
                    msg
                )
            }
            TradingError::CallFailed { source, .. } if source.is_retryable() => {
                format!(
                    "{}\n\n💡 The exchange did not answer in time; check connectivity \
                    or raise [retry] max_attempts",
                    self
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TradingError::ApiTimeout(_)
                | TradingError::ApiConnection(_)
                | TradingError::ApiRateLimit(_)
        )
    }

    /// Errors that only spoil the current poll cycle; the session carries on.
    pub fn is_cycle_local(&self) -> bool {
        matches!(
            self,
            TradingError::MalformedBook(_)
                | TradingError::EmptyBook(_)
                | TradingError::InvalidQuantity(_)
                | TradingError::WindowNotWarm(_, _)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TradingError::ConfigNotFound(_)
            | TradingError::ConfigParse(_)
            | TradingError::ConfigValidation(_) => "config",

            TradingError::ApiConnection(_)
            | TradingError::ApiAuthentication(_)
            | TradingError::ApiRateLimit(_)
            | TradingError::ApiResponse(_)
            | TradingError::ApiTimeout(_)
            | TradingError::CallFailed { .. } => "api",

            TradingError::ValidationFailed(_) => "validation",

            TradingError::InvalidParameter(_, _)
            | TradingError::WindowNotWarm(_, _)
            | TradingError::InsufficientData(_) => "signal",

            TradingError::MalformedBook(_)
            | TradingError::EmptyBook(_)
            | TradingError::InvalidQuantity(_)
            | TradingError::InsufficientFunds { .. }
            | TradingError::OrderRejected(_) => "trading",

            TradingError::FileNotFound(_)
            | TradingError::FileRead(_)
            | TradingError::FileWrite(_)
            | TradingError::ExecutionLog(_) => "io",

            TradingError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for TradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            TradingError::ConfigParse(msg) => {
                write!(f, "Configuration parse error: {}", msg)
            }
            TradingError::ConfigValidation(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }

            TradingError::ApiConnection(msg) => {
                write!(f, "API connection error: {}", msg)
            }
            TradingError::ApiAuthentication(msg) => {
                write!(f, "API authentication failed: {}", msg)
            }
            TradingError::ApiRateLimit(msg) => {
                write!(f, "API rate limit exceeded: {}", msg)
            }
            TradingError::ApiResponse(msg) => {
                write!(f, "API response error: {}", msg)
            }
            TradingError::ApiTimeout(msg) => {
                write!(f, "API timeout: {}", msg)
            }
            TradingError::CallFailed { operation, attempts, source } => {
                write!(
                    f,
                    "{} failed after {} attempt{}: {}",
                    operation,
                    attempts,
                    if *attempts == 1 { "" } else { "s" },
                    source
                )
            }

            TradingError::ValidationFailed(msg) => {
                write!(f, "Validation failed: {}", msg)
            }
            TradingError::InvalidParameter(param, reason) => {
                write!(f, "Invalid parameter '{}': {}", param, reason)
            }
            TradingError::WindowNotWarm(have, need) => {
                write!(f, "Price window not warm: {} of {} samples", have, need)
            }
            TradingError::MalformedBook(msg) => {
                write!(f, "Malformed order book: {}", msg)
            }
            TradingError::EmptyBook(side) => {
                write!(f, "No qualifying {} levels in the order book", side)
            }
            TradingError::InvalidQuantity(quantity) => {
                write!(f, "Invalid execution quantity: {}", quantity)
            }
            TradingError::InsufficientFunds { currency, required, available } => {
                write!(
                    f,
                    "Insufficient {} funds: required {}, available {}",
                    currency, required, available
                )
            }
            TradingError::OrderRejected(msg) => {
                write!(f, "Order rejected: {}", msg)
            }
            TradingError::InsufficientData(msg) => {
                write!(f, "Insufficient data: {}", msg)
            }

            TradingError::FileNotFound(path) => {
                write!(f, "File not found: {}", path)
            }
            TradingError::FileRead(msg) => {
                write!(f, "File read error: {}", msg)
            }
            TradingError::FileWrite(msg) => {
                write!(f, "File write error: {}", msg)
            }
            TradingError::ExecutionLog(msg) => {
                write!(f, "Execution log error: {}", msg)
            }

            TradingError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TradingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TradingError::CallFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// Conversion implementations for common error types

impl From<io::Error> for TradingError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => TradingError::FileNotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => TradingError::FileRead(err.to_string()),
            io::ErrorKind::TimedOut => TradingError::ApiTimeout(err.to_string()),
            io::ErrorKind::ConnectionRefused => TradingError::ApiConnection(err.to_string()),
            _ => TradingError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::ApiResponse(format!("JSON parse error: {}", err))
    }
}

impl From<toml::de::Error> for TradingError {
    fn from(err: toml::de::Error) -> Self {
        TradingError::ConfigParse(format!("TOML parse error: {}", err))
    }
}

impl From<reqwest::Error> for TradingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TradingError::ApiTimeout(err.to_string())
        } else if err.is_connect() {
            TradingError::ApiConnection(err.to_string())
        } else if err.is_status() {
            match err.status().map(|s| s.as_u16()) {
                Some(401) | Some(403) => TradingError::ApiAuthentication(err.to_string()),
                Some(429) => TradingError::ApiRateLimit(err.to_string()),
                Some(code) if code >= 500 => TradingError::ApiConnection(err.to_string()),
                _ => TradingError::ApiResponse(err.to_string()),
            }
        } else if err.is_decode() {
            TradingError::ApiResponse(err.to_string())
        } else {
            TradingError::ApiConnection(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for TradingError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        TradingError::ApiTimeout(err.to_string())
    }
}

impl From<ConfigError> for TradingError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::FileNotFound(path) => TradingError::ConfigNotFound(path),
            ConfigError::FileRead(msg) => TradingError::FileRead(msg),
            ConfigError::FileWrite(msg) => TradingError::FileWrite(msg),
            ConfigError::Parse(msg) | ConfigError::Serialize(msg) => TradingError::ConfigParse(msg),
            ConfigError::Validation(msg) => TradingError::ConfigValidation(msg),
        }
    }
}

impl From<WindowError> for TradingError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::ZeroCapacity => {
                TradingError::InvalidParameter("window_size".to_string(), err.to_string())
            }
            WindowError::NotWarm { have, need } => TradingError::WindowNotWarm(have, need),
        }
    }
}

impl From<BookError> for TradingError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Malformed(msg) => TradingError::MalformedBook(msg),
        }
    }
}

impl From<ExecutionError> for TradingError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::EmptyBook(side) => TradingError::EmptyBook(side.to_string()),
            ExecutionError::InvalidQuantity(quantity) => TradingError::InvalidQuantity(quantity),
        }
    }
}

impl From<PortfolioError> for TradingError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::InsufficientBalance { currency, required, available } => {
                TradingError::InsufficientFunds {
                    currency: currency.to_string(),
                    required,
                    available,
                }
            }
            PortfolioError::NegativeBalance { .. } => {
                TradingError::ConfigValidation(err.to_string())
            }
            PortfolioError::EmptyExecution => TradingError::Internal(err.to_string()),
        }
    }
}

impl From<BacktestError> for TradingError {
    fn from(err: BacktestError) -> Self {
        match err {
            BacktestError::InsufficientData { .. } => TradingError::InsufficientData(err.to_string()),
            BacktestError::Window(inner) => inner.into(),
            BacktestError::Portfolio(inner) => inner.into(),
            BacktestError::Execution(inner) => inner.into(),
        }
    }
}

impl From<LogError> for TradingError {
    fn from(err: LogError) -> Self {
        TradingError::ExecutionLog(err.to_string())
    }
}

impl From<String> for TradingError {
    fn from(msg: String) -> Self {
        TradingError::Internal(msg)
    }
}

impl From<&str> for TradingError {
    fn from(msg: &str) -> Self {
        TradingError::Internal(msg.to_string())
    }
}

/// Result type alias using TradingError
pub type TradingResult<T> = Result<T, TradingError>;
