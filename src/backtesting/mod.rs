// Backtesting data structures and types

pub mod engine;
pub mod analytics;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::clients::Candle;
use crate::config::{Config, PriceField};
use crate::core::portfolio::{PortfolioError, PortfolioState};
use crate::core::price_window::WindowError;
use crate::error::TradingResult;
use crate::simulation::execution_simulator::ExecutionError;
use crate::types::{HoldingSide, Side, Signal, Tick};

pub use analytics::{PerformanceAnalyzer, PerformanceMetrics};
pub use engine::BacktestRunner;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub window_size: usize,
    pub fee_rate: Decimal,
}

impl BacktestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window_size: config.session.window_size,
            fee_rate: config.session.fee_rate,
        }
    }

    pub fn with_window(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            fee_rate: Decimal::new(25, 4), // 0.25%
        }
    }
}

/// State of the replay after one accepted tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub signal: Signal,
    pub holding_side: HoldingSide,
    /// Wallet value in base currency at this tick's price.
    pub wallet_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub net_amount: Decimal,
    pub fee_paid: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub window_size: usize,
    pub fee_rate: Decimal,
    pub initial_portfolio: PortfolioState,
    pub final_portfolio: PortfolioState,
    pub initial_value: Decimal,
    pub final_value: Decimal,
    pub trades: Vec<BacktestTrade>,
    pub trace: Vec<TracePoint>,
    pub metrics: PerformanceMetrics,
}

impl BacktestResult {
    pub fn executions(&self) -> usize {
        self.trades.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacktestError {
    #[error("need at least {need} ticks for this window, got {have}")]
    InsufficientData { have: usize, need: usize },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Turn venue candles into ticks using the configured price field.
pub fn ticks_from_candles(candles: &[Candle], field: PriceField) -> TradingResult<Vec<Tick>> {
    candles.iter().map(|candle| candle.to_tick(field)).collect()
}
