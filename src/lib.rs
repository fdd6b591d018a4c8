// Trend Trading Bot Library
//
// A moving-average crossover bot for Bittrex markets with order-book-aware
// execution, historical backtesting and a paper trading client

pub mod types;
pub mod core;
pub mod simulation;
pub mod clients;
pub mod config;
pub mod error;       // Unified error handling
pub mod logging;
pub mod validation;  // Pre-flight validation
pub mod progress;
pub mod backtesting;
pub mod optimization;

// Re-export core trading types
pub use types::{HoldingSide, Side, Signal, SignalDecision, Tick};
pub use core::{
    ExecutionLog, LiveTrader, LiveTraderConfig, PortfolioState, PriceWindow, RetryPolicy,
    SessionSummary, ShutdownSignal, SignalEngine,
};
pub use simulation::{ExecutionReport, ExecutionSimulator, OrderBookLedger};

// Re-export error types
pub use error::{TradingError, TradingResult};

// Re-export validation types
pub use validation::{PreFlightValidator, ValidationResult, ValidationCheck, ValidationLevel};

// Re-export client types
pub use clients::{BittrexClient, MarketDataClient, OrderPlacementClient, PaperTradingClient};

// Re-export configuration
pub use config::{Config, ConfigError};

// Re-export progress helpers
pub use progress::{Spinner, SweepProgress};

// Re-export backtesting components
pub use backtesting::{BacktestConfig, BacktestError, BacktestResult, BacktestRunner, PerformanceMetrics};

// Re-export optimization components
pub use optimization::{SweepOutcome, SweepReport, WindowRange, WindowSweep};
