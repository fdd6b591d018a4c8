// Core trading logic modules

pub mod price_window;
pub mod portfolio;
pub mod signal_engine;
pub mod execution_log;
pub mod error_handling;
pub mod live_trading;

// Re-export commonly used types
pub use price_window::{PriceWindow, WindowError};
pub use portfolio::{BalanceChange, PortfolioError, PortfolioState};
pub use signal_engine::{SignalEngine, TickOutcome};
pub use execution_log::{ExecutionLog, ExecutionRecord, LogRecord};
pub use error_handling::{RetryPolicy, ShutdownSignal};
pub use live_trading::{CycleOutcome, LiveTrader, LiveTraderConfig, SessionSummary};
