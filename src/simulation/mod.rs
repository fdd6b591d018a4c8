// Execution simulation against order book snapshots

pub mod order_book;
pub mod execution_simulator;

pub use order_book::{BookError, OrderBookLedger, OrderBookLevel, OrderBookSnapshot};
pub use execution_simulator::{
    ExecutionError, ExecutionReport, ExecutionSimulator, Fill, PartialFillWarning,
};
