// Common types used across the application

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Balances at or below this amount count as empty (one satoshi).
pub const DUST_TOLERANCE: Decimal = dec!(0.00000001);

/// Decimal places used when sizing orders from a currency budget.
pub const QUANTITY_SCALE: u32 = 8;

/// Smallest order quantity at `QUANTITY_SCALE`.
pub const QUANTITY_STEP: Decimal = dec!(0.00000001);

/// A single observed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

impl Tick {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}

/// Direction of a trade, seen from the secondary (traded) currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,  // spend base, receive secondary
    Sell, // spend secondary, receive base
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Which currency the portfolio currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingSide {
    Base,
    Secondary,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    /// The trade side this signal asks for, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Neutral => None,
        }
    }
}

/// Outcome of one evaluation cycle. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalDecision {
    pub signal: Signal,
    pub price: Decimal,
    pub average: Decimal,
}

impl SignalDecision {
    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::Neutral
    }
}
