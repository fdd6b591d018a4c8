// Order Book Ledger
// Normalized bid/ask ladder rebuilt from each venue snapshot

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::types::Side;

/// Represents a single price level in the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderBookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// Raw ladder as delivered by the market-data collaborator.
/// Levels may arrive in any order; the ledger sorts them.
#[derive(Debug, Clone)]
pub struct OrderBookSnapshot {
    pub market: String,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookError {
    #[error("Malformed order book: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    fn name(&self) -> &'static str {
        match self {
            BookSide::Bid => "bid",
            BookSide::Ask => "ask",
        }
    }
}

/// Validated order book for one market.
///
/// Both sides are keyed by price, so out-of-order input is repaired by
/// construction. Bids are read highest first, asks lowest first.
#[derive(Debug, Clone)]
pub struct OrderBookLedger {
    pub market: String,
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl OrderBookLedger {
    pub fn from_snapshot(snapshot: OrderBookSnapshot) -> Result<Self, BookError> {
        let bids = Self::build_side(BookSide::Bid, &snapshot.bids)?;
        let asks = Self::build_side(BookSide::Ask, &snapshot.asks)?;

        let ledger = Self {
            market: snapshot.market,
            bids,
            asks,
            timestamp: snapshot.timestamp,
        };

        if let (Some(bid), Some(ask)) = (ledger.best_bid(), ledger.best_ask()) {
            if bid.price >= ask.price {
                return Err(BookError::Malformed(format!(
                    "crossed book: best bid ({}) >= best ask ({})",
                    bid.price, ask.price
                )));
            }
        }

        Ok(ledger)
    }

    fn build_side(
        side: BookSide,
        levels: &[OrderBookLevel],
    ) -> Result<BTreeMap<Decimal, Decimal>, BookError> {
        let mut ladder = BTreeMap::new();

        for level in levels {
            if level.price <= Decimal::ZERO {
                return Err(BookError::Malformed(format!(
                    "non-positive {} price {}",
                    side.name(),
                    level.price
                )));
            }
            if level.quantity <= Decimal::ZERO {
                return Err(BookError::Malformed(format!(
                    "non-positive {} quantity {} at {}",
                    side.name(),
                    level.quantity,
                    level.price
                )));
            }
            if ladder.insert(level.price, level.quantity).is_some() {
                return Err(BookError::Malformed(format!(
                    "duplicate {} level at {}",
                    side.name(),
                    level.price
                )));
            }
        }

        Ok(ladder)
    }

    /// Get best bid (highest bid price)
    pub fn best_bid(&self) -> Option<OrderBookLevel> {
        self.bids
            .iter()
            .next_back()
            .map(|(&price, &quantity)| OrderBookLevel { price, quantity })
    }

    /// Get best ask (lowest ask price)
    pub fn best_ask(&self) -> Option<OrderBookLevel> {
        self.asks
            .iter()
            .next()
            .map(|(&price, &quantity)| OrderBookLevel { price, quantity })
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Levels usable for a trade on `side`, best price first.
    ///
    /// Selling consumes bids priced at or above the threshold; buying consumes
    /// asks priced at or below it. Without a threshold the whole side qualifies.
    pub fn levels_at_or_better(&self, side: Side, threshold: Option<Decimal>) -> Vec<OrderBookLevel> {
        let to_level = |(&price, &quantity): (&Decimal, &Decimal)| OrderBookLevel { price, quantity };

        match (side, threshold) {
            (Side::Sell, Some(limit)) => self.bids.range(limit..).rev().map(to_level).collect(),
            (Side::Sell, None) => self.bids.iter().rev().map(to_level).collect(),
            (Side::Buy, Some(limit)) => self.asks.range(..=limit).map(to_level).collect(),
            (Side::Buy, None) => self.asks.iter().map(to_level).collect(),
        }
    }

    /// Get order book depth (number of price levels)
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, quantity: Decimal) -> OrderBookLevel {
        OrderBookLevel::new(price, quantity)
    }

    fn snapshot(bids: Vec<OrderBookLevel>, asks: Vec<OrderBookLevel>) -> OrderBookSnapshot {
        OrderBookSnapshot {
            market: "BTC-LTC".to_string(),
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_unsorted_levels_are_repaired() {
        let book = OrderBookLedger::from_snapshot(snapshot(
            vec![level(dec!(99), dec!(1)), level(dec!(100), dec!(2)), level(dec!(98), dec!(3))],
            vec![level(dec!(103), dec!(1)), level(dec!(101), dec!(2))],
        ))
        .unwrap();

        assert_eq!(book.best_bid().unwrap().price, dec!(100));
        assert_eq!(book.best_ask().unwrap().price, dec!(101));
        assert_eq!(book.spread(), Some(dec!(1)));

        let bids: Vec<Decimal> = book
            .levels_at_or_better(Side::Sell, None)
            .iter()
            .map(|l| l.price)
            .collect();
        assert_eq!(bids, vec![dec!(100), dec!(99), dec!(98)]);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let err = OrderBookLedger::from_snapshot(snapshot(
            vec![level(dec!(100), dec!(0))],
            vec![],
        ))
        .unwrap_err();
        assert!(matches!(err, BookError::Malformed(msg) if msg.contains("quantity")));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let err = OrderBookLedger::from_snapshot(snapshot(
            vec![],
            vec![level(dec!(-1), dec!(1))],
        ))
        .unwrap_err();
        assert!(matches!(err, BookError::Malformed(msg) if msg.contains("price")));
    }

    #[test]
    fn test_duplicate_and_crossed_books_rejected() {
        assert!(OrderBookLedger::from_snapshot(snapshot(
            vec![level(dec!(100), dec!(1)), level(dec!(100), dec!(2))],
            vec![],
        ))
        .is_err());

        assert!(OrderBookLedger::from_snapshot(snapshot(
            vec![level(dec!(102), dec!(1))],
            vec![level(dec!(101), dec!(1))],
        ))
        .is_err());
    }

    #[test]
    fn test_levels_at_or_better_respects_threshold() {
        let book = OrderBookLedger::from_snapshot(snapshot(
            vec![level(dec!(100), dec!(1)), level(dec!(99), dec!(2)), level(dec!(98), dec!(3))],
            vec![level(dec!(101), dec!(1)), level(dec!(102), dec!(2)), level(dec!(103), dec!(3))],
        ))
        .unwrap();

        let sells = book.levels_at_or_better(Side::Sell, Some(dec!(99)));
        assert_eq!(sells, vec![level(dec!(100), dec!(1)), level(dec!(99), dec!(2))]);

        let buys = book.levels_at_or_better(Side::Buy, Some(dec!(102)));
        assert_eq!(buys, vec![level(dec!(101), dec!(1)), level(dec!(102), dec!(2))]);

        assert!(book.levels_at_or_better(Side::Buy, Some(dec!(100))).is_empty());
        assert_eq!(book.depth(), (3, 3));
    }
}
