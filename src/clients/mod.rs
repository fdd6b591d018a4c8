// External API clients

pub mod bittrex_api;
pub mod paper;

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::config::{CandleInterval, PriceField};
use crate::error::{TradingError, TradingResult};
use crate::simulation::order_book::OrderBookLevel;
use crate::types::{Side, Tick};

pub use bittrex_api::BittrexClient;
pub use paper::PaperTradingClient;

/// Last traded, best bid and best ask prices of a market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(rename = "Bid")]
    pub bid: Decimal,
    #[serde(rename = "Ask")]
    pub ask: Decimal,
    #[serde(rename = "Last")]
    pub last: Decimal,
}

/// One order book entry as the venue reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLevel {
    #[serde(rename = "Quantity")]
    pub quantity: Decimal,
    #[serde(rename = "Rate")]
    pub rate: Decimal,
}

impl From<RawLevel> for OrderBookLevel {
    fn from(level: RawLevel) -> Self {
        OrderBookLevel::new(level.rate, level.quantity)
    }
}

/// Which half of the book to fetch. The "buy" book holds bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookType {
    Buy,
    Sell,
}

impl BookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookType::Buy => "buy",
            BookType::Sell => "sell",
        }
    }

    /// Book an order on `side` executes against: selling hits the bids.
    pub fn counterparty_of(side: Side) -> Self {
        match side {
            Side::Sell => BookType::Buy,
            Side::Buy => BookType::Sell,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "T")]
    pub time: String,
    #[serde(rename = "O")]
    pub open: Decimal,
    #[serde(rename = "H")]
    pub high: Decimal,
    #[serde(rename = "L")]
    pub low: Decimal,
    #[serde(rename = "C")]
    pub close: Decimal,
    #[serde(rename = "V", default)]
    pub volume: Decimal,
    #[serde(rename = "BV", default)]
    pub book_value: Decimal,
}

impl Candle {
    /// Candle start time. The venue sends no zone; it is UTC.
    pub fn timestamp(&self) -> TradingResult<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| TradingError::ApiResponse(format!("bad candle time '{}': {}", self.time, e)))
    }

    pub fn price(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    pub fn to_tick(&self, field: PriceField) -> TradingResult<Tick> {
        Ok(Tick::new(self.timestamp()?, self.price(field)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub market: String,
    pub side: Side,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Read-only market data source.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn get_ticker(&self, market: &str) -> TradingResult<Ticker>;

    async fn get_order_book(&self, market: &str, book: BookType) -> TradingResult<Vec<RawLevel>>;

    async fn get_historical_candles(
        &self,
        market: &str,
        interval: CandleInterval,
    ) -> TradingResult<Vec<Candle>>;
}

/// Order submission and account balances.
#[async_trait]
pub trait OrderPlacementClient: Send + Sync {
    async fn place_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        rate: Decimal,
    ) -> TradingResult<OrderConfirmation>;

    /// Available balance per currency code.
    async fn get_balances(&self) -> TradingResult<HashMap<String, Decimal>>;

    /// True when orders never reach a real venue.
    fn is_paper(&self) -> bool {
        false
    }
}

#[async_trait]
impl<T: MarketDataClient + ?Sized> MarketDataClient for Arc<T> {
    async fn get_ticker(&self, market: &str) -> TradingResult<Ticker> {
        (**self).get_ticker(market).await
    }

    async fn get_order_book(&self, market: &str, book: BookType) -> TradingResult<Vec<RawLevel>> {
        (**self).get_order_book(market, book).await
    }

    async fn get_historical_candles(
        &self,
        market: &str,
        interval: CandleInterval,
    ) -> TradingResult<Vec<Candle>> {
        (**self).get_historical_candles(market, interval).await
    }
}

#[async_trait]
impl<T: OrderPlacementClient + ?Sized> OrderPlacementClient for Arc<T> {
    async fn place_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        rate: Decimal,
    ) -> TradingResult<OrderConfirmation> {
        (**self).place_limit_order(market, side, quantity, rate).await
    }

    async fn get_balances(&self) -> TradingResult<HashMap<String, Decimal>> {
        (**self).get_balances().await
    }

    fn is_paper(&self) -> bool {
        (**self).is_paper()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_candle_parses_bittrex_fields() {
        let candle: Candle = serde_json::from_str(
            r#"{"O":0.0123,"H":0.0125,"L":0.0121,"C":0.0124,"V":1500.5,"T":"2018-01-15T08:30:00","BV":18.6}"#,
        )
        .unwrap();

        assert_eq!(candle.price(PriceField::Open), dec!(0.0123));
        assert_eq!(candle.price(PriceField::Close), dec!(0.0124));

        let tick = candle.to_tick(PriceField::Open).unwrap();
        assert_eq!(tick.timestamp.to_rfc3339(), "2018-01-15T08:30:00+00:00");
    }

    #[test]
    fn test_bad_candle_time_is_response_error() {
        let candle = Candle {
            time: "yesterday".to_string(),
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: dec!(0),
            book_value: dec!(0),
        };
        assert!(matches!(candle.timestamp(), Err(TradingError::ApiResponse(_))));
    }

    #[test]
    fn test_counterparty_book() {
        assert_eq!(BookType::counterparty_of(Side::Sell), BookType::Buy);
        assert_eq!(BookType::counterparty_of(Side::Buy), BookType::Sell);
    }
}
