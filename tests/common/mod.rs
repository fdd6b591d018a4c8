// Common test utilities and helpers
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trend_trading_bot::clients::{BookType, Candle, OrderConfirmation, RawLevel, Ticker};
use trend_trading_bot::config::CandleInterval;
use trend_trading_bot::{
    Config, MarketDataClient, OrderPlacementClient, PaperTradingClient, RetryPolicy, Side, Tick,
    TradingError, TradingResult,
};

/// Test configuration: BTC-LTC, window 3, fee 1%, starting with 100 LTC.
pub fn create_test_config(log_path: &Path) -> Config {
    let mut config = Config::default();
    config.session.window_size = 3;
    config.session.fee_rate = dec!(0.01);
    config.session.poll_interval_secs = 1;
    config.api.request_timeout_secs = 2;
    config.balances.base = Decimal::ZERO;
    config.balances.secondary = dec!(100);
    config.logging.execution_log = log_path.to_path_buf();
    config
}

/// Retry policy that does not slow the tests down.
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        attempts,
        std::time::Duration::from_millis(1),
        std::time::Duration::from_millis(5),
        2.0,
    )
    .with_jitter(false)
}

/// One tick per minute starting at a fixed time.
pub fn ticks_from_prices(prices: &[Decimal]) -> Vec<Tick> {
    let start = Utc.with_ymd_and_hms(2018, 1, 15, 8, 0, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| Tick::new(start + Duration::minutes(i as i64), price))
        .collect()
}

pub fn level(rate: Decimal, quantity: Decimal) -> RawLevel {
    RawLevel { quantity, rate }
}

/// Market data that replays a script of last prices, then fails.
pub struct ScriptedMarket {
    prices: Mutex<VecDeque<TradingResult<Decimal>>>,
    bids: Vec<RawLevel>,
    asks: Vec<RawLevel>,
    pub ticker_calls: AtomicUsize,
    pub book_calls: AtomicUsize,
}

impl ScriptedMarket {
    pub fn new(prices: &[Decimal]) -> Self {
        Self {
            prices: Mutex::new(prices.iter().map(|&p| Ok(p)).collect()),
            bids: Vec::new(),
            asks: Vec::new(),
            ticker_calls: AtomicUsize::new(0),
            book_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_bids(mut self, bids: Vec<RawLevel>) -> Self {
        self.bids = bids;
        self
    }

    pub fn with_asks(mut self, asks: Vec<RawLevel>) -> Self {
        self.asks = asks;
        self
    }

    pub fn push_error(&self, error: TradingError) {
        self.prices.lock().unwrap().push_back(Err(error));
    }

    pub fn push_price(&self, price: Decimal) {
        self.prices.lock().unwrap().push_back(Ok(price));
    }
}

#[async_trait]
impl MarketDataClient for ScriptedMarket {
    async fn get_ticker(&self, _market: &str) -> TradingResult<Ticker> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        // Keeps consecutive tick timestamps strictly increasing
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let next = self.prices.lock().unwrap().pop_front();
        match next {
            Some(Ok(last)) => Ok(Ticker { bid: last, ask: last, last }),
            Some(Err(e)) => Err(e),
            None => Err(TradingError::ApiConnection("script exhausted".to_string())),
        }
    }

    async fn get_order_book(&self, _market: &str, book: BookType) -> TradingResult<Vec<RawLevel>> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match book {
            BookType::Buy => self.bids.clone(),
            BookType::Sell => self.asks.clone(),
        })
    }

    async fn get_historical_candles(
        &self,
        _market: &str,
        _interval: CandleInterval,
    ) -> TradingResult<Vec<Candle>> {
        Ok(Vec::new())
    }
}

/// Paper client whose `fail_at`-th order (0-based) fails with `error`.
pub struct FailingOrders {
    inner: PaperTradingClient,
    fail_at: usize,
    error: fn() -> TradingError,
    placed: AtomicUsize,
}

impl FailingOrders {
    pub fn new(inner: PaperTradingClient, fail_at: usize, error: fn() -> TradingError) -> Self {
        Self {
            inner,
            fail_at,
            error,
            placed: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.placed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderPlacementClient for FailingOrders {
    async fn place_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        rate: Decimal,
    ) -> TradingResult<OrderConfirmation> {
        let index = self.placed.fetch_add(1, Ordering::SeqCst);
        if index == self.fail_at {
            return Err((self.error)());
        }
        self.inner.place_limit_order(market, side, quantity, rate).await
    }

    async fn get_balances(&self) -> TradingResult<HashMap<String, Decimal>> {
        self.inner.get_balances().await
    }

    fn is_paper(&self) -> bool {
        self.inner.is_paper()
    }
}
