//! Pre-flight validation module for the Trend Trading Bot
//!
//! Performs checks before a session starts so that configuration and
//! venue problems surface before any order is considered.

use std::time::Duration;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn, error};
use crate::clients::{BookType, MarketDataClient, OrderPlacementClient};
use crate::config::Config;
use crate::core::error_handling::with_timeout;
use crate::core::portfolio::PortfolioState;
use crate::simulation::order_book::{OrderBookLedger, OrderBookLevel, OrderBookSnapshot};

/// Validation result with detailed findings
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub passed: bool,
    pub checks: Vec<ValidationCheck>,
}

#[derive(Debug, Clone)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub level: ValidationLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Critical,  // Must pass for operation to proceed
    Warning,   // Should pass, but operation can continue
    Info,      // Informational only
}

impl ValidationCheck {
    fn new(name: &str, passed: bool, message: String, level: ValidationLevel) -> Self {
        Self {
            name: name.to_string(),
            passed,
            message,
            level,
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        ValidationResult {
            passed: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, check: ValidationCheck) {
        if !check.passed && check.level == ValidationLevel::Critical {
            self.passed = false;
        }
        self.checks.push(check);
    }

    pub fn critical_failures(&self) -> Vec<&ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Critical)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Warning)
            .collect()
    }

    pub fn display(&self) {
        info!("🔍 Pre-flight Validation");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        for check in &self.checks {
            let icon = match (check.passed, &check.level) {
                (_, ValidationLevel::Info) => "ℹ️",
                (true, _) => "✅",
                (false, ValidationLevel::Critical) => "❌",
                (false, ValidationLevel::Warning) => "⚠️",
            };

            info!("{} {} - {}", icon, check.name, check.message);
        }

        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if !self.passed {
            let failures = self.critical_failures();
            error!("❌ Validation failed: {} critical issue(s)", failures.len());
            for failure in failures {
                error!("   • {}: {}", failure.name, failure.message);
            }
        } else {
            let warnings = self.warnings();
            if !warnings.is_empty() {
                warn!("⚠️  {} warning(s) detected", warnings.len());
                for warning in warnings {
                    warn!("   • {}: {}", warning.name, warning.message);
                }
            }
            info!("✅ All critical checks passed");
        }
    }
}

/// Pre-flight validator for trading operations
pub struct PreFlightValidator {
    config: Config,
}

impl PreFlightValidator {
    pub fn new(config: Config) -> Self {
        PreFlightValidator { config }
    }

    /// Validate for backtesting (configuration only)
    pub fn validate_for_backtesting(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.add_check(self.check_config());
        result
    }

    /// Validate for live trading against the venue
    pub async fn validate_for_trading<M, O>(
        &self,
        market_data: &M,
        orders: &O,
        portfolio: &PortfolioState,
    ) -> ValidationResult
    where
        M: MarketDataClient,
        O: OrderPlacementClient,
    {
        let mut result = ValidationResult::new();

        let config_check = self.check_config();
        let config_ok = config_check.passed;
        result.add_check(config_check);
        if !config_ok {
            // Nothing below is meaningful without a valid market
            return result;
        }

        result.add_check(self.check_market(market_data).await);
        result.add_check(self.check_balances(orders, portfolio).await);
        result.add_check(self.check_order_book(market_data).await);
        result.add_check(self.check_order_placement(orders));

        result
    }

    // Individual check methods

    fn check_config(&self) -> ValidationCheck {
        match self.config.validate() {
            Ok(()) => ValidationCheck::new(
                "Configuration",
                true,
                format!(
                    "{} window {} fee {}",
                    self.config.session.market, self.config.session.window_size, self.config.session.fee_rate
                ),
                ValidationLevel::Critical,
            ),
            Err(e) => ValidationCheck::new("Configuration", false, e.to_string(), ValidationLevel::Critical),
        }
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.api.request_timeout_secs)
    }

    async fn check_market<M: MarketDataClient>(&self, market_data: &M) -> ValidationCheck {
        let market = &self.config.session.market;
        match with_timeout(self.call_timeout(), "get_ticker", market_data.get_ticker(market)).await {
            Ok(ticker) => ValidationCheck::new(
                "Market",
                true,
                format!("{} last {} (bid {}, ask {})", market, ticker.last, ticker.bid, ticker.ask),
                ValidationLevel::Critical,
            ),
            Err(e) => ValidationCheck::new(
                "Market",
                false,
                format!("Cannot read ticker for {}: {}", market, e),
                ValidationLevel::Critical,
            ),
        }
    }

    async fn check_balances<O: OrderPlacementClient>(
        &self,
        orders: &O,
        portfolio: &PortfolioState,
    ) -> ValidationCheck {
        let Some((base, secondary)) = self.config.session.currencies() else {
            return ValidationCheck::new(
                "Balances",
                false,
                "Market has no currency pair".to_string(),
                ValidationLevel::Critical,
            );
        };

        let balances = match with_timeout(self.call_timeout(), "get_balances", orders.get_balances()).await {
            Ok(balances) => balances,
            Err(e) => {
                return ValidationCheck::new(
                    "Balances",
                    false,
                    format!("Cannot read balances: {}", e),
                    ValidationLevel::Critical,
                )
            }
        };

        let held = |currency: &str| balances.get(currency).copied().unwrap_or(Decimal::ZERO);
        let mut shortfalls = Vec::new();
        if held(base) < portfolio.base_balance() {
            shortfalls.push(format!("{} {} < {}", base, held(base), portfolio.base_balance()));
        }
        if held(secondary) < portfolio.secondary_balance() {
            shortfalls.push(format!(
                "{} {} < {}",
                secondary,
                held(secondary),
                portfolio.secondary_balance()
            ));
        }

        if shortfalls.is_empty() {
            ValidationCheck::new(
                "Balances",
                true,
                format!("{} {}, {} {} available", base, held(base), secondary, held(secondary)),
                ValidationLevel::Critical,
            )
        } else {
            ValidationCheck::new(
                "Balances",
                false,
                format!("Venue holds less than the session starts with: {}", shortfalls.join(", ")),
                ValidationLevel::Critical,
            )
        }
    }

    async fn check_order_book<M: MarketDataClient>(&self, market_data: &M) -> ValidationCheck {
        let market = &self.config.session.market;
        let bids = with_timeout(
            self.call_timeout(),
            "get_order_book",
            market_data.get_order_book(market, BookType::Buy),
        )
        .await;
        let asks = with_timeout(
            self.call_timeout(),
            "get_order_book",
            market_data.get_order_book(market, BookType::Sell),
        )
        .await;

        let (bids, asks) = match (bids, asks) {
            (Ok(bids), Ok(asks)) => (bids, asks),
            (Err(e), _) | (_, Err(e)) => {
                return ValidationCheck::new(
                    "Order Book",
                    false,
                    format!("Cannot read order book: {}", e),
                    ValidationLevel::Warning,
                )
            }
        };

        let book = OrderBookLedger::from_snapshot(OrderBookSnapshot {
            market: market.clone(),
            bids: bids.into_iter().map(OrderBookLevel::from).collect(),
            asks: asks.into_iter().map(OrderBookLevel::from).collect(),
            timestamp: Utc::now(),
        });

        match book {
            Ok(book) if book.is_empty() => ValidationCheck::new(
                "Order Book",
                false,
                format!("{} book is empty", market),
                ValidationLevel::Warning,
            ),
            Ok(book) => {
                let (bid_levels, ask_levels) = book.depth();
                match book.spread() {
                    Some(spread) => ValidationCheck::new(
                        "Order Book",
                        true,
                        format!("{} bid / {} ask levels, spread {}", bid_levels, ask_levels, spread),
                        ValidationLevel::Warning,
                    ),
                    None => ValidationCheck::new(
                        "Order Book",
                        false,
                        format!("Thin book: {} bid / {} ask levels", bid_levels, ask_levels),
                        ValidationLevel::Warning,
                    ),
                }
            }
            Err(e) => ValidationCheck::new(
                "Order Book",
                false,
                format!("Unusable order book: {}", e),
                ValidationLevel::Warning,
            ),
        }
    }

    fn check_order_placement<O: OrderPlacementClient>(&self, orders: &O) -> ValidationCheck {
        let message = if orders.is_paper() {
            "Paper trading: orders fill against in-memory balances".to_string()
        } else {
            format!("Orders for {} go to the venue", self.config.session.market)
        };
        ValidationCheck::new("Order Placement", true, message, ValidationLevel::Info)
    }
}
