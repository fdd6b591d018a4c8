// Pre-flight validation against scripted market data and paper balances

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use trend_trading_bot::{PaperTradingClient, PortfolioState, PreFlightValidator, ValidationLevel};
use common::{create_test_config, level, ScriptedMarket};

fn market_with_book() -> ScriptedMarket {
    ScriptedMarket::new(&[dec!(10)])
        .with_bids(vec![level(dec!(9.9), dec!(50))])
        .with_asks(vec![level(dec!(10.1), dec!(50))])
}

#[tokio::test]
async fn test_funded_session_passes() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("executions.jsonl"));
    let orders = PaperTradingClient::new(dec!(0.01)).with_balance("LTC", dec!(100));
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    let result = PreFlightValidator::new(config)
        .validate_for_trading(&market_with_book(), &orders, &portfolio)
        .await;

    assert!(result.passed);
    assert!(result.warnings().is_empty());
    let book = result.checks.iter().find(|c| c.name == "Order Book").unwrap();
    assert!(book.message.contains("spread 0.2"));

    let placement = result.checks.iter().find(|c| c.name == "Order Placement").unwrap();
    assert_eq!(placement.level, ValidationLevel::Info);
    assert!(placement.message.contains("Paper trading"));
}

#[tokio::test]
async fn test_venue_balance_below_portfolio_is_critical() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("executions.jsonl"));
    let orders = PaperTradingClient::new(dec!(0.01)).with_balance("LTC", dec!(50));
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    let result = PreFlightValidator::new(config)
        .validate_for_trading(&market_with_book(), &orders, &portfolio)
        .await;

    assert!(!result.passed);
    let failures = result.critical_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "Balances");
    assert!(failures[0].message.contains("LTC 50 < 100"));
}

#[tokio::test]
async fn test_empty_book_only_warns() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("executions.jsonl"));
    let orders = PaperTradingClient::new(dec!(0.01)).with_balance("LTC", dec!(100));
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    let result = PreFlightValidator::new(config)
        .validate_for_trading(&ScriptedMarket::new(&[dec!(10)]), &orders, &portfolio)
        .await;

    assert!(result.passed);
    assert!(result.critical_failures().is_empty());
    let warnings = result.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].name, "Order Book");
    assert!(warnings[0].message.contains("empty"));
}

#[tokio::test]
async fn test_unreachable_ticker_fails_market_check() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("executions.jsonl"));
    let orders = PaperTradingClient::new(dec!(0.01)).with_balance("LTC", dec!(100));
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    // No scripted prices, so the ticker call fails
    let market = ScriptedMarket::new(&[]).with_bids(vec![level(dec!(9.9), dec!(50))]);

    let result = PreFlightValidator::new(config)
        .validate_for_trading(&market, &orders, &portfolio)
        .await;

    assert!(!result.passed);
    let failures = result.critical_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "Market");
    // One-sided book has no spread
    assert_eq!(result.warnings().len(), 1);
}
