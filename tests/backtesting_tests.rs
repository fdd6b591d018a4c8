// Backtest, execution simulation and sweep integration tests

mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trend_trading_bot::backtesting::ticks_from_candles;
use trend_trading_bot::clients::Candle;
use trend_trading_bot::config::PriceField;
use trend_trading_bot::simulation::{OrderBookLevel, OrderBookSnapshot};
use trend_trading_bot::{
    BacktestConfig, BacktestError, BacktestRunner, ExecutionSimulator, HoldingSide,
    OrderBookLedger, PortfolioState, Side, Signal, WindowRange, WindowSweep,
};
use common::ticks_from_prices;

fn scenario_prices() -> Vec<Decimal> {
    vec![dec!(10), dec!(10), dec!(10), dec!(12), dec!(8)]
}

fn scenario_config() -> BacktestConfig {
    BacktestConfig {
        window_size: 3,
        fee_rate: dec!(0.01),
    }
}

#[test]
fn test_crossover_scenario_sells_high_and_buys_low() {
    let ticks = ticks_from_prices(&scenario_prices());
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    let result = BacktestRunner::new(scenario_config()).run(&ticks, portfolio).unwrap();

    let signals: Vec<Signal> = result.trace.iter().map(|point| point.signal).collect();
    assert_eq!(
        signals,
        vec![Signal::Neutral, Signal::Neutral, Signal::Neutral, Signal::Sell, Signal::Buy]
    );

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].side, Side::Sell);
    assert_eq!(result.trades[0].net_amount, dec!(1188));
    assert_eq!(result.trace[3].holding_side, HoldingSide::Base);
    assert_eq!(result.trace[3].wallet_value, dec!(1188));

    assert_eq!(result.trades[1].side, Side::Buy);
    assert_eq!(result.trades[1].quantity, dec!(147.02970297));
    assert!(result.trades[1].net_amount <= dec!(1188));

    assert_eq!(result.initial_value, dec!(1000));
    assert_eq!(result.final_portfolio.secondary_balance(), dec!(147.02970297));
    assert!(result.final_portfolio.base_balance() < dec!(0.0001));
    assert!(result.metrics.total_return_pct > dec!(17));
    assert_eq!(result.metrics.buys, 1);
    assert_eq!(result.metrics.sells, 1);
    assert!(result.metrics.total_fees_paid > dec!(23.7));
}

#[test]
fn test_whole_balance_buy_at_high_prices_ends_on_secondary() {
    let prices = [dec!(100), dec!(100), dec!(100), dec!(120), dec!(80), dec!(60), dec!(50)];
    let ticks = ticks_from_prices(&prices);
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();

    let result = BacktestRunner::new(scenario_config()).run(&ticks, portfolio).unwrap();

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.final_portfolio.secondary_balance(), dec!(147.02970297));
    assert_eq!(result.final_portfolio.base_balance(), dec!(0.000000024));
    assert_eq!(result.final_portfolio.holding_side(), HoldingSide::Secondary);

    // The leftover base cannot fund another buy as prices keep falling
    let signals: Vec<Signal> = result.trace.iter().map(|point| point.signal).collect();
    assert_eq!(signals[5], Signal::Neutral);
    assert_eq!(signals[6], Signal::Neutral);
}

#[test]
fn test_backtest_needs_more_ticks_than_the_window() {
    let ticks = ticks_from_prices(&[dec!(10), dec!(11), dec!(12)]);
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(1)).unwrap();

    let err = BacktestRunner::new(scenario_config()).run(&ticks, portfolio).unwrap_err();
    assert_eq!(err, BacktestError::InsufficientData { have: 3, need: 4 });
}

#[test]
fn test_backtest_from_bittrex_candles() {
    let candles: Vec<Candle> = serde_json::from_str(
        r#"[
            {"T":"2018-01-15T08:00:00","O":10,"H":10,"L":10,"C":10,"V":1,"BV":10},
            {"T":"2018-01-15T08:01:00","O":10,"H":10,"L":10,"C":10,"V":1,"BV":10},
            {"T":"2018-01-15T08:02:00","O":10,"H":10,"L":10,"C":10,"V":1,"BV":10},
            {"T":"2018-01-15T08:03:00","O":12,"H":12,"L":12,"C":12,"V":1,"BV":12},
            {"T":"2018-01-15T08:04:00","O":8,"H":8,"L":8,"C":8,"V":1,"BV":8}
        ]"#,
    )
    .unwrap();

    let ticks = ticks_from_candles(&candles, PriceField::Open).unwrap();
    assert_eq!(ticks.len(), 5);
    assert!(ticks.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));

    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();
    let result = BacktestRunner::new(scenario_config()).run(&ticks, portfolio).unwrap();
    assert_eq!(result.executions(), 2);
}

#[test]
fn test_insufficient_liquidity_reports_remainder() {
    let book = OrderBookLedger::from_snapshot(OrderBookSnapshot {
        market: "BTC-LTC".to_string(),
        bids: vec![
            OrderBookLevel::new(dec!(100), dec!(2)),
            OrderBookLevel::new(dec!(99), dec!(3)),
            OrderBookLevel::new(dec!(90), dec!(10)),
        ],
        asks: Vec::new(),
        timestamp: Utc::now(),
    })
    .unwrap();
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(8)).unwrap();
    let simulator = ExecutionSimulator::new(dec!(0.0025));

    let report = simulator.fill(&book, Side::Sell, dec!(8), Some(dec!(95))).unwrap();

    assert_eq!(report.filled_quantity(), dec!(5));
    assert_eq!(report.remainder, dec!(3));
    let warning = report.warning().unwrap();
    assert_eq!(warning.requested, dec!(8));
    assert_eq!(warning.remainder, dec!(3));

    // Walking the book leaves the portfolio alone
    assert_eq!(portfolio.secondary_balance(), dec!(8));
    assert_eq!(portfolio.base_balance(), Decimal::ZERO);

    let mut portfolio = portfolio;
    portfolio.apply(&report).unwrap();
    assert_eq!(portfolio.secondary_balance(), dec!(3));
    assert_eq!(portfolio.base_balance(), dec!(495.7575));
    assert_eq!(portfolio.holding_side(), HoldingSide::Mixed);
}

#[test]
fn test_budget_walk_never_overspends() {
    let book = OrderBookLedger::from_snapshot(OrderBookSnapshot {
        market: "BTC-LTC".to_string(),
        bids: Vec::new(),
        asks: vec![
            OrderBookLevel::new(dec!(10), dec!(1)),
            OrderBookLevel::new(dec!(11), dec!(2)),
            OrderBookLevel::new(dec!(12), dec!(100)),
        ],
        timestamp: Utc::now(),
    })
    .unwrap();
    let simulator = ExecutionSimulator::new(dec!(0.0025));

    let report = simulator.fill_with_budget(&book, dec!(50), None).unwrap();

    assert!(report.net_amount() <= dec!(50));
    assert_eq!(report.fills.len(), 3);
    assert_eq!(report.fills[0].price, dec!(10));
    assert!(!report.is_partial());
}

#[test]
fn test_sweep_covers_every_window_that_fits() {
    let ticks = ticks_from_prices(&scenario_prices());
    let portfolio = PortfolioState::new(Decimal::ZERO, dec!(100)).unwrap();
    let sweep = WindowSweep::new(scenario_config(), WindowRange::new(1, 6, 1).unwrap());

    let report = sweep.run(&ticks, &portfolio);

    // Windows 5 and 6 need more than five ticks
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .outcomes
        .windows(2)
        .all(|pair| pair[0].final_value >= pair[1].final_value));

    let window_three = report.outcomes.iter().find(|o| o.window_size == 3).unwrap();
    assert_eq!(window_three.executions, 2);
}
