// Integration tests for configuration loading and validation

mod common;

use rust_decimal_macros::dec;
use std::fs;
use tempfile::TempDir;
use trend_trading_bot::config::{CandleInterval, PartialFillPolicy};
use trend_trading_bot::{Config, ConfigError, TradingError};
use common::create_test_config;

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = create_test_config(&temp_dir.path().join("executions.jsonl"));
    config.to_file(&config_path).expect("Failed to write config");

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[session]"));
    assert!(content.contains("BTC-LTC"));

    let loaded = Config::from_file(&config_path).expect("Failed to load config");
    assert_eq!(loaded.session.window_size, 3);
    assert_eq!(loaded.session.fee_rate, dec!(0.01));
    assert_eq!(loaded.balances.secondary, dec!(100));
    assert_eq!(loaded.logging.execution_log, config.logging.execution_log);
}

#[test]
fn test_load_or_create_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    assert!(!config_path.exists());

    let config = Config::load_or_create(&config_path).unwrap();
    assert!(config_path.exists());
    assert_eq!(config.session.market, "BTC-LTC");

    // Second call reads what the first one wrote
    let again = Config::load_or_create(&config_path).unwrap();
    assert_eq!(again.session.window_size, config.session.window_size);
}

#[test]
fn test_missing_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::from_file(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));

    let err: TradingError = err.into();
    assert!(matches!(err, TradingError::ConfigNotFound(_)));
    assert!(err.user_message().contains("trend-bot init"));
}

#[test]
fn test_full_toml_is_parsed() {
    let config = Config::from_toml_str(
        r#"
        [session]
        market = "USDT-BTC"
        candle_interval = "fiveMin"
        price_field = "close"
        window_size = 12
        fee_rate = "0.001"
        poll_interval_secs = 30
        partial_fill_policy = "require_full"
        resume = true

        [balances]
        base = "250"
        secondary = "0"

        [api]
        request_timeout_secs = 5
        order_book_depth = 50

        [retry]
        max_attempts = 5
        base_delay_ms = 100
        max_delay_ms = 2000
        multiplier = 1.5
        jitter = false

        [logging]
        level = "debug"
        json = true
        execution_log = "/tmp/trend/executions.jsonl"
        "#,
    )
    .unwrap();

    assert_eq!(config.session.currencies(), Some(("USDT", "BTC")));
    assert_eq!(config.session.candle_interval, CandleInterval::FiveMin);
    assert_eq!(config.session.partial_fill_policy, PartialFillPolicy::RequireFull);
    assert!(config.session.resume);
    assert_eq!(config.balances.base, dec!(250));
    assert_eq!(config.api.order_book_depth, 50);
    assert_eq!(config.retry.max_attempts, 5);
    assert!(config.logging.json);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = Config::default();
    config.session.window_size = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

    let mut config = Config::default();
    config.session.fee_rate = dec!(1);
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

    let mut config = Config::default();
    config.session.fee_rate = dec!(-0.01);
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.balances.secondary = dec!(-1);
    assert!(config.validate().is_err());

    // Validation runs on load as well
    let err = Config::from_toml_str(
        "[session]\nmarket = \"BTC-LTC\"\nwindow_size = 0\n\n[balances]\nsecondary = \"1\"\n",
    )
    .unwrap_err();
    let err: TradingError = err.into();
    assert!(matches!(err, TradingError::ConfigValidation(_)));
    assert_eq!(err.category(), "config");
}
