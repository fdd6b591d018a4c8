// Trade command implementation
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, error};
use trend_trading_bot::core::live_trading::starting_portfolio;
use trend_trading_bot::{
    BittrexClient, Config, ExecutionLog, LiveTrader, LiveTraderConfig, PaperTradingClient,
    PreFlightValidator, RetryPolicy, ShutdownSignal, TradingError, TradingResult,
};

pub async fn start_trading(config: &Config, minutes: Option<u64>) -> TradingResult<()> {
    let (base, secondary) = config.session.currencies().ok_or_else(|| {
        TradingError::ConfigValidation(format!("invalid market '{}'", config.session.market))
    })?;

    info!("🧪 Paper order placement, live market data");

    let log = ExecutionLog::new(&config.logging.execution_log, &config.session.market);
    let portfolio = starting_portfolio(config, &log)?;

    let market_data = BittrexClient::new(&config.api)?;
    let orders = Arc::new(
        PaperTradingClient::new(config.session.fee_rate)
            .with_balance(base, portfolio.base_balance())
            .with_balance(secondary, portfolio.secondary_balance()),
    );

    // Run pre-flight validation
    info!("");
    let validator = PreFlightValidator::new(config.clone());
    let validation = validator.validate_for_trading(&market_data, &orders, &portfolio).await;
    validation.display();

    if !validation.passed {
        error!("");
        error!("❌ Pre-flight validation failed. Cannot proceed.");
        return Err(TradingError::ValidationFailed(
            "Critical validation checks did not pass".to_string(),
        ));
    }

    info!("");
    info!("📝 Execution log: {}", log.path().display());

    let shutdown = ShutdownSignal::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("");
                info!("⏹️  Ctrl-C received, finishing the current cycle...");
                ctrl_c.initiate_shutdown();
            }
            Err(e) => warn!("⚠️  Could not listen for Ctrl-C: {}", e),
        }
    });

    if let Some(minutes) = minutes {
        info!("⏱️  Session limited to {} minute(s)", minutes);
        let timer = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(minutes * 60)).await;
            timer.initiate_shutdown();
        });
    } else {
        info!("⏱️  Running until Ctrl-C");
    }

    let mut trader = LiveTrader::new(
        LiveTraderConfig::from_config(config),
        market_data,
        Arc::clone(&orders),
        portfolio,
        log,
        RetryPolicy::from_config(&config.retry),
    )?;

    let summary = trader.run(&shutdown).await?;

    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 Session Summary");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Cycles: {} ({} stale ticks)", summary.cycles, summary.stale_ticks);
    info!("   Signals: {}", summary.signals);
    info!("   Executions: {} ({} partial)", summary.executions, summary.partial_fills);
    info!("   Skipped cycles: {}", summary.skipped_cycles);
    info!("   Orders: {} submitted, {} failed", summary.orders_submitted, summary.orders_failed);
    info!("   Paper orders filled: {}", orders.orders().await.len());
    info!(
        "   Final portfolio: {} {} / {} {}",
        trader.portfolio().base_balance(),
        base,
        trader.portfolio().secondary_balance(),
        secondary
    );

    Ok(())
}
