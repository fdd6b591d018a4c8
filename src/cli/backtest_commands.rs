// Backtest and sweep command implementations
use std::path::Path;
use tracing::{info, warn};
use trend_trading_bot::backtesting::ticks_from_candles;
use trend_trading_bot::core::error_handling::with_timeout;
use trend_trading_bot::{
    BacktestConfig, BacktestRunner, BittrexClient, Config, MarketDataClient, PortfolioState,
    PreFlightValidator, RetryPolicy, Spinner, SweepProgress, Tick, TradingError, TradingResult,
    WindowRange, WindowSweep,
};

/// Configuration checks shared by both commands.
fn validate_config(config: &Config) -> TradingResult<()> {
    let validation = PreFlightValidator::new(config.clone()).validate_for_backtesting();
    if !validation.passed {
        validation.display();
        return Err(TradingError::ValidationFailed(
            "Critical validation checks did not pass".to_string(),
        ));
    }
    Ok(())
}

/// Download the candle history for the configured market and turn it into ticks.
async fn load_history(config: &Config) -> TradingResult<Vec<Tick>> {
    let client = BittrexClient::new(&config.api)?;
    let retry = RetryPolicy::from_config(&config.retry);
    let market = config.session.market.as_str();
    let interval = config.session.candle_interval;
    let limit = std::time::Duration::from_secs(config.api.request_timeout_secs);
    let call = format!("get_historical_candles({}, {})", market, interval.as_str());

    let spinner = Spinner::new(&format!("Loading {} candles for {}...", interval.as_str(), market));
    let candles = match retry
        .execute(&call, || with_timeout(limit, &call, client.get_historical_candles(market, interval)))
        .await
    {
        Ok(candles) => candles,
        Err(e) => {
            spinner.finish_with_error(&format!("Could not load history for {}", market));
            return Err(e);
        }
    };

    let ticks = ticks_from_candles(&candles, config.session.price_field)?;
    spinner.finish(&format!("Loaded {} candles", ticks.len()));
    Ok(ticks)
}

pub async fn run_backtest(
    config: &Config,
    window: Option<usize>,
    output: Option<&Path>,
) -> TradingResult<()> {
    validate_config(config)?;

    let mut backtest_config = BacktestConfig::from_config(config);
    if let Some(window) = window {
        backtest_config = backtest_config.with_window(window);
    }

    info!("📊 Backtesting {}", config.session.market);
    info!("   Window: {} candles", backtest_config.window_size);
    info!("   Fee: {}", backtest_config.fee_rate);
    info!("   Price field: {:?}", config.session.price_field);

    let ticks = load_history(config).await?;
    let portfolio = PortfolioState::new(config.balances.base, config.balances.secondary)?;
    let result = BacktestRunner::new(backtest_config).run(&ticks, portfolio)?;

    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📈 Backtest Results");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Ticks replayed: {}", result.trace.len());
    info!("   Trades: {} ({} buys, {} sells)", result.metrics.total_trades, result.metrics.buys, result.metrics.sells);
    info!("   Fees paid: {}", result.metrics.total_fees_paid);
    info!("   Initial value: {}", result.initial_value);
    info!("   Final value: {}", result.final_value);
    info!("   Return: {:.2}%", result.metrics.total_return_pct);
    info!("   Max drawdown: {:.2}%", result.metrics.max_drawdown_pct);
    info!(
        "   Final balances: base {}, secondary {} ({:?})",
        result.final_portfolio.base_balance(),
        result.final_portfolio.secondary_balance(),
        result.final_portfolio.holding_side()
    );

    if result.trades.is_empty() {
        warn!("⚠️  No crossover cleared the fee; try a different window");
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json).map_err(|e| TradingError::FileWrite(format!("{}: {}", path.display(), e)))?;
        info!("💾 Saved result to {}", path.display());
    }

    Ok(())
}

pub async fn run_sweep(
    config: &Config,
    min: usize,
    max: usize,
    step: usize,
    top: usize,
) -> TradingResult<()> {
    validate_config(config)?;
    let range = WindowRange::new(min, max, step)?;

    info!("🔍 Sweeping window sizes {}..={} (step {}) on {}", min, max, step, config.session.market);

    let ticks = load_history(config).await?;
    let portfolio = PortfolioState::new(config.balances.base, config.balances.secondary)?;
    let sweep = WindowSweep::new(BacktestConfig::from_config(config), range);

    let progress = SweepProgress::new(range.sizes().len());
    let report = sweep.run_with_progress(&ticks, &portfolio, |window| progress.window_done(window));
    progress.finish(report.best().map(|best| (best.window_size, best.final_value)));

    if report.outcomes.is_empty() {
        return Err(TradingError::InsufficientData(format!(
            "{} ticks cannot warm any window in {}..={}",
            ticks.len(),
            min,
            max
        )));
    }

    info!("");
    info!("🏆 Top {} window sizes", top.min(report.outcomes.len()));
    for (rank, outcome) in report.outcomes.iter().take(top).enumerate() {
        info!(
            "   {}. window {:>4}  final {}  return {:.2}%  drawdown {:.2}%  trades {}",
            rank + 1,
            outcome.window_size,
            outcome.final_value,
            outcome.total_return_pct,
            outcome.max_drawdown_pct,
            outcome.executions
        );
    }

    if !report.skipped.is_empty() {
        warn!("⚠️  {} window size(s) skipped for lack of history", report.skipped.len());
    }

    Ok(())
}
