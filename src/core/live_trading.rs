// Live trading session: poll, decide, walk the book, submit, record

use std::time::Duration;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use crate::clients::{BookType, MarketDataClient, OrderPlacementClient};
use crate::config::{Config, PartialFillPolicy};
use crate::core::error_handling::{with_timeout, RetryPolicy, ShutdownSignal};
use crate::core::execution_log::{ExecutionLog, ExecutionRecord};
use crate::core::portfolio::PortfolioState;
use crate::core::signal_engine::{SignalEngine, TickOutcome};
use crate::error::{TradingError, TradingResult};
use crate::simulation::execution_simulator::{ExecutionReport, ExecutionSimulator};
use crate::simulation::order_book::{OrderBookLedger, OrderBookLevel, OrderBookSnapshot};
use crate::types::{Side, SignalDecision, Tick};

#[derive(Debug, Clone)]
pub struct LiveTraderConfig {
    pub market: String,
    pub window_size: usize,
    pub fee_rate: Decimal,
    pub poll_interval: Duration,
    pub call_timeout: Duration,
    pub partial_fill_policy: PartialFillPolicy,
}

impl LiveTraderConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            market: config.session.market.clone(),
            window_size: config.session.window_size,
            fee_rate: config.session.fee_rate,
            poll_interval: Duration::from_secs(config.session.poll_interval_secs),
            call_timeout: Duration::from_secs(config.api.request_timeout_secs),
            partial_fill_policy: config.session.partial_fill_policy,
        }
    }
}

/// What one poll cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Stopped,
    Stale,
    WarmingUp,
    Neutral(SignalDecision),
    /// A signal fired but nothing was executed this cycle.
    Skipped(String),
    Executed(ExecutionRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub cycles: u64,
    pub stale_ticks: u64,
    pub signals: u64,
    pub executions: u64,
    pub partial_fills: u64,
    pub skipped_cycles: u64,
    pub orders_submitted: u64,
    pub orders_failed: u64,
}

/// Starting balances: the last logged portfolio when resuming, the
/// configured balances otherwise.
pub fn starting_portfolio(config: &Config, log: &ExecutionLog) -> TradingResult<PortfolioState> {
    if config.session.resume {
        if let Some(portfolio) = log.last_portfolio()? {
            info!(
                "♻️  Resuming from {}: base {}, secondary {}",
                log.path().display(),
                portfolio.base_balance(),
                portfolio.secondary_balance()
            );
            return Ok(portfolio);
        }
        warn!("⚠️  Resume requested but {} has no record for {}", log.path().display(), config.session.market);
    }

    Ok(PortfolioState::new(config.balances.base, config.balances.secondary)?)
}

pub struct LiveTrader<M, O> {
    config: LiveTraderConfig,
    market_data: M,
    orders: O,
    engine: SignalEngine,
    simulator: ExecutionSimulator,
    portfolio: PortfolioState,
    log: ExecutionLog,
    retry: RetryPolicy,
    summary: SessionSummary,
}

impl<M, O> LiveTrader<M, O>
where
    M: MarketDataClient,
    O: OrderPlacementClient,
{
    pub fn new(
        config: LiveTraderConfig,
        market_data: M,
        orders: O,
        portfolio: PortfolioState,
        log: ExecutionLog,
        retry: RetryPolicy,
    ) -> TradingResult<Self> {
        Ok(Self {
            engine: SignalEngine::new(config.window_size, config.fee_rate)?,
            simulator: ExecutionSimulator::new(config.fee_rate),
            config,
            market_data,
            orders,
            portfolio,
            log,
            retry,
            summary: SessionSummary::default(),
        })
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Poll until `shutdown` fires or a fatal error occurs. The portfolio
    /// is checkpointed to the execution log either way.
    pub async fn run(&mut self, shutdown: &ShutdownSignal) -> TradingResult<SessionSummary> {
        info!(
            "🚀 Trading {} (window {}, fee {}, every {:?})",
            self.config.market, self.config.window_size, self.config.fee_rate, self.config.poll_interval
        );
        info!(
            "💼 Starting balances: base {}, secondary {} ({:?})",
            self.portfolio.base_balance(),
            self.portfolio.secondary_balance(),
            self.portfolio.holding_side()
        );

        loop {
            if let Err(e) = self.run_cycle(shutdown).await {
                error!("❌ Fatal error, stopping session: {}", e);
                if let Err(log_err) = self.log.record_checkpoint(&self.portfolio, "fatal") {
                    error!("❌ Could not write checkpoint: {}", log_err);
                }
                return Err(e);
            }
            if shutdown.is_shutting_down() {
                break;
            }

            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        self.log.record_checkpoint(&self.portfolio, "stop")?;
        info!("🛑 Session stopped after {} cycles, {} executions", self.summary.cycles, self.summary.executions);
        info!(
            "💼 Final balances: base {}, secondary {} ({:?})",
            self.portfolio.base_balance(),
            self.portfolio.secondary_balance(),
            self.portfolio.holding_side()
        );
        Ok(self.summary.clone())
    }

    /// One poll cycle. Only fatal errors are returned; cycle-local ones
    /// are logged and reported as `Skipped`.
    pub async fn run_cycle(&mut self, shutdown: &ShutdownSignal) -> TradingResult<CycleOutcome> {
        if shutdown.is_shutting_down() {
            return Ok(CycleOutcome::Stopped);
        }
        self.summary.cycles += 1;

        let market = self.config.market.clone();
        let limit = self.config.call_timeout;
        let ticker_call = format!("get_ticker({})", market);
        let ticker = self
            .retry
            .execute(&ticker_call, || {
                with_timeout(limit, &ticker_call, self.market_data.get_ticker(&market))
            })
            .await?;

        if ticker.last <= Decimal::ZERO {
            warn!("⚠️  Ignoring ticker with non-positive last price {}", ticker.last);
            return Ok(self.skip(format!("non-positive last price {}", ticker.last)));
        }

        let tick = Tick::new(Utc::now(), ticker.last);
        let decision = match self.engine.on_tick(&tick, &self.portfolio) {
            TickOutcome::Stale => {
                self.summary.stale_ticks += 1;
                return Ok(CycleOutcome::Stale);
            }
            TickOutcome::WarmingUp => {
                debug!(
                    "⏳ Warming up: {}/{} prices",
                    self.engine.window().len(),
                    self.engine.window().capacity()
                );
                return Ok(CycleOutcome::WarmingUp);
            }
            TickOutcome::Decision(decision) => decision,
        };

        let Some(side) = decision.signal.side() else {
            debug!("Neutral at {} (average {})", decision.price, decision.average);
            return Ok(CycleOutcome::Neutral(decision));
        };

        self.summary.signals += 1;
        info!("📈 {} signal: price {} vs average {}", side, decision.price, decision.average);

        match self.execute_signal(side, &decision).await {
            Err(e) if e.is_cycle_local() => {
                warn!("⚠️  Skipping cycle: {}", e);
                Ok(self.skip(e.to_string()))
            }
            other => other,
        }
    }

    async fn execute_signal(&mut self, side: Side, decision: &SignalDecision) -> TradingResult<CycleOutcome> {
        let book = self.fetch_book(side).await?;
        let threshold = self.engine.execution_threshold(side, decision);

        let mut report = match side {
            Side::Sell => self.simulator.fill(
                &book,
                side,
                self.portfolio.secondary_balance(),
                Some(threshold),
            )?,
            Side::Buy => self.simulator.fill_with_budget(
                &book,
                self.portfolio.base_balance(),
                Some(threshold),
            )?,
        };

        if let Some(warning) = report.warning() {
            match self.config.partial_fill_policy {
                PartialFillPolicy::RequireFull => {
                    info!(
                        "⏸️  Book covers only {} of {}; waiting for a full fill",
                        warning.filled, warning.requested
                    );
                    return Ok(self.skip(format!(
                        "partial fill refused: {} of {}",
                        warning.filled, warning.requested
                    )));
                }
                PartialFillPolicy::Accept => {
                    warn!(
                        "⚠️  Partial fill: {} of {} ({} left over)",
                        warning.filled, warning.requested, warning.remainder
                    );
                }
            }
        }

        let (confirmed, fatal) = self.submit_fills(&report).await;
        report.truncate(confirmed);
        if report.is_empty() {
            return match fatal {
                Some(e) => Err(e),
                None => Ok(self.skip("no orders confirmed".to_string())),
            };
        }

        // Confirmed fills are booked even when the session is about to end
        let change = self.portfolio.apply(&report)?;
        let record = self.log.record_execution(&report, &self.portfolio)?;

        self.summary.executions += 1;
        if report.is_partial() {
            self.summary.partial_fills += 1;
        }
        if let Some(e) = fatal {
            warn!(
                "⚠️  Booked {} {} confirmed before the fatal error",
                side, record.filled_quantity
            );
            return Err(e);
        }
        info!(
            "✅ {} {} @ {} (net {}), {:?} -> {:?}",
            side,
            record.filled_quantity,
            record.weighted_price,
            record.net_amount,
            change.previous_holding,
            change.holding_side
        );

        Ok(CycleOutcome::Executed(record))
    }

    async fn fetch_book(&self, side: Side) -> TradingResult<OrderBookLedger> {
        let market = self.config.market.as_str();
        let limit = self.config.call_timeout;
        let book_type = BookType::counterparty_of(side);
        let call = format!("get_order_book({}, {})", market, book_type.as_str());

        let raw = self
            .retry
            .execute(&call, || {
                with_timeout(limit, &call, self.market_data.get_order_book(market, book_type))
            })
            .await?;

        let levels: Vec<OrderBookLevel> = raw.into_iter().map(OrderBookLevel::from).collect();
        let (bids, asks) = match book_type {
            BookType::Buy => (levels, Vec::new()),
            BookType::Sell => (Vec::new(), levels),
        };

        Ok(OrderBookLedger::from_snapshot(OrderBookSnapshot {
            market: market.to_string(),
            bids,
            asks,
            timestamp: Utc::now(),
        })?)
    }

    /// Submit fills in order as limit orders and return how many the venue
    /// confirmed, plus the error that ends the session, if any. Orders are
    /// never retried, so nothing is placed twice.
    async fn submit_fills(&mut self, report: &ExecutionReport) -> (usize, Option<TradingError>) {
        let market = self.config.market.clone();
        let limit = self.config.call_timeout;
        let mut confirmed = 0;

        for fill in &report.fills {
            let call = format!("place_limit_order({}, {} {} @ {})", market, fill.side, fill.quantity, fill.price);
            self.summary.orders_submitted += 1;

            match with_timeout(
                limit,
                &call,
                self.orders.place_limit_order(&market, fill.side, fill.quantity, fill.price),
            )
            .await
            {
                Ok(confirmation) => {
                    debug!("Order {} confirmed", confirmation.order_id);
                    confirmed += 1;
                }
                Err(e @ TradingError::ApiAuthentication(_)) => {
                    self.summary.orders_failed += 1;
                    let fatal = TradingError::CallFailed {
                        operation: call,
                        attempts: 1,
                        source: Box::new(e),
                    };
                    return (confirmed, Some(fatal));
                }
                Err(e) => {
                    self.summary.orders_failed += 1;
                    warn!("⚠️  {} failed: {}; keeping {} confirmed fill(s)", call, e, confirmed);
                    break;
                }
            }
        }

        (confirmed, None)
    }

    fn skip(&mut self, reason: String) -> CycleOutcome {
        self.summary.skipped_cycles += 1;
        CycleOutcome::Skipped(reason)
    }
}
