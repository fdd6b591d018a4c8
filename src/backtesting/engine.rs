// Backtest runner: replays a tick history through the signal engine

use rust_decimal::Decimal;
use tracing::debug;
use crate::backtesting::{
    BacktestConfig, BacktestError, BacktestResult, BacktestTrade, PerformanceAnalyzer, TracePoint,
};
use crate::core::portfolio::PortfolioState;
use crate::core::signal_engine::{SignalEngine, TickOutcome};
use crate::simulation::execution_simulator::{ExecutionReport, ExecutionSimulator};
use crate::types::{Side, Signal, Tick};

pub struct BacktestRunner {
    config: BacktestConfig,
    simulator: ExecutionSimulator,
    performance_analyzer: PerformanceAnalyzer,
}

impl BacktestRunner {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            simulator: ExecutionSimulator::new(config.fee_rate),
            config,
            performance_analyzer: PerformanceAnalyzer::new(),
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replay `ticks` in order starting from `portfolio`.
    ///
    /// History carries no order book, so every execution moves the whole
    /// paying balance at the tick price, fee applied.
    pub fn run(&self, ticks: &[Tick], portfolio: PortfolioState) -> Result<BacktestResult, BacktestError> {
        let need = self.config.window_size + 1;
        if ticks.len() < need {
            return Err(BacktestError::InsufficientData { have: ticks.len(), need });
        }

        let mut engine = SignalEngine::new(self.config.window_size, self.config.fee_rate)?;
        let initial_portfolio = portfolio.clone();
        let initial_value = portfolio.value_at(ticks[0].price);
        let mut portfolio = portfolio;
        let mut trades = Vec::new();
        let mut trace = Vec::with_capacity(ticks.len());
        let mut last_price = ticks[0].price;

        for tick in ticks {
            let signal = match engine.on_tick(tick, &portfolio) {
                TickOutcome::Stale => continue,
                TickOutcome::WarmingUp => Signal::Neutral,
                TickOutcome::Decision(decision) => {
                    if let Some(side) = decision.signal.side() {
                        if let Some(report) = self.simulated_fill(side, tick.price, &portfolio)? {
                            portfolio.apply(&report)?;
                            trades.push(self.record_trade(tick, &report));
                            debug!(
                                "{} {} @ {} (average {}) -> {:?}",
                                side,
                                report.filled_quantity(),
                                tick.price,
                                decision.average,
                                portfolio.holding_side()
                            );
                        }
                    }
                    decision.signal
                }
            };

            last_price = tick.price;
            trace.push(TracePoint {
                timestamp: tick.timestamp,
                price: tick.price,
                signal,
                holding_side: portfolio.holding_side(),
                wallet_value: portfolio.value_at(tick.price),
            });
        }

        let final_value = portfolio.value_at(last_price);
        let metrics = self
            .performance_analyzer
            .calculate(&trades, &trace, initial_value, final_value);

        Ok(BacktestResult {
            window_size: self.config.window_size,
            fee_rate: self.config.fee_rate,
            initial_portfolio,
            final_portfolio: portfolio,
            initial_value,
            final_value,
            trades,
            trace,
            metrics,
        })
    }

    /// Whole-balance fill at `price`. `None` when the balance buys nothing.
    fn simulated_fill(
        &self,
        side: Side,
        price: Decimal,
        portfolio: &PortfolioState,
    ) -> Result<Option<ExecutionReport>, BacktestError> {
        let quantity = match side {
            Side::Sell => portfolio.secondary_balance(),
            Side::Buy => self.simulator.affordable_quantity(portfolio.base_balance(), price),
        };
        if quantity <= Decimal::ZERO {
            return Ok(None);
        }

        Ok(Some(self.simulator.fill_at_price(side, price, quantity)?))
    }

    fn record_trade(&self, tick: &Tick, report: &ExecutionReport) -> BacktestTrade {
        let gross = report.gross_notional();
        BacktestTrade {
            timestamp: tick.timestamp,
            side: report.side,
            price: tick.price,
            quantity: report.filled_quantity(),
            net_amount: report.net_amount(),
            fee_paid: gross * report.fee_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HoldingSide;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn series(prices: &[Decimal]) -> Vec<Tick> {
        let start = Utc::now();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Tick::new(start + Duration::minutes(i as i64), p))
            .collect()
    }

    fn runner(window_size: usize) -> BacktestRunner {
        BacktestRunner::new(BacktestConfig { window_size, fee_rate: dec!(0.01) })
    }

    #[test]
    fn test_insufficient_data() {
        let ticks = series(&[dec!(10), dec!(10), dec!(10)]);
        let portfolio = PortfolioState::new(dec!(0), dec!(100)).unwrap();

        assert_eq!(
            runner(3).run(&ticks, portfolio).unwrap_err(),
            BacktestError::InsufficientData { have: 3, need: 4 }
        );
    }

    #[test]
    fn test_flat_market_never_trades() {
        let ticks = series(&[dec!(10); 8]);
        let portfolio = PortfolioState::new(dec!(0), dec!(100)).unwrap();

        let result = runner(3).run(&ticks, portfolio.clone()).unwrap();

        assert_eq!(result.executions(), 0);
        assert_eq!(result.final_portfolio, portfolio);
        assert_eq!(result.final_value, dec!(1000));
        assert_eq!(result.trace.len(), 8);
    }

    #[test]
    fn test_stale_ticks_are_skipped_in_trace() {
        let mut ticks = series(&[dec!(10), dec!(10), dec!(10), dec!(10)]);
        ticks.insert(2, ticks[0]);
        let portfolio = PortfolioState::new(dec!(0), dec!(1)).unwrap();

        let result = runner(2).run(&ticks, portfolio).unwrap();
        assert_eq!(result.trace.len(), 4);
    }

    #[test]
    fn test_sell_then_buy_round_trip() {
        let ticks = series(&[dec!(10), dec!(10), dec!(10), dec!(12), dec!(8)]);
        let portfolio = PortfolioState::new(dec!(0), dec!(100)).unwrap();

        let result = runner(3).run(&ticks, portfolio).unwrap();

        assert_eq!(result.executions(), 2);
        assert_eq!(result.trades[0].side, Side::Sell);
        assert_eq!(result.trades[0].net_amount, dec!(1188));
        assert_eq!(result.trades[1].side, Side::Buy);
        assert!(result.trades[1].net_amount <= dec!(1188));
        assert_eq!(result.final_portfolio.holding_side(), HoldingSide::Secondary);
        assert_eq!(result.trace[3].holding_side, HoldingSide::Base);
    }
}
