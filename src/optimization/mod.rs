// Window size sweep: one backtest per window size, run in parallel

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::backtesting::{BacktestConfig, BacktestError, BacktestRunner};
use crate::core::portfolio::PortfolioState;
use crate::error::{TradingError, TradingResult};
use crate::types::Tick;

/// Inclusive range of window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRange {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}

impl WindowRange {
    pub fn new(min: usize, max: usize, step: usize) -> TradingResult<Self> {
        if min == 0 || step == 0 || min > max {
            return Err(TradingError::InvalidParameter(
                "window range".to_string(),
                format!("need 1 <= min <= max and step >= 1, got {}..={} step {}", min, max, step),
            ));
        }
        Ok(Self { min, max, step })
    }

    pub fn sizes(&self) -> Vec<usize> {
        (self.min..=self.max).step_by(self.step).collect()
    }
}

/// Summary of one window size's backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub window_size: usize,
    pub final_value: Decimal,
    pub total_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub executions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Best final value first.
    pub outcomes: Vec<SweepOutcome>,
    pub skipped: Vec<(usize, BacktestError)>,
}

impl SweepReport {
    pub fn best(&self) -> Option<&SweepOutcome> {
        self.outcomes.first()
    }
}

pub struct WindowSweep {
    base: BacktestConfig,
    range: WindowRange,
}

impl WindowSweep {
    pub fn new(base: BacktestConfig, range: WindowRange) -> Self {
        Self { base, range }
    }

    pub fn run(&self, ticks: &[Tick], portfolio: &PortfolioState) -> SweepReport {
        self.run_with_progress(ticks, portfolio, |_| {})
    }

    /// Like `run`, calling `on_done` as each window size finishes.
    pub fn run_with_progress<F>(&self, ticks: &[Tick], portfolio: &PortfolioState, on_done: F) -> SweepReport
    where
        F: Fn(usize) + Sync,
    {
        let results: Vec<(usize, Result<SweepOutcome, BacktestError>)> = self
            .range
            .sizes()
            .into_par_iter()
            .map(|window_size| {
                let runner = BacktestRunner::new(self.base.with_window(window_size));
                let outcome = runner.run(ticks, portfolio.clone()).map(|result| SweepOutcome {
                    window_size,
                    final_value: result.final_value,
                    total_return_pct: result.metrics.total_return_pct,
                    max_drawdown_pct: result.metrics.max_drawdown_pct,
                    executions: result.executions(),
                });
                on_done(window_size);
                (window_size, outcome)
            })
            .collect();

        let mut report = SweepReport::default();
        for (window_size, outcome) in results {
            match outcome {
                Ok(outcome) => {
                    debug!("window {} -> final value {}", window_size, outcome.final_value);
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!("⚠️  Window {} skipped: {}", window_size, e);
                    report.skipped.push((window_size, e));
                }
            }
        }

        report.outcomes.sort_by(|a, b| {
            b.final_value
                .cmp(&a.final_value)
                .then(a.window_size.cmp(&b.window_size))
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_window_range_validation() {
        assert!(WindowRange::new(0, 5, 1).is_err());
        assert!(WindowRange::new(5, 2, 1).is_err());
        assert_eq!(WindowRange::new(2, 8, 3).unwrap().sizes(), vec![2, 5, 8]);
    }

    #[test]
    fn test_sweep_ranks_by_final_value_and_skips_short_history() {
        let start = Utc::now();
        let prices = [10, 11, 12, 11, 9, 8, 9, 12, 14, 13, 10, 9];
        let ticks: Vec<Tick> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Tick::new(start + Duration::minutes(i as i64), Decimal::from(p)))
            .collect();
        let portfolio = PortfolioState::new(dec!(0), dec!(10)).unwrap();

        let sweep = WindowSweep::new(
            BacktestConfig { window_size: 1, fee_rate: dec!(0.001) },
            WindowRange::new(1, 12, 1).unwrap(),
        );
        let report = sweep.run(&ticks, &portfolio);

        // Window 12 needs 13 ticks
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 12);
        assert_eq!(report.outcomes.len(), 11);
        assert!(report
            .outcomes
            .windows(2)
            .all(|pair| pair[0].final_value >= pair[1].final_value));
    }
}
