// Performance Analytics and Metrics Calculation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::backtesting::{BacktestTrade, TracePoint};
use crate::types::Side;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    pub total_trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub total_fees_paid: Decimal,
}

#[derive(Debug, Default)]
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(
        &self,
        trades: &[BacktestTrade],
        trace: &[TracePoint],
        initial_value: Decimal,
        final_value: Decimal,
    ) -> PerformanceMetrics {
        let equity_curve: Vec<Decimal> = trace.iter().map(|p| p.wallet_value).collect();

        PerformanceMetrics {
            total_return_pct: self.calculate_total_return(initial_value, final_value),
            max_drawdown_pct: self.calculate_max_drawdown(&equity_curve),
            total_trades: trades.len(),
            buys: trades.iter().filter(|t| t.side == Side::Buy).count(),
            sells: trades.iter().filter(|t| t.side == Side::Sell).count(),
            total_fees_paid: trades.iter().map(|t| t.fee_paid).sum(),
        }
    }

    fn calculate_total_return(&self, initial_value: Decimal, final_value: Decimal) -> Decimal {
        if initial_value.is_zero() {
            return Decimal::ZERO;
        }
        (final_value - initial_value) / initial_value * Decimal::ONE_HUNDRED
    }

    /// Largest peak-to-trough fall of the equity curve, in percent.
    fn calculate_max_drawdown(&self, equity_curve: &[Decimal]) -> Decimal {
        let Some(&first) = equity_curve.first() else {
            return Decimal::ZERO;
        };

        let mut max_drawdown = Decimal::ZERO;
        let mut peak = first;

        for &value in equity_curve.iter().skip(1) {
            if value > peak {
                peak = value;
            } else if peak > Decimal::ZERO {
                let drawdown = (peak - value) / peak;
                max_drawdown = max_drawdown.max(drawdown);
            }
        }

        max_drawdown * Decimal::ONE_HUNDRED
    }
}
