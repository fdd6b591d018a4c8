// Moving-average crossover signal generation with fee-aware hysteresis

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use crate::core::portfolio::PortfolioState;
use crate::core::price_window::{PriceWindow, WindowError};
use crate::simulation::execution_simulator::fee_adjusted_threshold;
use crate::types::{Side, Signal, SignalDecision, Tick};

/// What happened to one incoming tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Timestamp not after the last accepted tick; dropped untouched.
    Stale,
    /// Accepted into the window, but the average is not ready yet.
    WarmingUp,
    Decision(SignalDecision),
}

pub struct SignalEngine {
    window: PriceWindow,
    fee_rate: Decimal,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SignalEngine {
    pub fn new(window_size: usize, fee_rate: Decimal) -> Result<Self, WindowError> {
        Ok(Self {
            window: PriceWindow::new(window_size)?,
            fee_rate,
            last_timestamp: None,
        })
    }

    /// Evaluate `tick` against the average of the preceding window, then
    /// push its price.
    pub fn on_tick(&mut self, tick: &Tick, portfolio: &PortfolioState) -> TickOutcome {
        if let Some(last) = self.last_timestamp {
            if tick.timestamp <= last {
                debug!("⏪ Dropping stale tick at {} (last {})", tick.timestamp, last);
                return TickOutcome::Stale;
            }
        }
        self.last_timestamp = Some(tick.timestamp);

        let outcome = match self.evaluate(tick.price, portfolio) {
            Ok(decision) => TickOutcome::Decision(decision),
            Err(WindowError::NotWarm { .. }) | Err(WindowError::ZeroCapacity) => TickOutcome::WarmingUp,
        };

        self.window.push(tick.price);
        outcome
    }

    /// Decide against the current window without changing it.
    pub fn evaluate(&self, price: Decimal, portfolio: &PortfolioState) -> Result<SignalDecision, WindowError> {
        let average = self.window.average()?;
        let signal = self.crossover_signal(price, average, portfolio);

        Ok(SignalDecision { signal, price, average })
    }

    fn crossover_signal(&self, price: Decimal, average: Decimal, portfolio: &PortfolioState) -> Signal {
        if price > average && portfolio.has_secondary() {
            // Only sell if the proceeds after fees still beat the average
            if price * (Decimal::ONE - self.fee_rate) > average {
                debug!("🔴 SELL signal: price {} above average {}", price, average);
                return Signal::Sell;
            }
            debug!("Sell candidate at {} absorbed by fees (average {})", price, average);
        } else if price < average && portfolio.can_buy_at(price, self.fee_rate) {
            if price * (Decimal::ONE + self.fee_rate) < average {
                debug!("🟢 BUY signal: price {} below average {}", price, average);
                return Signal::Buy;
            }
            debug!("Buy candidate at {} absorbed by fees (average {})", price, average);
        }

        Signal::Neutral
    }

    /// Worst book price an execution for `decision` may accept.
    pub fn execution_threshold(&self, side: Side, decision: &SignalDecision) -> Decimal {
        fee_adjusted_threshold(side, decision.average, self.fee_rate)
    }

    pub fn window(&self) -> &PriceWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn ticks(prices: &[Decimal]) -> Vec<Tick> {
        let start = Utc::now();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Tick::new(start + Duration::minutes(i as i64), price))
            .collect()
    }

    #[test]
    fn test_no_decision_during_warm_up() {
        let mut engine = SignalEngine::new(3, dec!(0.01)).unwrap();
        let portfolio = PortfolioState::new(dec!(0), dec!(100)).unwrap();

        for tick in ticks(&[dec!(10), dec!(10), dec!(10)]) {
            assert_eq!(engine.on_tick(&tick, &portfolio), TickOutcome::WarmingUp);
        }
        assert!(engine.window().is_warm());
    }

    #[test]
    fn test_sell_uses_preceding_average() {
        let mut engine = SignalEngine::new(3, dec!(0.01)).unwrap();
        let portfolio = PortfolioState::new(dec!(0), dec!(100)).unwrap();
        let series = ticks(&[dec!(10), dec!(10), dec!(10), dec!(12)]);

        let mut last = TickOutcome::Stale;
        for tick in &series {
            last = engine.on_tick(tick, &portfolio);
        }

        match last {
            TickOutcome::Decision(decision) => {
                assert_eq!(decision.signal, Signal::Sell);
                assert_eq!(decision.average, dec!(10));
                assert_eq!(decision.price, dec!(12));
            }
            other => panic!("expected decision, got {:?}", other),
        }
    }

    #[test]
    fn test_equality_is_neutral() {
        let mut engine = SignalEngine::new(2, Decimal::ZERO).unwrap();
        let mixed = PortfolioState::new(dec!(50), dec!(50)).unwrap();
        engine.window.push(dec!(9));
        engine.window.push(dec!(11));

        let decision = engine.evaluate(dec!(10), &mixed).unwrap();
        assert_eq!(decision.signal, Signal::Neutral);
    }

    #[test]
    fn test_fee_hysteresis_suppresses_marginal_sell() {
        let mut engine = SignalEngine::new(1, dec!(0.01)).unwrap();
        let holding = PortfolioState::new(dec!(0), dec!(1)).unwrap();
        engine.window.push(dec!(100));

        // 100.5 * 0.99 = 99.495 < 100
        assert_eq!(engine.evaluate(dec!(100.5), &holding).unwrap().signal, Signal::Neutral);
        // 102 * 0.99 = 100.98 > 100
        assert_eq!(engine.evaluate(dec!(102), &holding).unwrap().signal, Signal::Sell);
    }

    #[test]
    fn test_no_signal_without_balance_to_spend() {
        let mut engine = SignalEngine::new(1, dec!(0.01)).unwrap();
        let all_base = PortfolioState::new(dec!(10), dec!(0)).unwrap();
        engine.window.push(dec!(100));

        // Price far above average but nothing to sell
        assert_eq!(engine.evaluate(dec!(150), &all_base).unwrap().signal, Signal::Neutral);
        assert_eq!(engine.evaluate(dec!(50), &all_base).unwrap().signal, Signal::Buy);
    }

    #[test]
    fn test_stale_tick_leaves_window_untouched() {
        let mut engine = SignalEngine::new(3, dec!(0.01)).unwrap();
        let portfolio = PortfolioState::new(dec!(0), dec!(1)).unwrap();
        let series = ticks(&[dec!(10), dec!(11)]);

        engine.on_tick(&series[1], &portfolio);
        assert_eq!(engine.on_tick(&series[0], &portfolio), TickOutcome::Stale);
        assert_eq!(engine.window().len(), 1);
    }
}
