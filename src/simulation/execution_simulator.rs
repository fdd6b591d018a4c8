// Execution Simulator
// Walks an order book ladder to fill a quantity, producing level fills and fees

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::simulation::order_book::{OrderBookLedger, OrderBookLevel};
use crate::types::{Side, QUANTITY_SCALE};

/// One consumed price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    pub fee_rate: Decimal,
}

impl Fill {
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Raised alongside a report when the ladder ran out before the target was met.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialFillWarning {
    pub requested: Decimal,
    pub filled: Decimal,
    pub remainder: Decimal,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("No qualifying {0} levels in the order book")]
    EmptyBook(Side),

    #[error("Invalid execution quantity: {0}")]
    InvalidQuantity(Decimal),
}

/// Result of one book walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub side: Side,
    pub requested: Decimal,
    pub fills: Vec<Fill>,
    pub remainder: Decimal,
    pub fee_rate: Decimal,
}

impl ExecutionReport {
    pub fn filled_quantity(&self) -> Decimal {
        self.fills.iter().map(|f| f.quantity).sum()
    }

    pub fn gross_notional(&self) -> Decimal {
        self.fills.iter().map(Fill::notional).sum()
    }

    /// Quantity-weighted price across all fills.
    pub fn weighted_price(&self) -> Option<Decimal> {
        let filled = self.filled_quantity();
        if filled.is_zero() {
            return None;
        }
        Some(self.gross_notional() / filled)
    }

    /// Base currency received (sell) or spent (buy), fee included.
    pub fn net_amount(&self) -> Decimal {
        apply_fee(self.side, self.gross_notional(), self.fee_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.remainder > Decimal::ZERO
    }

    pub fn warning(&self) -> Option<PartialFillWarning> {
        if !self.is_partial() {
            return None;
        }
        Some(PartialFillWarning {
            requested: self.requested,
            filled: self.filled_quantity(),
            remainder: self.remainder,
        })
    }

    /// Keep only the first `count` fills, moving the rest into the remainder.
    pub fn truncate(&mut self, count: usize) {
        if count >= self.fills.len() {
            return;
        }
        let dropped: Decimal = self.fills[count..].iter().map(|f| f.quantity).sum();
        self.fills.truncate(count);
        self.remainder += dropped;
    }
}

/// Apply the taker fee to a gross notional: proceeds shrink, costs grow.
pub fn apply_fee(side: Side, gross: Decimal, fee_rate: Decimal) -> Decimal {
    match side {
        Side::Sell => gross * (Decimal::ONE - fee_rate),
        Side::Buy => gross * (Decimal::ONE + fee_rate),
    }
}

/// Fee-adjusted price a fill must reach to beat `average`.
///
/// A sell only pays off above `average / (1 - fee)`, a buy only below
/// `average / (1 + fee)`.
pub fn fee_adjusted_threshold(side: Side, average: Decimal, fee_rate: Decimal) -> Decimal {
    match side {
        Side::Sell => average / (Decimal::ONE - fee_rate),
        Side::Buy => average / (Decimal::ONE + fee_rate),
    }
}

/// Execution simulator
#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    fee_rate: Decimal,
}

impl ExecutionSimulator {
    pub fn new(fee_rate: Decimal) -> Self {
        Self { fee_rate }
    }

    /// Fill `quantity` units on `side`, walking from the best level outward.
    pub fn fill(
        &self,
        book: &OrderBookLedger,
        side: Side,
        quantity: Decimal,
        threshold: Option<Decimal>,
    ) -> Result<ExecutionReport, ExecutionError> {
        if quantity <= Decimal::ZERO {
            return Err(ExecutionError::InvalidQuantity(quantity));
        }

        let levels = self.qualifying_levels(book, side, threshold)?;
        let mut remaining = quantity;
        let mut fills = Vec::new();

        for level in levels {
            if remaining.is_zero() {
                break;
            }
            let take = remaining.min(level.quantity);
            if take > Decimal::ZERO {
                fills.push(self.make_fill(side, level.price, take));
                remaining -= take;
            }
        }

        Ok(ExecutionReport {
            side,
            requested: quantity,
            fills,
            remainder: remaining,
            fee_rate: self.fee_rate,
        })
    }

    /// Buy as many units as `budget` base currency pays for, fee included.
    ///
    /// Quantities are rounded down to `QUANTITY_SCALE` places, so the total
    /// cost never exceeds the budget. If the qualifying levels run out while
    /// budget is left, the units it would still buy at the last level price
    /// are reported as the remainder.
    pub fn fill_with_budget(
        &self,
        book: &OrderBookLedger,
        budget: Decimal,
        threshold: Option<Decimal>,
    ) -> Result<ExecutionReport, ExecutionError> {
        if budget <= Decimal::ZERO {
            return Err(ExecutionError::InvalidQuantity(budget));
        }

        let side = Side::Buy;
        let levels = self.qualifying_levels(book, side, threshold)?;
        let unit_cost = |price: Decimal| price * (Decimal::ONE + self.fee_rate);

        let mut remaining_budget = budget;
        let mut fills = Vec::new();
        let mut budget_spent = false;
        let mut last_price = levels[0].price;

        for level in levels {
            last_price = level.price;
            let affordable = round_down(remaining_budget / unit_cost(level.price));
            let take = affordable.min(level.quantity);
            if take <= Decimal::ZERO {
                budget_spent = true;
                break;
            }
            fills.push(self.make_fill(side, level.price, take));
            remaining_budget -= take * unit_cost(level.price);
            if take < level.quantity {
                budget_spent = true;
                break;
            }
        }

        let remainder = if budget_spent {
            Decimal::ZERO
        } else {
            round_down(remaining_budget / unit_cost(last_price))
        };
        let filled: Decimal = fills.iter().map(|f| f.quantity).sum();

        Ok(ExecutionReport {
            side,
            requested: filled + remainder,
            fills,
            remainder,
            fee_rate: self.fee_rate,
        })
    }

    /// Fill at a single price with unlimited depth. Used by the backtester,
    /// where history carries no order book.
    pub fn fill_at_price(
        &self,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<ExecutionReport, ExecutionError> {
        if quantity <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(ExecutionError::InvalidQuantity(quantity));
        }

        Ok(ExecutionReport {
            side,
            requested: quantity,
            fills: vec![self.make_fill(side, price, quantity)],
            remainder: Decimal::ZERO,
            fee_rate: self.fee_rate,
        })
    }

    /// Units of secondary currency that `budget` buys at `price`, fee included.
    pub fn affordable_quantity(&self, budget: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_down(budget / (price * (Decimal::ONE + self.fee_rate)))
    }

    fn qualifying_levels(
        &self,
        book: &OrderBookLedger,
        side: Side,
        threshold: Option<Decimal>,
    ) -> Result<Vec<OrderBookLevel>, ExecutionError> {
        let levels = book.levels_at_or_better(side, threshold);
        if levels.is_empty() {
            return Err(ExecutionError::EmptyBook(side));
        }
        Ok(levels)
    }

    fn make_fill(&self, side: Side, price: Decimal, quantity: Decimal) -> Fill {
        Fill {
            price,
            quantity,
            side,
            fee_rate: self.fee_rate,
        }
    }
}

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::ToZero)
}
