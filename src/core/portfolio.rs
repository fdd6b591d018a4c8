// Portfolio bookkeeping: base/secondary balances and the current holding side

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::simulation::execution_simulator::ExecutionReport;
use crate::types::{HoldingSide, Side, DUST_TOLERANCE, QUANTITY_STEP};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("Negative starting balance: base {base}, secondary {secondary}")]
    NegativeBalance { base: Decimal, secondary: Decimal },

    #[error("Insufficient {currency} balance: required {required}, available {available}")]
    InsufficientBalance {
        currency: &'static str,
        required: Decimal,
        available: Decimal,
    },

    #[error("Execution report contains no fills")]
    EmptyExecution,
}

/// Balances of one trading session.
///
/// Only `apply` changes the balances, and it refuses any execution that
/// would spend more than is held on the paying side.
///
/// Buys are sized in whole quantity steps, so a buy that spends the full
/// balance can leave base behind that is too small to buy one more step.
/// `base_dust` is the cost of one step at the last buy price; base below
/// it counts as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    base_balance: Decimal,
    secondary_balance: Decimal,
    holding_side: HoldingSide,
    #[serde(default)]
    base_dust: Decimal,
}

/// What an applied execution did to the portfolio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceChange {
    pub side: Side,
    pub quantity: Decimal,
    pub net_amount: Decimal,
    pub previous_holding: HoldingSide,
    pub holding_side: HoldingSide,
}

impl PortfolioState {
    pub fn new(base_balance: Decimal, secondary_balance: Decimal) -> Result<Self, PortfolioError> {
        if base_balance < Decimal::ZERO || secondary_balance < Decimal::ZERO {
            return Err(PortfolioError::NegativeBalance {
                base: base_balance,
                secondary: secondary_balance,
            });
        }

        Ok(Self {
            base_balance,
            secondary_balance,
            holding_side: classify(base_balance, secondary_balance, Decimal::ZERO),
            base_dust: Decimal::ZERO,
        })
    }

    /// Treat base at or below `base_dust` as empty.
    pub fn with_base_dust(mut self, base_dust: Decimal) -> Self {
        self.base_dust = base_dust.max(Decimal::ZERO);
        self.holding_side = classify(self.base_balance, self.secondary_balance, self.base_dust);
        self
    }

    pub fn base_balance(&self) -> Decimal {
        self.base_balance
    }

    pub fn secondary_balance(&self) -> Decimal {
        self.secondary_balance
    }

    pub fn holding_side(&self) -> HoldingSide {
        self.holding_side
    }

    pub fn base_dust(&self) -> Decimal {
        self.base_dust
    }

    pub fn has_base(&self) -> bool {
        holds_base(self.base_balance, self.base_dust)
    }

    /// Whether the base balance pays for at least one quantity step at
    /// `price`, fee included.
    pub fn can_buy_at(&self, price: Decimal, fee_rate: Decimal) -> bool {
        self.has_base() && self.base_balance >= step_cost(price, fee_rate)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary_balance > DUST_TOLERANCE
    }

    /// Wallet value in base currency at `price`.
    pub fn value_at(&self, price: Decimal) -> Decimal {
        self.base_balance + self.secondary_balance * price
    }

    /// Book an execution. Balances are untouched if the report is rejected.
    pub fn apply(&mut self, report: &ExecutionReport) -> Result<BalanceChange, PortfolioError> {
        if report.is_empty() {
            return Err(PortfolioError::EmptyExecution);
        }

        let quantity = report.filled_quantity();
        let net_amount = report.net_amount();

        let (base, secondary) = match report.side {
            Side::Sell => {
                if quantity > self.secondary_balance {
                    return Err(PortfolioError::InsufficientBalance {
                        currency: "secondary",
                        required: quantity,
                        available: self.secondary_balance,
                    });
                }
                (self.base_balance + net_amount, self.secondary_balance - quantity)
            }
            Side::Buy => {
                if net_amount > self.base_balance {
                    return Err(PortfolioError::InsufficientBalance {
                        currency: "base",
                        required: net_amount,
                        available: self.base_balance,
                    });
                }
                (self.base_balance - net_amount, self.secondary_balance + quantity)
            }
        };

        if report.side == Side::Buy {
            // The walk only stops short of the budget at its last level
            let last_price = report.fills.last().map(|f| f.price).unwrap_or_default();
            self.base_dust = step_cost(last_price, report.fee_rate);
        }

        let previous_holding = self.holding_side;
        self.base_balance = base;
        self.secondary_balance = secondary;
        self.holding_side = classify(base, secondary, self.base_dust);

        Ok(BalanceChange {
            side: report.side,
            quantity,
            net_amount,
            previous_holding,
            holding_side: self.holding_side,
        })
    }
}

fn step_cost(price: Decimal, fee_rate: Decimal) -> Decimal {
    QUANTITY_STEP * price * (Decimal::ONE + fee_rate)
}

fn holds_base(base: Decimal, base_dust: Decimal) -> bool {
    base > DUST_TOLERANCE && base > base_dust
}

fn classify(base: Decimal, secondary: Decimal, base_dust: Decimal) -> HoldingSide {
    match (holds_base(base, base_dust), secondary > DUST_TOLERANCE) {
        (true, true) => HoldingSide::Mixed,
        (false, true) => HoldingSide::Secondary,
        // An empty wallet has nothing to sell; it waits on the base side
        (_, false) => HoldingSide::Base,
    }
}
