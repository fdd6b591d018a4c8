// Paper trading: limit orders fill immediately against in-memory balances

use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;
use crate::clients::{OrderConfirmation, OrderPlacementClient};
use crate::error::{TradingError, TradingResult};
use crate::simulation::execution_simulator::apply_fee;
use crate::types::Side;

#[derive(Debug)]
pub struct PaperTradingClient {
    balances: Mutex<HashMap<String, Decimal>>,
    orders: Mutex<Vec<OrderConfirmation>>,
    fee_rate: Decimal,
}

impl PaperTradingClient {
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            fee_rate,
        }
    }

    pub fn with_balance(mut self, currency: &str, amount: Decimal) -> Self {
        self.balances.get_mut().insert(currency.to_string(), amount);
        self
    }

    /// Orders filled so far, oldest first.
    pub async fn orders(&self) -> Vec<OrderConfirmation> {
        self.orders.lock().await.clone()
    }
}

fn split_market(market: &str) -> TradingResult<(&str, &str)> {
    market
        .split_once('-')
        .ok_or_else(|| TradingError::OrderRejected(format!("INVALID_MARKET: {}", market)))
}

#[async_trait]
impl OrderPlacementClient for PaperTradingClient {
    async fn place_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        rate: Decimal,
    ) -> TradingResult<OrderConfirmation> {
        if quantity <= Decimal::ZERO || rate <= Decimal::ZERO {
            return Err(TradingError::OrderRejected(format!(
                "INVALID_ORDER: {} {} @ {}",
                side, quantity, rate
            )));
        }

        let (base, secondary) = split_market(market)?;
        let net = apply_fee(side, quantity * rate, self.fee_rate);

        let mut balances = self.balances.lock().await;
        let base_held = balances.get(base).copied().unwrap_or_default();
        let secondary_held = balances.get(secondary).copied().unwrap_or_default();

        let (new_base, new_secondary) = match side {
            Side::Buy if net > base_held => {
                return Err(TradingError::OrderRejected(format!(
                    "INSUFFICIENT_FUNDS: need {} {}, have {}",
                    net, base, base_held
                )));
            }
            Side::Buy => (base_held - net, secondary_held + quantity),
            Side::Sell if quantity > secondary_held => {
                return Err(TradingError::OrderRejected(format!(
                    "INSUFFICIENT_FUNDS: need {} {}, have {}",
                    quantity, secondary, secondary_held
                )));
            }
            Side::Sell => (base_held + net, secondary_held - quantity),
        };

        balances.insert(base.to_string(), new_base);
        balances.insert(secondary.to_string(), new_secondary);
        drop(balances);

        let confirmation = OrderConfirmation {
            order_id: Uuid::new_v4().to_string(),
            market: market.to_string(),
            side,
            quantity,
            rate,
            timestamp: Utc::now(),
        };

        info!(
            "📝 Paper {} order filled: {} {} @ {} (ID: {})",
            side, quantity, market, rate, &confirmation.order_id[..8]
        );

        self.orders.lock().await.push(confirmation.clone());
        Ok(confirmation)
    }

    async fn get_balances(&self) -> TradingResult<HashMap<String, Decimal>> {
        Ok(self.balances.lock().await.clone())
    }

    fn is_paper(&self) -> bool {
        true
    }
}
