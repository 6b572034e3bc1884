//! Typed order model: market, stop-loss, take-profit, trailing-stop and
//! one-cancels-other (OCO) composites.
//!
//! Pure data and validation, no I/O. The OCO invariant lives here: at most
//! one child of a pair ever reaches TRIGGERED, and triggering one moves the
//! sibling to CANCELLED in the same operation.

use crate::domain::error::DomainError;
use crate::domain::values::action::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Active,
    Triggered,
    Cancelled,
    Expired,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Active => write!(f, "ACTIVE"),
            OrderStatus::Triggered => write!(f, "TRIGGERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// One rung of a take-profit ladder: sell `fraction` of the position once
/// price reaches `price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderRung {
    pub price: f64,
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    Market {
        side: OrderSide,
        price: f64,
    },
    /// Exit order protecting the downside. Side is always SELL.
    StopLoss {
        stop_price: f64,
        trigger_price: f64,
    },
    /// Exit order harvesting the upside. Side is always SELL.
    TakeProfit {
        target_price: f64,
        profit_pct: f64,
        #[serde(default)]
        ladder: Vec<LadderRung>,
    },
    /// Ratcheting exit. `high_water_mark` and `stop_price` only ever move up.
    TrailingStop {
        trail_pct: f64,
        high_water_mark: f64,
        stop_price: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub quantity: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Links OCO children to their composite parent id.
    pub parent_id: Option<String>,
}

impl Order {
    pub fn new(symbol: &str, kind: OrderKind, quantity: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_uppercase(),
            kind,
            status: OrderStatus::Active,
            quantity,
            created_at: Utc::now(),
            expires_at: None,
            parent_id: None,
        }
    }

    pub fn market(symbol: &str, side: OrderSide, price: f64, quantity: u64) -> Self {
        Self::new(symbol, OrderKind::Market { side, price }, quantity)
    }

    pub fn stop_loss(symbol: &str, stop_price: f64, quantity: u64) -> Self {
        Self::new(
            symbol,
            OrderKind::StopLoss {
                stop_price,
                trigger_price: stop_price,
            },
            quantity,
        )
    }

    pub fn take_profit(symbol: &str, target_price: f64, profit_pct: f64, quantity: u64) -> Self {
        Self::new(
            symbol,
            OrderKind::TakeProfit {
                target_price,
                profit_pct,
                ladder: Vec::new(),
            },
            quantity,
        )
    }

    pub fn trailing_stop(symbol: &str, trail_pct: f64, entry_price: f64, quantity: u64) -> Self {
        Self::new(
            symbol,
            OrderKind::TrailingStop {
                trail_pct,
                high_water_mark: entry_price,
                stop_price: entry_price * (1.0 - trail_pct),
            },
            quantity,
        )
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Active)
    }

    /// Expire the order if its deadline has passed. Returns true if it did.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(deadline) = self.expires_at {
            if self.is_open() && now >= deadline {
                self.status = OrderStatus::Expired;
                return true;
            }
        }
        false
    }

    /// Feed a price observation to a trailing stop. The high-water mark and
    /// stop price ratchet upward only, never backward, even when price
    /// retraces. Returns true if the stop fired.
    pub fn observe_price(&mut self, price: f64) -> bool {
        if !self.is_open() {
            return false;
        }
        if let OrderKind::TrailingStop {
            trail_pct,
            high_water_mark,
            stop_price,
        } = &mut self.kind
        {
            if price > *high_water_mark {
                *high_water_mark = price;
                let candidate = *high_water_mark * (1.0 - *trail_pct);
                if candidate > *stop_price {
                    *stop_price = candidate;
                }
            }
            if price <= *stop_price {
                self.status = OrderStatus::Triggered;
                return true;
            }
        }
        false
    }
}

/// A one-cancels-other pair: one stop-loss and one take-profit sharing a
/// parent id, symbol and quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcoPair {
    pub parent_id: String,
    pub stop_loss: Order,
    pub take_profit: Order,
}

impl OcoPair {
    pub fn new(mut stop_loss: Order, mut take_profit: Order) -> Result<Self, DomainError> {
        if !matches!(stop_loss.kind, OrderKind::StopLoss { .. }) {
            return Err(DomainError::InvalidInput(
                "OCO stop leg must be a stop-loss order".to_string(),
            ));
        }
        if !matches!(take_profit.kind, OrderKind::TakeProfit { .. }) {
            return Err(DomainError::InvalidInput(
                "OCO profit leg must be a take-profit order".to_string(),
            ));
        }
        if stop_loss.symbol != take_profit.symbol {
            return Err(DomainError::InvalidInput(format!(
                "OCO children must share a symbol ({} vs {})",
                stop_loss.symbol, take_profit.symbol
            )));
        }
        if stop_loss.quantity != take_profit.quantity {
            return Err(DomainError::InvalidInput(format!(
                "OCO children must share a quantity ({} vs {})",
                stop_loss.quantity, take_profit.quantity
            )));
        }
        let parent_id = uuid::Uuid::new_v4().to_string();
        stop_loss.parent_id = Some(parent_id.clone());
        take_profit.parent_id = Some(parent_id.clone());
        Ok(Self {
            parent_id,
            stop_loss,
            take_profit,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.stop_loss.symbol
    }

    pub fn quantity(&self) -> u64 {
        self.stop_loss.quantity
    }

    pub fn is_open(&self) -> bool {
        self.stop_loss.is_open() && self.take_profit.is_open()
    }

    /// Trigger the stop-loss leg; the take-profit sibling is cancelled in
    /// the same operation.
    pub fn trigger_stop_loss(&mut self) -> Result<(), DomainError> {
        self.trigger(true)
    }

    /// Trigger the take-profit leg; the stop-loss sibling is cancelled in
    /// the same operation.
    pub fn trigger_take_profit(&mut self) -> Result<(), DomainError> {
        self.trigger(false)
    }

    fn trigger(&mut self, stop_leg: bool) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::InvalidInput(format!(
                "OCO pair {} is no longer open",
                self.parent_id
            )));
        }
        let (fired, sibling) = if stop_leg {
            (&mut self.stop_loss, &mut self.take_profit)
        } else {
            (&mut self.take_profit, &mut self.stop_loss)
        };
        fired.status = OrderStatus::Triggered;
        sibling.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Cancel a single child by id. Only legal once its sibling has already
    /// been triggered or cancelled; cancelling one leg of a live pair would
    /// leave an unpaired exit, so it is rejected.
    pub fn cancel_child(&mut self, child_id: &str) -> Result<(), DomainError> {
        let (child, sibling) = if self.stop_loss.id == child_id {
            (&mut self.stop_loss, &self.take_profit)
        } else if self.take_profit.id == child_id {
            (&mut self.take_profit, &self.stop_loss)
        } else {
            return Err(DomainError::InvalidInput(format!(
                "order {child_id} is not part of OCO pair {}",
                self.parent_id
            )));
        };
        if sibling.is_open() {
            return Err(DomainError::InvalidInput(
                "cannot cancel one OCO child while its sibling is still open".to_string(),
            ));
        }
        if child.is_open() {
            child.status = OrderStatus::Cancelled;
        }
        Ok(())
    }

    /// Cancel both children together. Idempotent for already-closed legs.
    pub fn cancel_both(&mut self) {
        if self.stop_loss.is_open() {
            self.stop_loss.status = OrderStatus::Cancelled;
        }
        if self.take_profit.is_open() {
            self.take_profit.status = OrderStatus::Cancelled;
        }
    }

    /// Build the exit pair protecting a filled buy: stop at
    /// `entry * (1 - stop_pct)`, target at `entry * (1 + take_profit_pct)`.
    pub fn exit_pair_for(
        symbol: &str,
        entry_price: f64,
        quantity: u64,
        stop_pct: f64,
        take_profit_pct: f64,
    ) -> Result<Self, DomainError> {
        if entry_price <= 0.0 || quantity == 0 {
            return Err(DomainError::InvalidInput(
                "exit pair requires a positive entry price and quantity".to_string(),
            ));
        }
        let stop = Order::stop_loss(symbol, entry_price * (1.0 - stop_pct), quantity);
        let profit = Order::take_profit(
            symbol,
            entry_price * (1.0 + take_profit_pct),
            take_profit_pct * 100.0,
            quantity,
        );
        Self::new(stop, profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> OcoPair {
        OcoPair::exit_pair_for("AAPL", 100.0, 10, 0.10, 0.20).unwrap()
    }

    #[test]
    fn test_exit_pair_prices() {
        let p = pair();
        match p.stop_loss.kind {
            OrderKind::StopLoss { stop_price, .. } => assert!((stop_price - 90.0).abs() < 1e-9),
            _ => panic!("wrong kind"),
        }
        match p.take_profit.kind {
            OrderKind::TakeProfit { target_price, .. } => {
                assert!((target_price - 120.0).abs() < 1e-9)
            }
            _ => panic!("wrong kind"),
        }
        assert_eq!(p.stop_loss.parent_id, Some(p.parent_id.clone()));
        assert_eq!(p.take_profit.parent_id, Some(p.parent_id.clone()));
    }

    #[test]
    fn test_oco_rejects_mismatched_children() {
        let stop = Order::stop_loss("AAPL", 90.0, 10);
        let profit = Order::take_profit("MSFT", 120.0, 20.0, 10);
        assert!(OcoPair::new(stop, profit).is_err());

        let stop = Order::stop_loss("AAPL", 90.0, 10);
        let profit = Order::take_profit("AAPL", 120.0, 20.0, 5);
        assert!(OcoPair::new(stop, profit).is_err());
    }

    #[test]
    fn test_trigger_stop_cancels_profit() {
        let mut p = pair();
        p.trigger_stop_loss().unwrap();
        assert_eq!(p.stop_loss.status, OrderStatus::Triggered);
        assert_eq!(p.take_profit.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_trigger_profit_cancels_stop() {
        let mut p = pair();
        p.trigger_take_profit().unwrap();
        assert_eq!(p.take_profit.status, OrderStatus::Triggered);
        assert_eq!(p.stop_loss.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_at_most_one_trigger() {
        let mut p = pair();
        p.trigger_stop_loss().unwrap();
        assert!(p.trigger_take_profit().is_err());
        assert_eq!(p.take_profit.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_single_child_of_live_pair_rejected() {
        let mut p = pair();
        let id = p.take_profit.id.clone();
        assert!(p.cancel_child(&id).is_err());
        assert!(p.take_profit.is_open());
    }

    #[test]
    fn test_cancel_child_after_sibling_triggered() {
        let mut p = pair();
        p.trigger_stop_loss().unwrap();
        // Sibling already cancelled by the trigger; re-cancel is a no-op.
        let id = p.take_profit.id.clone();
        assert!(p.cancel_child(&id).is_ok());
        assert_eq!(p.take_profit.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_both() {
        let mut p = pair();
        p.cancel_both();
        assert_eq!(p.stop_loss.status, OrderStatus::Cancelled);
        assert_eq!(p.take_profit.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_trailing_stop_ratchets_up_only() {
        let mut o = Order::trailing_stop("TSLA", 0.10, 100.0, 5);
        assert!(!o.observe_price(110.0)); // hwm 110, stop 99
        assert!(!o.observe_price(105.0)); // retrace: hwm stays 110
        match &o.kind {
            OrderKind::TrailingStop {
                high_water_mark,
                stop_price,
                ..
            } => {
                assert!((high_water_mark - 110.0).abs() < 1e-9);
                assert!((stop_price - 99.0).abs() < 1e-9);
            }
            _ => panic!("wrong kind"),
        }
        assert!(o.observe_price(98.0)); // below stop → triggered
        assert_eq!(o.status, OrderStatus::Triggered);
    }

    #[test]
    fn test_trailing_stop_ignores_observations_once_closed() {
        let mut o = Order::trailing_stop("TSLA", 0.10, 100.0, 5);
        o.status = OrderStatus::Cancelled;
        assert!(!o.observe_price(50.0));
        assert_eq!(o.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut o = Order::stop_loss("AAPL", 90.0, 10).with_expiry(now - chrono::Duration::hours(1));
        assert!(o.expire_if_due(now));
        assert_eq!(o.status, OrderStatus::Expired);
        // Already expired: second call is a no-op.
        assert!(!o.expire_if_due(now));
    }
}
