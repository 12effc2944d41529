use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Position of an order in its delivery lifecycle.
///
/// Variants are declared in lifecycle order, so the derived `Ord` is the
/// progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Preparing,
    OutForDelivery,
    Delivered,
}

/// Why a requested status change does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Unchanged(OrderStatus),
    #[error("cannot move order back from {from} to {to}")]
    Backward { from: OrderStatus, to: OrderStatus },
    #[error("order is delivered and cannot change")]
    Terminal,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Placed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Placed => "Order Placed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OrderStatus::Placed => "Your order has been received",
            OrderStatus::Preparing => "Your juices are being freshly pressed",
            OrderStatus::OutForDelivery => "Your rider is on the way",
            OrderStatus::Delivered => "Enjoy your fresh juice!",
        }
    }

    /// Expected time spent in this status before the next one. `None` once delivered.
    pub fn progression_delay(self) -> Option<Duration> {
        match self {
            OrderStatus::Placed => Some(Duration::from_secs(8)),
            OrderStatus::Preparing => Some(Duration::from_secs(15)),
            OrderStatus::OutForDelivery => Some(Duration::from_secs(20)),
            OrderStatus::Delivered => None,
        }
    }

    /// The status that follows this one, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    /// Accepts any forward move, including skips such as `Placed -> Delivered`.
    pub fn validate_transition(self, to: OrderStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal);
        }
        if to == self {
            return Err(TransitionError::Unchanged(self));
        }
        if to < self {
            return Err(TransitionError::Backward { from: self, to });
        }
        Ok(())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CODE_SPACE: i64 = 100_000_000;

/// Customer-facing order reference, e.g. `SJ-48213907`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Derives a code from the last eight digits of the placement time in milliseconds.
    ///
    /// `attempt` shifts the number forward when earlier codes for the same instant
    /// were already taken; attempt 0 is the plain timestamp.
    pub fn generate(at: DateTime<Utc>, attempt: u32) -> Self {
        let number = (at.timestamp_millis().rem_euclid(CODE_SPACE) + i64::from(attempt)) % CODE_SPACE;
        Self(format!("SJ-{number:08}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for OrderCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One juice in an order. Prices are whole rupees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    pub unit_price: u64,
}

impl LineItem {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, unit_price: u64) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            unit_price,
        }
    }
}

/// A placed customer order, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub row_id: String,
    pub code: OrderCode,
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub subtotal: u64,
    pub total: u64,
    pub address: String,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub points_earned: u64,
    pub points_redeemed: u64,
}

impl Order {
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// Row payload for creating an order. Line items are attached separately.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub code: OrderCode,
    pub user_id: String,
    pub subtotal: u64,
    pub total: u64,
    pub address: String,
    pub notes: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub points_earned: u64,
    pub points_redeemed: u64,
}

/// Authoritative status of an order at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied(StatusSnapshot),
    /// The write did not apply; the row is unchanged.
    Unchanged(StatusSnapshot),
}

impl StatusChange {
    pub fn snapshot(&self) -> StatusSnapshot {
        match self {
            StatusChange::Applied(s) | StatusChange::Unchanged(s) => *s,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StatusChange::Applied(_))
    }
}
