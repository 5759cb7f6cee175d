//! Repair order lifecycle status.

use serde::{Deserialize, Serialize};

/// Where an order is in its lifecycle.
///
/// ```text
/// Received ──► Confirmed ──► Completed ──► PickedUp
///     │            │             │
///     └────────────┴─────────────┴──► Cancelled
/// ```
///
/// Status is derived from the lifecycle timestamps an order carries; a newly
/// created order is always `Received`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Phone handed over, waiting for the customer to confirm the quote.
    #[default]
    Received,

    /// Customer agreed to the repair.
    Confirmed,

    /// Repair finished, waiting for pick-up.
    Completed,

    /// Phone returned to the customer (terminal state).
    PickedUp,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::PickedUp | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
