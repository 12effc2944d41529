use crate::domain::{LineItem, OrderStatus, StatusChange};

/// Custom actions for Order rows.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Attach the line items of a freshly created order.
    ///
    /// # Errors
    /// Fails if the list is empty or the order already has items.
    AttachItems(Vec<LineItem>),
    /// Move forward to `to`. Backward or equal targets leave the row unchanged.
    SetStatus(OrderStatus),
    /// Like `SetStatus`, but only while the current status equals `expected`.
    AdvanceIf { expected: OrderStatus, to: OrderStatus },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    AttachItems(usize),
    SetStatus(StatusChange),
    AdvanceIf(StatusChange),
}
