//! Operations behind the admin dashboard.

use std::sync::Arc;
use tracing::{info, instrument};
use crate::domain::{OrderCode, OrderStatus, StatusChange};
use crate::order_actor::OrderError;
use crate::stores::{OrderPage, OrderQuery, OrderStore};

/// Lists orders and moves them forward on behalf of staff.
#[derive(Clone)]
pub struct AdminConsole {
    orders: Arc<dyn OrderStore>,
}

impl AdminConsole {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// One page of orders across all customers.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, OrderError> {
        let mut query = query.clone();
        query.user_id = None;
        let page = self.orders.list_orders(&query).await?;
        info!(count = page.orders.len(), has_more = page.has_more, "Orders listed");
        Ok(page)
    }

    /// Marks an order as having reached `status`.
    ///
    /// Only `Preparing`, `OutForDelivery` and `Delivered` are accepted; moving
    /// to an earlier or equal status leaves the order unchanged.
    #[instrument(skip(self))]
    pub async fn update_status(&self, code: &OrderCode, status: OrderStatus) -> Result<StatusChange, OrderError> {
        if status == OrderStatus::Placed {
            return Err(OrderError::ValidationError("orders cannot be moved back to placed".to_string()));
        }
        let change = self.orders.set_status(code, status).await?;
        info!(applied = change.is_applied(), current = %change.snapshot().status, "Admin status update");
        Ok(change)
    }
}
