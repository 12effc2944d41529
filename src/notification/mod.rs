//! Best-effort admin alerts for new orders.
//!
//! A [`NotificationSink`] reports typed failures; [`OrderNotifier`] absorbs
//! them into a `bool` so that order placement never depends on delivery.

mod http;

pub use http::{HttpNotificationSink, PLACEHOLDER_MARKER};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};
use crate::domain::{ContactDetails, LineItem, OrderCode};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotifyError {
    #[error("notification endpoint is not configured")]
    Unconfigured,
    #[error("notification request failed: {0}")]
    Transport(String),
    #[error("notification endpoint answered {0}")]
    Rejected(u16),
}

/// Everything the admin needs to fulfil a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotice {
    pub order_code: OrderCode,
    pub customer: ContactDetails,
    pub items: Vec<LineItem>,
    pub total: u64,
    pub address: String,
    pub notes: String,
}

/// JSON body sent to the notification endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "_subject")]
    pub subject: String,
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: String,
    pub total: String,
    pub address: String,
    pub notes: String,
    pub message: String,
}

pub fn format_price(amount: u64) -> String {
    format!("₹{amount}")
}

impl OrderNotice {
    /// One `- name: price` line per item.
    pub fn items_list(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("- {}: {}", item.name, format_price(item.unit_price)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> String {
        format!(
            "New order {} from {} ({}).\n\nItems:\n{}\n\nTotal: {}\n\nDelivery address: {}\n\nNotes: {}",
            self.order_code,
            self.customer.name,
            self.customer.email,
            self.items_list(),
            format_price(self.total),
            self.address,
            self.notes,
        )
    }

    pub fn payload(&self) -> NotificationPayload {
        NotificationPayload {
            subject: format!("[SapJuice] New order {}", self.order_code),
            order_id: self.order_code.to_string(),
            customer_name: self.customer.name.clone(),
            customer_email: self.customer.email.clone(),
            customer_phone: self.customer.phone.clone(),
            items: self.items_list(),
            total: format_price(self.total),
            address: self.address.clone(),
            notes: self.notes.clone(),
            message: self.summary(),
        }
    }
}

/// Somewhere new-order alerts can be sent.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn dispatch(&self, notice: &OrderNotice) -> Result<(), NotifyError>;
}

/// Fire-and-forget wrapper around a [`NotificationSink`].
#[derive(Clone)]
pub struct OrderNotifier {
    sink: Arc<dyn NotificationSink>,
}

impl OrderNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Sends the alert once. Failures are logged and reported as `false`, never retried.
    pub async fn notify(&self, notice: &OrderNotice) -> bool {
        match self.sink.dispatch(notice).await {
            Ok(()) => {
                info!(order_code = %notice.order_code, "Admin notified of new order");
                true
            }
            Err(NotifyError::Unconfigured) => {
                info!(order_code = %notice.order_code, "Order notification skipped: endpoint not configured");
                false
            }
            Err(e) => {
                warn!(order_code = %notice.order_code, error = %e, "Order notification failed");
                false
            }
        }
    }

    /// Runs [`notify`](Self::notify) on a separate task.
    pub fn notify_in_background(&self, notice: OrderNotice) -> JoinHandle<bool> {
        let notifier = self.clone();
        let span = tracing::info_span!("order_notification", order_code = %notice.order_code);
        tokio::spawn(async move { notifier.notify(&notice).await }.instrument(span))
    }
}
