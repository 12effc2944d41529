//! Collaborator interfaces consumed by the order core.
//!
//! The actor-backed clients in [`crate::clients`] implement all of these; tests
//! and alternative backends can substitute their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use crate::domain::{
    ContactDetails, LineItem, NewOrder, Order, OrderCode, OrderStatus, Review, ReviewDraft, StatusChange,
    StatusSnapshot,
};
use crate::ledger;
use crate::order_actor::OrderError;
use crate::profile_actor::ProfileError;
use crate::review_actor::ReviewError;

/// Orders per page in the admin listing.
pub const ADMIN_PAGE_SIZE: usize = 20;
/// Shorter search strings are ignored.
pub const MIN_SEARCH_LEN: usize = 2;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<ContactDetails, ProfileError>;
    async fn get_balance(&self, user_id: &str) -> Result<u64, ProfileError>;
    async fn set_balance(&self, user_id: &str, balance: u64) -> Result<(), ProfileError>;
    async fn get_saved_address(&self, user_id: &str) -> Result<Option<String>, ProfileError>;
    async fn set_saved_address(&self, user_id: &str, address: Option<String>) -> Result<(), ProfileError>;

    /// Adds points and returns the new balance.
    ///
    /// The default is a read-modify-write over `get_balance`/`set_balance`.
    async fn credit_points(&self, user_id: &str, amount: u64) -> Result<u64, ProfileError> {
        let updated = ledger::credit(self.get_balance(user_id).await?, amount);
        self.set_balance(user_id, updated).await?;
        Ok(updated)
    }

    /// Spends points, clamping at zero, and returns the new balance.
    async fn debit_points(&self, user_id: &str, amount: u64) -> Result<u64, ProfileError> {
        let updated = ledger::debit(self.get_balance(user_id).await?, amount);
        self.set_balance(user_id, updated).await?;
        Ok(updated)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order row in `Placed` status and returns its row id.
    async fn create_order(&self, order: NewOrder) -> Result<String, OrderError>;
    async fn create_line_items(&self, row_id: &str, items: Vec<LineItem>) -> Result<(), OrderError>;
    async fn get_status(&self, code: &OrderCode) -> Result<Option<StatusSnapshot>, OrderError>;
    /// Forward-only write; backward or equal targets come back `Unchanged`.
    async fn set_status(&self, code: &OrderCode, status: OrderStatus) -> Result<StatusChange, OrderError>;
    /// Writes `to` only while the stored status is still `expected`.
    async fn advance_status_if(
        &self,
        code: &OrderCode,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusChange, OrderError>;
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, OrderError>;

    async fn list_orders_for_user(&self, user_id: &str, query: &OrderQuery) -> Result<OrderPage, OrderError> {
        let query = query.clone().for_user(user_id);
        self.list_orders(&query).await
    }
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Status updates for one order. Dropping the subscription unsubscribes.
    async fn subscribe(&self, code: &OrderCode) -> Result<StatusSubscription, OrderError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// All reviews, newest first.
    async fn list_reviews(&self) -> Result<Vec<Review>, ReviewError>;
    /// Reviews of one juice, newest first.
    async fn list_reviews_for_item(&self, item_id: &str) -> Result<Vec<Review>, ReviewError>;
    async fn create_review(&self, draft: ReviewDraft) -> Result<Review, ReviewError>;
}

// =============================================================================
// Change feed subscription
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Changed(StatusSnapshot),
    /// Updates were dropped; the subscriber should re-read the status.
    Lagged(u64),
}

/// Receives changed order rows and yields the ones for a single order code.
pub struct StatusSubscription {
    code: OrderCode,
    receiver: broadcast::Receiver<Order>,
}

impl StatusSubscription {
    pub fn new(code: OrderCode, receiver: broadcast::Receiver<Order>) -> Self {
        Self { code, receiver }
    }

    pub fn order_code(&self) -> &OrderCode {
        &self.code
    }

    /// Next event for this order, or `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(order) if order.code == self.code => return Some(FeedEvent::Changed(order.snapshot())),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(order_code = %self.code, skipped, "Change feed lagged");
                    return Some(FeedEvent::Lagged(skipped));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Order listing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

/// Ordering by placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub user_id: Option<String>,
    pub status: StatusFilter,
    pub search: Option<String>,
    /// Earliest placement time, inclusive.
    pub placed_since: Option<DateTime<Utc>>,
    /// Latest placement time, exclusive.
    pub placed_before: Option<DateTime<Utc>>,
    pub sort: SortOrder,
    /// Zero-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            status: StatusFilter::All,
            search: None,
            placed_since: None,
            placed_before: None,
            sort: SortOrder::Newest,
            page: 0,
            page_size: ADMIN_PAGE_SIZE,
        }
    }
}

impl OrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn placed_since(mut self, at: DateTime<Utc>) -> Self {
        self.placed_since = Some(at);
        self
    }

    pub fn placed_before(mut self, at: DateTime<Utc>) -> Self {
        self.placed_before = Some(at);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Lowercased search text, if long enough to apply.
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        (term.chars().count() >= MIN_SEARCH_LEN).then(|| term.to_lowercase())
    }

    /// Whether `order` passes the user, status, date and search filters.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = &self.user_id {
            if &order.user_id != user_id {
                return false;
            }
        }
        if let StatusFilter::Only(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if self.placed_since.is_some_and(|since| order.placed_at < since)
            || self.placed_before.is_some_and(|before| order.placed_at >= before)
        {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                order.code.as_str().to_lowercase().contains(&term) || order.address.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    /// Sorts already-filtered orders and cuts out the requested page.
    pub fn paginate(&self, mut orders: Vec<Order>) -> OrderPage {
        orders.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then_with(|| a.code.as_str().cmp(b.code.as_str())));
        if self.sort == SortOrder::Newest {
            orders.reverse();
        }
        let page_size = self.page_size.max(1);
        let skip = self.page.saturating_mul(page_size);
        let orders: Vec<Order> = orders.into_iter().skip(skip).take(page_size).collect();
        OrderPage {
            page: self.page,
            has_more: orders.len() == page_size,
            orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: usize,
    /// A full page suggests more orders may follow.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn order(code: &str, user: &str, address: &str, status: OrderStatus, minute: i64) -> Order {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute);
        Order {
            row_id: format!("row_{code}"),
            code: OrderCode::from(code),
            user_id: user.into(),
            items: vec![LineItem::new("orange", "Orange", 120)],
            subtotal: 120,
            total: 120,
            address: address.into(),
            notes: None,
            status,
            placed_at: at,
            updated_at: at,
            points_earned: 12,
            points_redeemed: 0,
        }
    }

    #[test]
    fn short_search_is_ignored() {
        let query = OrderQuery::new().search(" x ");
        assert_eq!(query.search_term(), None);
        assert!(query.matches(&order("SJ-1", "u1", "Park Street", OrderStatus::Placed, 0)));
    }

    #[test]
    fn search_matches_code_or_address_case_insensitively() {
        let query = OrderQuery::new().search("park");
        assert!(query.matches(&order("SJ-1", "u1", "12 Park Street", OrderStatus::Placed, 0)));
        assert!(!query.matches(&order("SJ-2", "u1", "MG Road", OrderStatus::Placed, 0)));

        let query = OrderQuery::new().search("sj-2");
        assert!(query.matches(&order("SJ-2", "u1", "MG Road", OrderStatus::Placed, 0)));
    }

    #[test]
    fn user_and_status_filters() {
        let query = OrderQuery::new().for_user("u1").status(StatusFilter::Only(OrderStatus::Preparing));
        assert!(query.matches(&order("SJ-1", "u1", "a", OrderStatus::Preparing, 0)));
        assert!(!query.matches(&order("SJ-2", "u2", "a", OrderStatus::Preparing, 0)));
        assert!(!query.matches(&order("SJ-3", "u1", "a", OrderStatus::Placed, 0)));
    }

    #[test]
    fn date_range_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 10, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 1, 9, 20, 0).unwrap();
        let query = OrderQuery::new().placed_since(start).placed_before(end);

        assert!(!query.matches(&order("SJ-1", "u1", "a", OrderStatus::Placed, 9)));
        assert!(query.matches(&order("SJ-2", "u1", "a", OrderStatus::Placed, 10)));
        assert!(query.matches(&order("SJ-3", "u1", "a", OrderStatus::Placed, 19)));
        assert!(!query.matches(&order("SJ-4", "u1", "a", OrderStatus::Placed, 20)));

        let open_ended = OrderQuery::new().placed_since(start);
        assert!(open_ended.matches(&order("SJ-5", "u1", "a", OrderStatus::Placed, 600)));
    }

    #[test]
    fn huge_page_number_is_just_empty() {
        let orders: Vec<Order> = (0..3).map(|i| order(&format!("SJ-{i}"), "u1", "a", OrderStatus::Placed, i)).collect();
        let page = OrderQuery::new().page(usize::MAX).paginate(orders);
        assert!(page.orders.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.page, usize::MAX);
    }

    #[test]
    fn paginate_sorts_and_pages() {
        let orders: Vec<Order> = (0..25)
            .map(|i| order(&format!("SJ-{i:02}"), "u1", "a", OrderStatus::Placed, i))
            .collect();

        let first = OrderQuery::new().paginate(orders.clone());
        assert_eq!(first.orders.len(), ADMIN_PAGE_SIZE);
        assert!(first.has_more);
        assert_eq!(first.orders[0].code.as_str(), "SJ-24");

        let second = OrderQuery::new().page(1).paginate(orders.clone());
        assert_eq!(second.orders.len(), 5);
        assert!(!second.has_more);

        let oldest = OrderQuery::new().sort(SortOrder::Oldest).paginate(orders);
        assert_eq!(oldest.orders[0].code.as_str(), "SJ-00");
    }
}
