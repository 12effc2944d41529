//! Order placement and status progression.
//!
//! Placement runs its side effects in a fixed sequence: debit redeemed points,
//! credit earned points, persist the order and its items, save the address,
//! notify the admin, arm the auto-advance timer. A failure in the first three
//! steps aborts placement; the steps already done are not rolled back.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};
use crate::domain::{LineItem, NewOrder, OrderCode, OrderStatus, StatusChange};
use crate::ledger;
use crate::notification::{OrderNotice, OrderNotifier};
use crate::order_actor::OrderError;
use crate::stores::{OrderStore, ProfileStore};

/// Delay before a freshly placed order is moved to `Preparing`.
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_secs(8);

/// Codes tried per placement before giving up on a free one.
const MAX_CODE_ATTEMPTS: u32 = 16;

/// A customer's checkout.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub address: String,
    pub notes: Option<String>,
    /// Points to spend on this order.
    pub redeem_points: u64,
    /// Remember `address` as the customer's saved address.
    pub save_address: bool,
}

impl PlaceOrder {
    pub fn new(user_id: impl Into<String>, items: Vec<LineItem>, address: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items,
            address: address.into(),
            notes: None,
            redeem_points: 0,
            save_address: false,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn redeem(mut self, points: u64) -> Self {
        self.redeem_points = points;
        self
    }

    pub fn save_address(mut self) -> Self {
        self.save_address = true;
        self
    }

    pub fn subtotal(&self) -> u64 {
        self.items.iter().map(|item| item.unit_price).sum()
    }
}

/// The outcome of a successful placement.
#[derive(Debug)]
pub struct PlacedOrder {
    pub row_id: String,
    pub code: OrderCode,
    pub subtotal: u64,
    pub total: u64,
    pub points_redeemed: u64,
    pub points_earned: u64,
    /// Balance after the debit and credit.
    pub points_balance: u64,
    /// Resolves to whether the admin alert was delivered.
    pub notification: JoinHandle<bool>,
    pub auto_advance: AutoAdvance,
}

/// One-shot timer that moves an order from `Placed` to `Preparing`.
///
/// The write is conditional, so an admin transition that lands first is never
/// overwritten. Dropping the handle does not cancel the timer; call
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct AutoAdvance {
    cancel: CancellationToken,
    task: JoinHandle<Option<StatusChange>>,
}

impl AutoAdvance {
    pub fn schedule(orders: Arc<dyn OrderStore>, code: OrderCode, delay: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let span = tracing::info_span!("auto_advance", order_code = %code);
        let task = tokio::spawn(
            async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Auto-advance cancelled");
                        None
                    }
                    _ = tokio::time::sleep(delay) => {
                        match orders.advance_status_if(&code, OrderStatus::Placed, OrderStatus::Preparing).await {
                            Ok(change) => {
                                info!(applied = change.is_applied(), status = %change.snapshot().status, "Auto-advance fired");
                                Some(change)
                            }
                            Err(e) => {
                                warn!(error = %e, "Auto-advance write failed");
                                None
                            }
                        }
                    }
                }
            }
            .instrument(span),
        );
        Self { cancel, task }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the timer; `None` if it was cancelled or its write failed.
    pub async fn finished(self) -> Option<StatusChange> {
        self.task.await.ok().flatten()
    }
}

/// Places orders and applies status changes against the stores.
#[derive(Clone)]
pub struct OrderLifecycle {
    profiles: Arc<dyn ProfileStore>,
    orders: Arc<dyn OrderStore>,
    notifier: OrderNotifier,
    auto_advance: Duration,
}

impl OrderLifecycle {
    pub fn new(profiles: Arc<dyn ProfileStore>, orders: Arc<dyn OrderStore>, notifier: OrderNotifier) -> Self {
        Self {
            profiles,
            orders,
            notifier,
            auto_advance: DEFAULT_AUTO_ADVANCE,
        }
    }

    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.auto_advance = delay;
        self
    }

    /// Most points `user_id` could spend on an order of `subtotal`.
    ///
    /// An unreadable balance counts as zero.
    pub async fn redeemable_points(&self, user_id: &str, subtotal: u64) -> u64 {
        ledger::max_redeemable(self.balance_or_zero(user_id).await, subtotal)
    }

    async fn balance_or_zero(&self, user_id: &str) -> u64 {
        match self.profiles.get_balance(user_id).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(user_id, error = %e, "Could not read points balance, assuming zero");
                0
            }
        }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, items = request.items.len()))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<PlacedOrder, OrderError> {
        info!("Processing place_order request");

        // Step 0: Validate before any writes
        if request.items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let address = request.address.trim().to_string();
        if address.is_empty() {
            return Err(OrderError::MissingAddress);
        }
        let customer = self.profiles.get_profile(&request.user_id).await.map_err(|e| {
            error!(error = %e, "Customer lookup failed");
            OrderError::InvalidUser(format!("{}: {e}", request.user_id))
        })?;

        let subtotal = request.subtotal();
        let max = ledger::max_redeemable(self.balance_or_zero(&request.user_id).await, subtotal);
        if request.redeem_points > max {
            return Err(OrderError::RedemptionExceedsLimit { requested: request.redeem_points, max });
        }
        let points_redeemed = request.redeem_points;
        let total = subtotal - points_redeemed;
        let points_earned = ledger::earned_points(total);

        // Step 1: Spend redeemed points
        if points_redeemed > 0 {
            self.profiles.debit_points(&request.user_id, points_redeemed).await.map_err(|e| {
                error!(error = %e, points_redeemed, "Points debit failed");
                OrderError::PointsUpdateFailed(e.to_string())
            })?;
        }

        // Step 2: Credit earned points
        let points_balance = self.profiles.credit_points(&request.user_id, points_earned).await.map_err(|e| {
            error!(error = %e, points_redeemed, points_earned, "Points credit failed after debit; not compensated");
            OrderError::PointsUpdateFailed(e.to_string())
        })?;

        // Step 3: Persist order and line items
        let placed_at = Utc::now();
        let mut attempt = 0;
        let (code, row_id) = loop {
            let code = OrderCode::generate(placed_at, attempt);
            let new_order = NewOrder {
                code: code.clone(),
                user_id: request.user_id.clone(),
                subtotal,
                total,
                address: address.clone(),
                notes: request.notes.clone(),
                placed_at,
                points_earned,
                points_redeemed,
            };
            match self.orders.create_order(new_order).await {
                Ok(row_id) => break (code, row_id),
                Err(OrderError::DuplicateCode(_)) if attempt + 1 < MAX_CODE_ATTEMPTS => {
                    debug!(order_code = %code, attempt, "Order code taken, trying the next one");
                    attempt += 1;
                }
                Err(e) => {
                    error!(order_code = %code, error = %e, "Order persistence failed after points update; not compensated");
                    return Err(e);
                }
            }
        };
        self.orders.create_line_items(&row_id, request.items.clone()).await.map_err(|e| {
            error!(order_code = %code, error = %e, "Line item persistence failed");
            e
        })?;
        info!(order_code = %code, total, points_redeemed, points_earned, "Order placed");

        // Step 4: Remember the address
        if request.save_address {
            self.save_address(&request.user_id, &address).await;
        }

        // Step 5: Tell the admin
        let notification = self.notifier.notify_in_background(OrderNotice {
            order_code: code.clone(),
            customer,
            items: request.items,
            total,
            address,
            notes: request.notes.unwrap_or_default(),
        });

        // Step 6: Arm the placed -> preparing timer
        let auto_advance = AutoAdvance::schedule(self.orders.clone(), code.clone(), self.auto_advance);

        Ok(PlacedOrder {
            row_id,
            code,
            subtotal,
            total,
            points_redeemed,
            points_earned,
            points_balance,
            notification,
            auto_advance,
        })
    }

    async fn save_address(&self, user_id: &str, address: &str) {
        let current = self.profiles.get_saved_address(user_id).await.ok().flatten();
        if current.as_deref() == Some(address) {
            return;
        }
        if let Err(e) = self.profiles.set_saved_address(user_id, Some(address.to_string())).await {
            warn!(user_id, error = %e, "Could not save delivery address");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use crate::domain::{ContactDetails, StatusSnapshot};
    use crate::notification::tests::RecordingSink;
    use crate::notification::NotifyError;
    use crate::profile_actor::ProfileError;
    use crate::stores::{OrderPage, OrderQuery};

    /// Records every store call in order.
    #[derive(Default)]
    struct Journal {
        calls: Mutex<Vec<String>>,
        balance: Mutex<u64>,
        fail_order: bool,
        /// Codes reported as already taken before one is accepted.
        taken_codes: Mutex<u32>,
        fail_balance_read: bool,
    }

    impl Journal {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProfileStore for Journal {
        async fn get_profile(&self, _user_id: &str) -> Result<ContactDetails, ProfileError> {
            Ok(ContactDetails { name: "Alice".into(), email: "alice@example.com".into(), phone: "9876543210".into() })
        }
        async fn get_balance(&self, _user_id: &str) -> Result<u64, ProfileError> {
            if self.fail_balance_read {
                return Err(ProfileError::ActorCommunicationError("offline".into()));
            }
            Ok(*self.balance.lock().unwrap())
        }
        async fn set_balance(&self, _user_id: &str, balance: u64) -> Result<(), ProfileError> {
            self.log(format!("set_balance {balance}"));
            *self.balance.lock().unwrap() = balance;
            Ok(())
        }
        async fn get_saved_address(&self, _user_id: &str) -> Result<Option<String>, ProfileError> {
            Ok(None)
        }
        async fn set_saved_address(&self, _user_id: &str, address: Option<String>) -> Result<(), ProfileError> {
            self.log(format!("set_saved_address {}", address.unwrap_or_default()));
            Ok(())
        }
    }

    #[async_trait]
    impl OrderStore for Journal {
        async fn create_order(&self, order: NewOrder) -> Result<String, OrderError> {
            if self.fail_order {
                return Err(OrderError::ActorCommunicationError("Actor closed".into()));
            }
            {
                let mut taken = self.taken_codes.lock().unwrap();
                if *taken > 0 {
                    *taken -= 1;
                    self.log(format!("create_order taken {}", order.code));
                    return Err(OrderError::DuplicateCode(order.code.to_string()));
                }
            }
            self.log(format!("create_order total={} redeemed={}", order.total, order.points_redeemed));
            Ok("order_1".into())
        }
        async fn create_line_items(&self, row_id: &str, items: Vec<LineItem>) -> Result<(), OrderError> {
            self.log(format!("create_line_items {row_id} {}", items.len()));
            Ok(())
        }
        async fn get_status(&self, _code: &OrderCode) -> Result<Option<StatusSnapshot>, OrderError> {
            Ok(None)
        }
        async fn set_status(&self, _code: &OrderCode, status: OrderStatus) -> Result<StatusChange, OrderError> {
            self.log(format!("set_status {status}"));
            Ok(StatusChange::Applied(StatusSnapshot { status, updated_at: Utc::now() }))
        }
        async fn advance_status_if(
            &self,
            _code: &OrderCode,
            expected: OrderStatus,
            to: OrderStatus,
        ) -> Result<StatusChange, OrderError> {
            self.log(format!("advance_status_if {expected}->{to}"));
            Ok(StatusChange::Applied(StatusSnapshot { status: to, updated_at: Utc::now() }))
        }
        async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, OrderError> {
            Ok(query.paginate(Vec::new()))
        }
    }

    fn lifecycle(journal: Arc<Journal>, sink: Arc<RecordingSink>) -> OrderLifecycle {
        OrderLifecycle::new(journal.clone(), journal, OrderNotifier::new(sink))
    }

    fn cart() -> Vec<LineItem> {
        vec![LineItem::new("orange", "Orange Sunrise", 150), LineItem::new("beet", "Beet It", 150)]
    }

    #[tokio::test(start_paused = true)]
    async fn side_effects_run_in_order() {
        let journal = Arc::new(Journal { balance: Mutex::new(100), ..Default::default() });
        let sink = RecordingSink::new(Ok(()));
        let lifecycle = lifecycle(journal.clone(), sink.clone());

        let placed = lifecycle
            .place_order(PlaceOrder::new("user_1", cart(), " 12 MG Road ").redeem(100).save_address())
            .await
            .unwrap();

        assert_eq!(placed.total, 200);
        assert_eq!(placed.points_earned, 20);
        assert_eq!(placed.points_balance, 20);
        assert!(placed.notification.await.unwrap());
        assert!(placed.auto_advance.finished().await.unwrap().is_applied());

        assert_eq!(
            journal.calls(),
            vec![
                "set_balance 0",
                "set_balance 20",
                "create_order total=200 redeemed=100",
                "create_line_items order_1 2",
                "set_saved_address 12 MG Road",
                "advance_status_if placed->preparing",
            ]
        );
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn validation_happens_before_any_write() {
        let journal = Arc::new(Journal { balance: Mutex::new(100), ..Default::default() });
        let lifecycle = lifecycle(journal.clone(), RecordingSink::new(Ok(())));

        let empty = lifecycle.place_order(PlaceOrder::new("user_1", Vec::new(), "12 MG Road")).await;
        assert_eq!(empty.unwrap_err(), OrderError::EmptyCart);

        let no_address = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "   ")).await;
        assert_eq!(no_address.unwrap_err(), OrderError::MissingAddress);

        let greedy = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road").redeem(101)).await;
        assert_eq!(greedy.unwrap_err(), OrderError::RedemptionExceedsLimit { requested: 101, max: 100 });

        assert!(journal.calls().is_empty());
    }

    #[tokio::test]
    async fn unreadable_balance_allows_no_redemption() {
        let journal = Arc::new(Journal { fail_balance_read: true, ..Default::default() });
        let lifecycle = lifecycle(journal, RecordingSink::new(Ok(())));

        assert_eq!(lifecycle.redeemable_points("user_1", 300).await, 0);
        let result = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road").redeem(10)).await;
        assert_eq!(result.unwrap_err(), OrderError::RedemptionExceedsLimit { requested: 10, max: 0 });
    }

    #[tokio::test]
    async fn persistence_failure_is_not_compensated() {
        let journal = Arc::new(Journal { balance: Mutex::new(50), fail_order: true, ..Default::default() });
        let sink = RecordingSink::new(Ok(()));
        let lifecycle = lifecycle(journal.clone(), sink.clone());

        let result = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road").redeem(50)).await;
        assert!(matches!(result, Err(OrderError::ActorCommunicationError(_))));
        assert_eq!(journal.calls(), vec!["set_balance 0", "set_balance 25"]);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn taken_code_is_retried_with_the_next_one() {
        let journal = Arc::new(Journal { taken_codes: Mutex::new(2), ..Default::default() });
        let lifecycle = lifecycle(journal.clone(), RecordingSink::new(Ok(())));

        let placed = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road")).await.unwrap();
        placed.auto_advance.cancel();

        let calls = journal.calls();
        assert_eq!(calls[0], "set_balance 30");
        let first = calls[1].strip_prefix("create_order taken ").unwrap().to_string();
        let second = calls[2].strip_prefix("create_order taken ").unwrap().to_string();
        assert_ne!(first, second);
        assert_ne!(placed.code.as_str(), first);
        assert_ne!(placed.code.as_str(), second);
        assert_eq!(calls[3], "create_order total=300 redeemed=0");
    }

    #[tokio::test]
    async fn gives_up_when_no_code_is_free() {
        let journal = Arc::new(Journal { taken_codes: Mutex::new(u32::MAX), ..Default::default() });
        let lifecycle = lifecycle(journal.clone(), RecordingSink::new(Ok(())));

        let result = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road")).await;
        assert!(matches!(result, Err(OrderError::DuplicateCode(_))));
        let attempts = journal.calls().iter().filter(|c| c.starts_with("create_order taken")).count();
        assert_eq!(attempts, MAX_CODE_ATTEMPTS as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn notification_failure_does_not_fail_placement() {
        let journal = Arc::new(Journal::default());
        let lifecycle = lifecycle(journal, RecordingSink::new(Err(NotifyError::Transport("down".into()))));

        let placed = lifecycle.place_order(PlaceOrder::new("user_1", cart(), "12 MG Road")).await.unwrap();
        assert!(!placed.notification.await.unwrap());
        assert_eq!(placed.points_earned, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_auto_advance_never_writes() {
        let journal = Arc::new(Journal::default());
        let timer = AutoAdvance::schedule(journal.clone(), OrderCode::from("SJ-1"), DEFAULT_AUTO_ADVANCE);
        timer.cancel();

        assert_eq!(timer.finished().await, None);
        tokio::time::sleep(DEFAULT_AUTO_ADVANCE * 2).await;
        assert!(journal.calls().is_empty());
    }
}
