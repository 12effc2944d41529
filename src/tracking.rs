//! Keeps a displayed order status in step with the authoritative store.
//!
//! Three inputs feed the displayed status: one fetch when tracking starts, the
//! change feed for the order, and a one-shot timer that nudges a `Placed`
//! order to `Preparing`. Updates from the store always win over local state.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use crate::domain::{OrderCode, OrderStatus};
use crate::lifecycle::DEFAULT_AUTO_ADVANCE;
use crate::stores::{ChangeFeed, FeedEvent, OrderStore, StatusSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Delay before a `Placed` order is nudged to `Preparing`.
    pub auto_advance: Duration,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self { auto_advance: DEFAULT_AUTO_ADVANCE }
    }
}

/// A live view of one order's status.
///
/// Dropping the tracker (or calling [`close`](Self::close)) stops the timer and
/// the subscription. A status write already in flight still completes.
pub struct OrderTracker {
    code: OrderCode,
    status: watch::Receiver<OrderStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl OrderTracker {
    pub async fn start<S>(store: Arc<S>, code: OrderCode, settings: TrackingSettings) -> Self
    where
        S: OrderStore + ChangeFeed + ?Sized + 'static,
    {
        // Subscribe before the first read so no update can fall between them.
        let feed = match store.subscribe(&code).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!(order_code = %code, error = %e, "Change feed unavailable, tracking without live updates");
                None
            }
        };
        let initial = fetch_status(store.as_ref(), &code).await;
        info!(order_code = %code, status = %initial, "Tracking order");

        let (tx, status) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let sync = Synchronizer {
            store,
            code: code.clone(),
            display: tx,
            feed,
            cancel: cancel.clone(),
        };
        let span = tracing::info_span!("order_tracking", order_code = %code);
        let timer = (initial == OrderStatus::Placed).then_some(settings.auto_advance);
        let task = tokio::spawn(sync.run(timer).instrument(span));

        Self {
            code,
            status,
            cancel,
            task: Some(task),
        }
    }

    pub fn order_code(&self) -> &OrderCode {
        &self.code
    }

    /// The status currently displayed.
    pub fn status(&self) -> OrderStatus {
        *self.status.borrow()
    }

    /// A receiver that observes every displayed status change.
    pub fn watch(&self) -> watch::Receiver<OrderStatus> {
        self.status.clone()
    }

    /// Waits until the displayed status satisfies `f`, returning it.
    ///
    /// Returns `None` if tracking stops first.
    pub async fn wait_for(&mut self, f: impl FnMut(&OrderStatus) -> bool) -> Option<OrderStatus> {
        self.status.wait_for(f).await.ok().map(|status| *status)
    }

    /// Stops tracking and waits for the background task to finish.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(order_code = %self.code, error = %e, "Tracking task failed");
            }
        }
    }
}

impl Drop for OrderTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn fetch_status<S>(store: &S, code: &OrderCode) -> OrderStatus
where
    S: OrderStore + ?Sized,
{
    match store.get_status(code).await {
        Ok(Some(snapshot)) => snapshot.status,
        Ok(None) => {
            warn!(order_code = %code, "Order not found, assuming placed");
            OrderStatus::Placed
        }
        Err(e) => {
            warn!(order_code = %code, error = %e, "Status fetch failed, assuming placed");
            OrderStatus::Placed
        }
    }
}

struct Synchronizer<S: ?Sized> {
    store: Arc<S>,
    code: OrderCode,
    display: watch::Sender<OrderStatus>,
    feed: Option<StatusSubscription>,
    cancel: CancellationToken,
}

impl<S> Synchronizer<S>
where
    S: OrderStore + ChangeFeed + ?Sized + 'static,
{
    async fn run(mut self, timer: Option<Duration>) {
        let sleep = tokio::time::sleep(timer.unwrap_or_default());
        tokio::pin!(sleep);
        let mut timer_armed = timer.is_some();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Tracking stopped");
                    break;
                }
                event = next_event(&mut self.feed), if self.feed.is_some() => match event {
                    Some(FeedEvent::Changed(snapshot)) => {
                        self.show(snapshot.status);
                        if snapshot.status != OrderStatus::Placed {
                            timer_armed = false;
                        }
                    }
                    Some(FeedEvent::Lagged(_)) => {
                        let status = fetch_status(self.store.as_ref(), &self.code).await;
                        self.show(status);
                        if status != OrderStatus::Placed {
                            timer_armed = false;
                        }
                    }
                    None => {
                        warn!("Change feed closed");
                        self.feed = None;
                    }
                },
                _ = &mut sleep, if timer_armed => {
                    timer_armed = false;
                    self.auto_advance().await;
                }
            }
        }
    }

    fn show(&self, status: OrderStatus) {
        self.display.send_if_modified(|shown| {
            if *shown == status {
                return false;
            }
            debug!(from = %shown, to = %status, "Displayed status updated");
            *shown = status;
            true
        });
    }

    /// Optimistically displays `Preparing` and issues the conditional write.
    async fn auto_advance(&self) {
        self.display.send_if_modified(|shown| {
            if *shown != OrderStatus::Placed {
                return false;
            }
            *shown = OrderStatus::Preparing;
            true
        });
        match self
            .store
            .advance_status_if(&self.code, OrderStatus::Placed, OrderStatus::Preparing)
            .await
        {
            Ok(change) if !change.is_applied() => {
                // Someone else moved the order first; show what they wrote.
                self.show(change.snapshot().status);
            }
            Ok(_) => info!("Order auto-advanced to preparing"),
            Err(e) => warn!(error = %e, "Auto-advance write failed"),
        }
    }
}

async fn next_event(feed: &mut Option<StatusSubscription>) -> Option<FeedEvent> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}
