use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use crate::actor_framework::ResourceActor;
use crate::admin::AdminConsole;
use crate::clients::{OrderClient, ProfileClient, ReviewClient};
use crate::config::Config;
use crate::domain::{Order, OrderCode, Profile, Review};
use crate::lifecycle::OrderLifecycle;
use crate::notification::{HttpNotificationSink, NotificationSink, OrderNotifier};
use crate::tracking::{OrderTracker, TrackingSettings};
use super::SystemError;

/// How long shutdown waits for each actor to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || format!("{prefix}_{}", counter.fetch_add(1, Ordering::SeqCst))
}

/// The application system: store actors plus the services wired over them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct OrderSystem {
    pub profile_client: ProfileClient,
    pub order_client: OrderClient,
    pub review_client: ReviewClient,
    pub lifecycle: OrderLifecycle,
    pub admin: AdminConsole,
    tracking: TrackingSettings,
    handles: Vec<JoinHandle<()>>,
}

impl OrderSystem {
    /// Starts the system, alerting the configured HTTP endpoint on new orders.
    pub fn new(config: &Config) -> Self {
        let sink = HttpNotificationSink::new(config.notify_endpoint.clone());
        Self::with_sink(config, Arc::new(sink))
    }

    pub fn with_sink(config: &Config, sink: Arc<dyn NotificationSink>) -> Self {
        info!("Starting order system");

        // 1. Profile store
        let (profile_actor, profile_resource_client) =
            ResourceActor::<Profile>::new(config.actor_buffer, sequential_ids("user"));
        let profile_client = ProfileClient::new(profile_resource_client);
        let profile_handle = tokio::spawn(profile_actor.run());

        // 2. Order store
        let (order_actor, order_resource_client) =
            ResourceActor::<Order>::new(config.actor_buffer, sequential_ids("order"));
        let order_client = OrderClient::new(order_resource_client);
        let order_handle = tokio::spawn(order_actor.run());

        // 3. Review store
        let (review_actor, review_resource_client) =
            ResourceActor::<Review>::new(config.actor_buffer, sequential_ids("review"));
        let review_client = ReviewClient::new(review_resource_client);
        let review_handle = tokio::spawn(review_actor.run());

        // 4. Services
        let lifecycle = OrderLifecycle::new(
            Arc::new(profile_client.clone()),
            Arc::new(order_client.clone()),
            OrderNotifier::new(sink),
        )
        .with_auto_advance(config.auto_advance());
        let admin = AdminConsole::new(Arc::new(order_client.clone()));

        Self {
            profile_client,
            order_client,
            review_client,
            lifecycle,
            admin,
            tracking: TrackingSettings { auto_advance: config.auto_advance() },
            handles: vec![profile_handle, order_handle, review_handle],
        }
    }

    /// Starts tracking an order with the configured timer settings.
    pub async fn track(&self, code: OrderCode) -> OrderTracker {
        OrderTracker::start(Arc::new(self.order_client.clone()), code, self.tracking).await
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        // Actors stop once every client is dropped. Timers and trackers still
        // holding a client get a grace period before the actor is aborted.
        let Self { profile_client, order_client, review_client, lifecycle, admin, handles, .. } = self;
        drop((profile_client, order_client, review_client, lifecycle, admin));

        let result = drain(handles, SHUTDOWN_GRACE).await;
        if result.is_ok() {
            info!("System shutdown complete.");
        }
        result
    }
}

/// Waits for every actor task in turn, aborting any still running after `grace`.
/// All tasks are drained before the first failure is reported.
async fn drain(handles: Vec<JoinHandle<()>>, grace: Duration) -> Result<(), SystemError> {
    let mut first_failure = None;
    for mut handle in handles {
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Actor task failed: {:?}", e);
                first_failure.get_or_insert(SystemError::ActorFailed(e.to_string()));
            }
            Err(_) => {
                warn!("Actor still in use after grace period, aborting");
                handle.abort();
            }
        }
    }
    first_failure.map_or(Ok(()), Err)
}
