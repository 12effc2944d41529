use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, trace};

/// Capacity of the per-table change feed. Slow subscribers past this many
/// pending rows observe a lag and skip ahead.
pub const CHANGE_FEED_CAPACITY: usize = 64;

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// A row type that can live in a [`ResourceActor`] table.
///
/// `PartialEq` lets the actor tell whether an update or action actually changed
/// the row, so no-op writes are not published on the change feed.
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Construct the full row from the generated id and the payload.
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> { Ok(()) }

    /// Whether this row may not be stored next to `other`. Checked against every
    /// existing row before a create is accepted.
    fn conflicts_with(&self, _other: &Self) -> bool { false }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;

    /// Handle a domain-specific action against a single row.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;
}

/// Failures surfaced by [`ResourceClient`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the request")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    /// A create collided with the existing row of this id.
    #[error("Conflicts with {0}")]
    Conflict(String),
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Row predicate shipped to the actor for [`ResourceRequest::Find`].
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreatePayload,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Find {
        filter: Filter<T>,
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

impl<T: Entity> Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create { params, .. } => f.debug_struct("Create").field("params", params).finish(),
            Self::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            Self::Update { id, patch, .. } => {
                f.debug_struct("Update").field("id", id).field("patch", patch).finish()
            }
            Self::Find { .. } => f.debug_struct("Find").finish_non_exhaustive(),
            Self::Action { id, action, .. } => {
                f.debug_struct("Action").field("id", id).field("action", action).finish()
            }
        }
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    changes: broadcast::Sender<T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            changes: changes.clone(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::with_changes(sender, changes);
        (actor, client)
    }

    /// Serve requests until every client has been dropped.
    pub async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let id = (self.next_id_fn)();
                    let created = T::from_create(id.clone(), params)
                        .and_then(|mut item| {
                            item.on_create()?;
                            Ok(item)
                        })
                        .map_err(FrameworkError::Rejected)
                        .and_then(|item| match self.store.values().find(|existing| item.conflicts_with(existing)) {
                            Some(existing) => Err(FrameworkError::Conflict(existing.id().to_string())),
                            None => Ok(item),
                        });
                    match created {
                        Ok(item) => {
                            debug!(id = %id, "Row created");
                            self.store.insert(id.clone(), item);
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            debug!(error = %e, "Create refused");
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let Some(item) = self.store.get_mut(&id) else {
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let before = item.clone();
                    if let Err(e) = item.on_update(patch) {
                        *item = before;
                        let _ = respond_to.send(Err(FrameworkError::Rejected(e)));
                        continue;
                    }
                    let updated = item.clone();
                    publish_if_changed(&self.changes, &before, &updated);
                    let _ = respond_to.send(Ok(updated));
                }
                ResourceRequest::Find { filter, respond_to } => {
                    let found = self.store.values().filter(|item| filter(item)).cloned().collect();
                    let _ = respond_to.send(Ok(found));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let Some(item) = self.store.get_mut(&id) else {
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let before = item.clone();
                    match item.handle_action(action) {
                        Ok(result) => {
                            publish_if_changed(&self.changes, &before, item);
                            let _ = respond_to.send(Ok(result));
                        }
                        Err(e) => {
                            *item = before;
                            let _ = respond_to.send(Err(FrameworkError::Rejected(e)));
                        }
                    }
                }
            }
        }
    }
}

fn publish_if_changed<T: Entity>(changes: &broadcast::Sender<T>, before: &T, after: &T) {
    if before != after {
        // No subscribers is not an error.
        if changes.send(after.clone()).is_err() {
            trace!(id = %after.id(), "Change published with no subscribers");
        }
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    changes: broadcast::Sender<T>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn with_changes(sender: mpsc::Sender<ResourceRequest<T>>, changes: broadcast::Sender<T>) -> Self {
        Self { sender, changes }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn find(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::Find { filter, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    /// Receive every row changed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.changes.subscribe()
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
