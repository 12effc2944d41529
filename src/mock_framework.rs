//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a [`MockResource`].
//! Then use helpers like [`expect_create`] or [`expect_action`] to assert behavior,
//! and publish rows on `changes` to drive change-feed subscribers.

use crate::actor_framework::{Entity, Filter, FrameworkError, ResourceClient, ResourceRequest, CHANGE_FEED_CAPACITY};
use tokio::sync::{broadcast, mpsc, oneshot};

/// The actor side of a mock client.
pub struct MockResource<T: Entity> {
    pub requests: mpsc::Receiver<ResourceRequest<T>>,
    pub changes: broadcast::Sender<T>,
}

/// Creates a mock client whose requests arrive on [`MockResource::requests`]
/// instead of a running actor, so each reply can be scripted by the test.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, MockResource<T>) {
    let (sender, requests) = mpsc::channel(buffer_size);
    let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
    let client = ResourceClient::with_changes(sender, changes.clone());
    (client, MockResource { requests, changes })
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Find request
pub async fn expect_find<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Filter<T>, oneshot::Sender<Result<Vec<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Find { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<T::ActionResult, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, ProfileCreate};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut mock) = create_mock_client::<Profile>(10);

        let create_task = tokio::spawn(async move {
            client.create(ProfileCreate::new("Test", "test@example.com", "9876543210")).await
        });

        let (payload, responder) = expect_create(&mut mock.requests).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        responder.send(Ok("user_1".to_string())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok("user_1".to_string()));
    }
}
