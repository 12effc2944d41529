use async_trait::async_trait;
use tracing::{debug, instrument};
use crate::actor_framework::ResourceClient;
use crate::domain::{Review, ReviewDraft};
use crate::review_actor::ReviewError;
use crate::stores::ReviewStore;

/// Client for interacting with the Review actor.
#[derive(Clone)]
pub struct ReviewClient {
    inner: ResourceClient<Review>,
}

impl_basic_client!(ReviewClient, Review, ReviewError, review);

fn newest_first(mut reviews: Vec<Review>) -> Vec<Review> {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    reviews
}

#[async_trait]
impl ReviewStore for ReviewClient {
    #[instrument(skip(self))]
    async fn list_reviews(&self) -> Result<Vec<Review>, ReviewError> {
        debug!("Sending request");
        Ok(newest_first(self.inner.find(|_: &Review| true).await?))
    }

    #[instrument(skip(self))]
    async fn list_reviews_for_item(&self, item_id: &str) -> Result<Vec<Review>, ReviewError> {
        debug!("Sending request");
        let item_id = item_id.to_string();
        Ok(newest_first(self.inner.find(move |review: &Review| review.item_id == item_id).await?))
    }

    #[instrument(skip(self, draft), fields(item_id = %draft.item_id))]
    async fn create_review(&self, draft: ReviewDraft) -> Result<Review, ReviewError> {
        debug!("Sending request");
        let id = self.inner.create(draft).await?;
        self.get_review(id.clone())
            .await?
            .ok_or_else(|| ReviewError::ActorCommunicationError(format!("Review {id} vanished after create")))
    }
}
