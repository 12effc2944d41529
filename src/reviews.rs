//! Review submission and rating aggregation.

use tracing::{info, instrument};
use crate::domain::{Review, ReviewDraft};
use crate::review_actor::ReviewError;
use crate::stores::ReviewStore;

/// Mean of each review's taste/quality average; `0.0` with no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(Review::score).sum::<f64>() / reviews.len() as f64
}

/// Stores a review after checking that the customer actually rated something.
#[instrument(skip(store, draft), fields(item_id = %draft.item_id))]
pub async fn submit_review<S>(store: &S, draft: ReviewDraft) -> Result<Review, ReviewError>
where
    S: ReviewStore + ?Sized,
{
    if !draft.has_rating() {
        return Err(ReviewError::NoRating);
    }
    let review = store.create_review(draft).await?;
    info!(review_id = %review.id, score = review.score(), "Review saved");
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn review(taste: u8, quality: u8) -> Review {
        Review {
            id: "review_1".into(),
            item_id: "orange".into(),
            author: "Bo".into(),
            taste,
            quality,
            comment: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn average_uses_per_review_means() {
        assert_eq!(average_rating(&[review(5, 5)]), 5.0);
        assert_eq!(average_rating(&[review(4, 2), review(5, 5)]), 4.0);
        assert_eq!(average_rating(&[review(4, 3)]), 3.5);
    }
}
