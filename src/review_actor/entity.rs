use chrono::Utc;
use crate::actor_framework::Entity;
use crate::domain::{Review, ReviewDraft, ANONYMOUS_AUTHOR, MAX_RATING, MIN_RATING};

fn check_rating(dimension: &str, rating: u8) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!("{dimension} rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"))
    }
}

impl Entity for Review {
    type Id = String;
    type CreatePayload = ReviewDraft;
    type Patch = ();
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &String { &self.id }

    fn from_create(id: String, params: ReviewDraft) -> Result<Self, String> {
        check_rating("taste", params.taste)?;
        check_rating("quality", params.quality)?;
        if params.item_id.trim().is_empty() {
            return Err("review must name a juice".to_string());
        }
        let author = match params.author.trim() {
            "" => ANONYMOUS_AUTHOR.to_string(),
            name => name.to_string(),
        };
        Ok(Self {
            id,
            item_id: params.item_id,
            author,
            taste: params.taste,
            quality: params.quality,
            comment: params.comment.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), String> {
        Err(format!("review {} cannot be edited", self.id))
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
