use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Author name stored when a reviewer leaves theirs blank.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A customer's rating of a juice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub item_id: String,
    pub author: String,
    pub taste: u8,
    pub quality: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Mean of the two rating dimensions.
    pub fn score(&self) -> f64 {
        (f64::from(self.taste) + f64::from(self.quality)) / 2.0
    }
}

/// A review as submitted, before it is stored.
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub item_id: String,
    pub author: String,
    pub taste: u8,
    pub quality: u8,
    pub comment: String,
}

impl ReviewDraft {
    pub fn new(item_id: impl Into<String>, author: impl Into<String>, taste: u8, quality: u8) -> Self {
        Self {
            item_id: item_id.into(),
            author: author.into(),
            taste,
            quality,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn has_rating(&self) -> bool {
        self.taste > 0 || self.quality > 0
    }
}
