use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;
use validator::Validate;

use super::participant::Tier;

pub const TABLE_NAME: &str = "content_item";

pub const MAX_ITEMS_PER_PARTICIPANT: usize = 5;
pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 5;

pub const INITIAL_QUALITY_SCORE: f64 = 100.0;
pub const MIN_RATINGS_FOR_FLAG: u32 = 5;
pub const FLAG_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentStatus {
    Active,
    InProgress,
    Flagged,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Active => "active",
            ContentStatus::InProgress => "in_progress",
            ContentStatus::Flagged => "flagged",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Thing,
    pub owner: Thing,
    pub title: String,
    pub thumbnail: String,
    pub duration: u32,
    pub link: Option<String>,
    pub status: ContentStatus,
    pub view_count: u32,
    pub quality_score: f64,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    /// Minutes the viewer is asked to watch before submitting proof.
    pub fn min_watch_minutes(&self) -> u32 {
        (self.duration / 2).max(1)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ContentItemInput {
    #[validate(length(min = 1, message = "Title can not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Thumbnail can not be empty"))]
    pub thumbnail: String,
    #[validate(range(
        min = 1,
        max = 5,
        message = "Duration must be between 1 and 5 minutes"
    ))]
    pub duration: u32,
    #[validate(url)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentItemCreate {
    pub id: Thing,
    pub owner: Thing,
    pub title: String,
    pub thumbnail: String,
    pub duration: u32,
    pub link: Option<String>,
}

/// Projection used by the general selection path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: Thing,
    pub owner: Thing,
    #[serde(default)]
    pub owner_tier: Tier,
    pub view_count: u32,
}

pub fn content_item_thing(item_id: &str) -> Thing {
    Thing::from((TABLE_NAME, item_id))
}
