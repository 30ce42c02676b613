use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

pub const TABLE_NAME: &str = "watch_record";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRecord {
    pub id: Thing,
    pub participant: Thing,
    pub content_item: Thing,
    pub created_at: DateTime<Utc>,
}
