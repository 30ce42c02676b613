use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

pub const TABLE_NAME: &str = "reciprocal_obligation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Fulfilled,
}

/// A debt: `owed_by` should get one of its items in front of `owed_to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReciprocalObligation {
    pub id: Thing,
    pub owed_by: Thing,
    pub owed_to: Thing,
    pub status: ObligationStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
