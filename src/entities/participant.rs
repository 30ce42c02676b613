use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

pub const TABLE_NAME: &str = "participant";

/// Strikes at which a participant is blocked.
pub const STRIKE_LIMIT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Paused,
    Blocked,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Active => "active",
            ParticipantStatus::Paused => "paused",
            ParticipantStatus::Blocked => "blocked",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Selection weight, higher goes first.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Gold => 3,
            Tier::Silver => 2,
            Tier::Bronze => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gold => "Gold",
            Tier::Silver => "Silver",
            Tier::Bronze => "Bronze",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Thing,
    pub status: ParticipantStatus,
    pub strike_count: u32,
    pub completed_task_count: u32,
    pub tier: Tier,
    pub credit_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_blocked(&self) -> bool {
        self.status == ParticipantStatus::Blocked
    }
}

pub fn participant_thing(participant_id: &str) -> Thing {
    Thing::from((TABLE_NAME, participant_id))
}
