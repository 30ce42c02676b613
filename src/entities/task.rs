use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;

use crate::middleware::error::AppError;

pub const TABLE_NAME: &str = "task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    ProofSubmitted,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "assigned",
            TaskStatus::ProofSubmitted => "proof_submitted",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRating {
    Bad = 0,
    Good = 1,
}

impl QualityRating {
    pub fn points(&self) -> f64 {
        match self {
            QualityRating::Bad => 0.0,
            QualityRating::Good => 100.0,
        }
    }
}

impl TryFrom<u8> for QualityRating {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QualityRating::Bad),
            1 => Ok(QualityRating::Good),
            value => Err(AppError::InvalidRating { value }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Thing,
    pub content_item: Thing,
    pub assigner: Thing,
    pub assignee: Thing,
    pub status: TaskStatus,
    pub proof: Option<String>,
    pub rejection_reason: Option<String>,
    pub quality_rating: Option<u8>,
    pub obligation: Option<Thing>,
    pub assigned_at: DateTime<Utc>,
    pub proof_submitted_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct TaskCreate {
    pub id: Thing,
    pub content_item: Thing,
    pub assigner: Thing,
    pub assignee: Thing,
    pub obligation: Option<Thing>,
}

pub fn task_thing(task_id: &str) -> Thing {
    Thing::from((TABLE_NAME, task_id))
}
