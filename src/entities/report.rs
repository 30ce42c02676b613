use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::Thing;
use validator::Validate;

pub const TABLE_NAME: &str = "report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    Filed,
    Appealed,
}

/// A complaint one participant files against another. The reported side may
/// answer it once with an appeal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Thing,
    pub reporter: Thing,
    pub reported: Thing,
    pub reason: String,
    pub status: ReportStatus,
    pub appeal_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub appealed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReasonInput {
    #[validate(length(min = 1, max = 1000, message = "Reason must be 1 to 1000 characters"))]
    pub reason: String,
}

impl ReasonInput {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.trim().to_string(),
        }
    }
}

pub fn report_thing(report_id: &str) -> Thing {
    Thing::from((TABLE_NAME, report_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_trimmed_and_bounded() {
        assert_eq!(ReasonInput::new("  spam links \n").reason, "spam links");
        assert!(ReasonInput::new("   ").validate().is_err());
        let long = "x".repeat(1001);
        assert!(ReasonInput::new(&long).validate().is_err());
        assert!(ReasonInput::new("fake proof").validate().is_ok());
    }
}
