use serde::{Deserialize, Serialize};
use strum::Display;

use super::participant::Tier;

/// Payloads handed to the messaging gateway. The gateway renders them; the
/// engine never depends on how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
#[serde(tag = "type")]
pub enum ExchangeEvent {
    AssignmentCreated {
        task_id: String,
        item_id: String,
        title: String,
        thumbnail: String,
        link: Option<String>,
        duration: u32,
        min_watch_minutes: u32,
        owner_tier: Tier,
        via_obligation: bool,
    },
    VerificationRequested {
        task_id: String,
        assignee: String,
        evidence: String,
    },
    ProofAccepted {
        task_id: String,
        credited: u32,
    },
    RatingRequested {
        task_id: String,
        item_id: String,
    },
    ProofRejected {
        task_id: String,
        reason: Option<String>,
        strike_count: u32,
    },
    ItemFlagged {
        item_id: String,
        owner: String,
        title: String,
        quality_score: f64,
    },
    ParticipantBlocked {
        participant: String,
        strike_count: u32,
    },
    ParticipantUnblocked {
        participant: String,
    },
    /// To operators.
    ReportFiled {
        report_id: String,
        reporter: String,
        reported: String,
        reason: String,
    },
    /// To the reported participant, who may answer with an appeal.
    ReportReceived {
        report_id: String,
        reporter: String,
        reason: String,
    },
    ReportAppealed {
        report_id: String,
        reported: String,
        appeal_reason: String,
    },
}
