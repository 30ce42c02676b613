use tracing::{info, warn};

use crate::database::surrdb_utils::record_key;
use crate::entities::content_item::ContentItem;
use crate::entities::exchange_event::ExchangeEvent;
use crate::entities::participant::{Participant, Tier};
use crate::entities::report::Report;
use crate::entities::task::Task;
use crate::middleware::mw_ctx::CtxState;

/// Builds outbound events and hands them to the gateway. Delivery failures
/// are logged and never surface to the caller.
pub struct NotificationService<'a> {
    state: &'a CtxState,
}

impl<'a> NotificationService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn on_assignment_created(
        &self,
        task: &Task,
        item: &ContentItem,
        owner_tier: Tier,
    ) {
        let event = ExchangeEvent::AssignmentCreated {
            task_id: record_key(&task.id),
            item_id: record_key(&item.id),
            title: item.title.clone(),
            thumbnail: item.thumbnail.clone(),
            link: item.link.clone(),
            duration: item.duration,
            min_watch_minutes: item.min_watch_minutes(),
            owner_tier,
            via_obligation: task.obligation.is_some(),
        };
        self.send(vec![record_key(&task.assignee)], event).await;
    }

    pub async fn on_verification_requested(&self, task: &Task, evidence: &str) {
        let event = ExchangeEvent::VerificationRequested {
            task_id: record_key(&task.id),
            assignee: record_key(&task.assignee),
            evidence: evidence.to_string(),
        };
        self.send(vec![record_key(&task.assigner)], event).await;
    }

    pub async fn on_proof_accepted(&self, task: &Task, credited: u32, ask_rating: bool) {
        let assignee = record_key(&task.assignee);
        let event = ExchangeEvent::ProofAccepted {
            task_id: record_key(&task.id),
            credited,
        };
        self.send(vec![assignee.clone()], event).await;

        if ask_rating {
            let event = ExchangeEvent::RatingRequested {
                task_id: record_key(&task.id),
                item_id: record_key(&task.content_item),
            };
            self.send(vec![assignee], event).await;
        }
    }

    pub async fn on_proof_rejected(&self, task: &Task, reason: Option<String>, strike_count: u32) {
        let event = ExchangeEvent::ProofRejected {
            task_id: record_key(&task.id),
            reason,
            strike_count,
        };
        self.send(vec![record_key(&task.assignee)], event).await;
    }

    pub async fn on_item_flagged(&self, item: &ContentItem, quality_score: f64) {
        let event = ExchangeEvent::ItemFlagged {
            item_id: record_key(&item.id),
            owner: record_key(&item.owner),
            title: item.title.clone(),
            quality_score,
        };
        self.send(self.state.operator_ids.clone(), event).await;
    }

    pub async fn on_participant_blocked(&self, participant: &Participant) {
        let key = record_key(&participant.id);
        let event = ExchangeEvent::ParticipantBlocked {
            participant: key.clone(),
            strike_count: participant.strike_count,
        };
        let mut receivers = vec![key];
        receivers.extend(self.state.operator_ids.iter().cloned());
        self.send(receivers, event).await;
    }

    pub async fn on_participant_unblocked(&self, participant: &Participant) {
        let key = record_key(&participant.id);
        let event = ExchangeEvent::ParticipantUnblocked {
            participant: key.clone(),
        };
        self.send(vec![key], event).await;
    }

    pub async fn on_report_filed(&self, report: &Report) {
        let report_id = record_key(&report.id);
        let reporter = record_key(&report.reporter);
        let event = ExchangeEvent::ReportFiled {
            report_id: report_id.clone(),
            reporter: reporter.clone(),
            reported: record_key(&report.reported),
            reason: report.reason.clone(),
        };
        self.send(self.state.operator_ids.clone(), event).await;

        let event = ExchangeEvent::ReportReceived {
            report_id,
            reporter,
            reason: report.reason.clone(),
        };
        self.send(vec![record_key(&report.reported)], event).await;
    }

    pub async fn on_report_appealed(&self, report: &Report) {
        let event = ExchangeEvent::ReportAppealed {
            report_id: record_key(&report.id),
            reported: record_key(&report.reported),
            appeal_reason: report.appeal_reason.clone().unwrap_or_default(),
        };
        self.send(self.state.operator_ids.clone(), event).await;
    }

    async fn send(&self, receivers: Vec<String>, event: ExchangeEvent) {
        if receivers.is_empty() {
            info!("no receivers for {event}");
            return;
        }
        let name = event.to_string();
        if let Err(err) = self.state.messaging.deliver(receivers, event).await {
            warn!("delivery of {name} failed: {err}");
        }
    }
}
