use tracing::info;

use crate::entities::content_item::ContentItem;
use crate::entities::participant::{participant_thing, Participant, ParticipantStatus, Tier};
use crate::entities::task::TaskStatus;
use crate::interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface;
use crate::interfaces::repositories::obligation_ifce::ObligationRepositoryInterface;
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::interfaces::repositories::task_ifce::TaskRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;

#[derive(Debug, Clone)]
pub struct ParticipantSummary {
    pub participant: Participant,
    pub items: Vec<ContentItem>,
    pub obligations_owed: usize,
    pub awaiting_verification: usize,
}

pub struct ParticipantService<'a> {
    state: &'a CtxState,
}

impl<'a> ParticipantService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    /// Creates the participant on first contact, returns the stored one after.
    pub async fn register(&self, participant_id: &str) -> AppResult<Participant> {
        if participant_id.trim().is_empty() {
            return Err(AppError::Validation {
                description: format!("invalid participant id '{participant_id}'"),
            });
        }
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participant = self.state.db.participants.register(&id).await?;
        info!("participant {participant_id} registered");
        Ok(participant)
    }

    pub async fn get(&self, participant_id: &str) -> AppResult<Participant> {
        let found = self
            .state
            .db
            .participants
            .get(&participant_thing(participant_id))
            .await?;
        not_found(found, participant_id)
    }

    /// Stops new assignments for an active participant. Blocked ones are left as is.
    pub async fn pause(&self, participant_id: &str) -> AppResult<Participant> {
        self.toggle(participant_id, ParticipantStatus::Active, ParticipantStatus::Paused)
            .await
    }

    pub async fn resume(&self, participant_id: &str) -> AppResult<Participant> {
        self.toggle(participant_id, ParticipantStatus::Paused, ParticipantStatus::Active)
            .await
    }

    pub async fn set_tier(&self, participant_id: &str, tier: Tier) -> AppResult<Participant> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let updated = self.state.db.participants.update_tier(&id, tier).await?;
        let participant = not_found(updated, participant_id)?;
        info!("{participant_id} moved to tier {tier}");
        Ok(participant)
    }

    pub async fn summary(&self, participant_id: &str) -> AppResult<ParticipantSummary> {
        let db = &self.state.db;
        let id = participant_thing(participant_id);
        let participant = not_found(db.participants.get(&id).await?, participant_id)?;
        let items = db.content_items.list_by_owner(&id).await?;
        let obligations_owed = db.obligations.count_pending_owed_by(&id).await?;
        let awaiting_verification = db
            .tasks
            .count_by_assigner(&id, TaskStatus::ProofSubmitted)
            .await?;
        Ok(ParticipantSummary {
            participant,
            items,
            obligations_owed,
            awaiting_verification,
        })
    }

    pub async fn leaderboard(&self, limit: u32) -> AppResult<Vec<Participant>> {
        self.state.db.participants.top_by_completed(limit).await
    }

    async fn toggle(
        &self,
        participant_id: &str,
        from: ParticipantStatus,
        to: ParticipantStatus,
    ) -> AppResult<Participant> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participants = &self.state.db.participants;
        match participants.update_status(&id, &[from], to).await? {
            Some(participant) => {
                info!("{participant_id} is now {to}");
                Ok(participant)
            }
            None => not_found(participants.get(&id).await?, participant_id),
        }
    }
}
