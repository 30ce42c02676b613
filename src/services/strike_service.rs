use tracing::info;

use crate::database::surrdb_utils::record_key;
use crate::entities::participant::{
    participant_thing, Participant, ParticipantStatus, STRIKE_LIMIT,
};
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::middleware::error::{not_found, AppResult};
use crate::middleware::mw_ctx::CtxState;
use crate::services::notification_service::NotificationService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeDecision {
    pub strike_count: u32,
    pub status: ParticipantStatus,
    pub newly_blocked: bool,
}

/// One more strike; blocks once the limit is reached. An already blocked
/// participant stays blocked without a second block event.
pub fn apply_strike(strike_count: u32, status: ParticipantStatus) -> StrikeDecision {
    let strike_count = strike_count.saturating_add(1);
    if strike_count >= STRIKE_LIMIT && status != ParticipantStatus::Blocked {
        StrikeDecision {
            strike_count,
            status: ParticipantStatus::Blocked,
            newly_blocked: true,
        }
    } else {
        StrikeDecision {
            strike_count,
            status,
            newly_blocked: false,
        }
    }
}

pub struct StrikeService<'a> {
    state: &'a CtxState,
}

impl<'a> StrikeService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn add_strike(&self, participant_id: &str) -> AppResult<StrikeDecision> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participants = &self.state.db.participants;

        let current = not_found(participants.get(&id).await?, participant_id)?;
        let decision = apply_strike(current.strike_count, current.status);
        let updated = participants
            .update_strikes(&id, decision.strike_count, decision.status)
            .await?;
        let updated = not_found(updated, participant_id)?;

        self.announce(&updated, &decision).await;
        Ok(decision)
    }

    /// Logs a stored strike and sends the block event when it blocked.
    pub(crate) async fn announce(&self, participant: &Participant, decision: &StrikeDecision) {
        let participant_id = record_key(&participant.id);
        info!(
            "strike added to {participant_id}, now {}/{STRIKE_LIMIT}",
            decision.strike_count
        );
        if decision.newly_blocked {
            info!("{participant_id} blocked after {} strikes", decision.strike_count);
            NotificationService::new(self.state)
                .on_participant_blocked(participant)
                .await;
        }
    }

    pub async fn remove_strike(&self, participant_id: &str) -> AppResult<u32> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participants = &self.state.db.participants;

        let current = not_found(participants.get(&id).await?, participant_id)?;
        let strike_count = current.strike_count.saturating_sub(1);
        participants
            .update_strikes(&id, strike_count, current.status)
            .await?;
        info!("strike removed from {participant_id}, now {strike_count}/{STRIKE_LIMIT}");
        Ok(strike_count)
    }

    pub async fn block(&self, participant_id: &str) -> AppResult<Participant> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participants = &self.state.db.participants;

        let updated = participants
            .update_status(
                &id,
                &[ParticipantStatus::Active, ParticipantStatus::Paused],
                ParticipantStatus::Blocked,
            )
            .await?;
        match updated {
            Some(participant) => {
                info!("{participant_id} blocked by operator");
                NotificationService::new(self.state)
                    .on_participant_blocked(&participant)
                    .await;
                Ok(participant)
            }
            None => not_found(participants.get(&id).await?, participant_id),
        }
    }

    pub async fn unblock(&self, participant_id: &str) -> AppResult<Participant> {
        let id = participant_thing(participant_id);
        let _guard = self.state.locks.lock(&id).await;
        let participants = &self.state.db.participants;

        let updated = participants
            .update_status(
                &id,
                &[ParticipantStatus::Blocked],
                ParticipantStatus::Active,
            )
            .await?;
        match updated {
            Some(participant) => {
                info!("{participant_id} unblocked by operator");
                NotificationService::new(self.state)
                    .on_participant_unblocked(&participant)
                    .await;
                Ok(participant)
            }
            None => not_found(participants.get(&id).await?, participant_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_strike_blocks() {
        let mut count = 0;
        let mut status = ParticipantStatus::Active;
        for _ in 0..3 {
            let decision = apply_strike(count, status);
            assert!(!decision.newly_blocked);
            count = decision.strike_count;
            status = decision.status;
        }
        assert_eq!(status, ParticipantStatus::Active);

        let fourth = apply_strike(count, status);
        assert_eq!(fourth.strike_count, 4);
        assert_eq!(fourth.status, ParticipantStatus::Blocked);
        assert!(fourth.newly_blocked);

        let fifth = apply_strike(fourth.strike_count, fourth.status);
        assert_eq!(fifth.strike_count, 5);
        assert_eq!(fifth.status, ParticipantStatus::Blocked);
        assert!(!fifth.newly_blocked);
    }

    #[test]
    fn paused_participant_is_blocked_at_limit() {
        let decision = apply_strike(STRIKE_LIMIT - 1, ParticipantStatus::Paused);
        assert_eq!(decision.status, ParticipantStatus::Blocked);
        assert!(decision.newly_blocked);
    }

    #[test]
    fn unblocked_participant_over_limit_is_blocked_again() {
        let decision = apply_strike(STRIKE_LIMIT, ParticipantStatus::Active);
        assert_eq!(decision.strike_count, STRIKE_LIMIT + 1);
        assert!(decision.newly_blocked);
    }
}
