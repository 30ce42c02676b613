use surrealdb::sql::Thing;
use tracing::info;

use crate::entities::participant::participant_thing;
use crate::entities::reciprocal_obligation::ReciprocalObligation;
use crate::interfaces::repositories::obligation_ifce::ObligationRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;

/// Direct-exchange debts. Obligations never expire.
pub struct ObligationService<'a> {
    state: &'a CtxState,
}

impl<'a> ObligationService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn enqueue(&self, owed_by_id: &str, owed_to_id: &str) -> AppResult<ReciprocalObligation> {
        if owed_by_id == owed_to_id {
            return Err(AppError::Validation {
                description: "participant can not owe itself".to_string(),
            });
        }
        let obligation = self
            .state
            .db
            .obligations
            .create(&participant_thing(owed_by_id), &participant_thing(owed_to_id))
            .await?;
        info!("{owed_by_id} now owes a direct exchange to {owed_to_id}");
        Ok(obligation)
    }

    pub async fn peek_oldest_pending(&self, owed_to_id: &str) -> AppResult<Option<ReciprocalObligation>> {
        self.state
            .db
            .obligations
            .oldest_pending(&participant_thing(owed_to_id))
            .await
    }

    pub async fn resolve(&self, obligation: &Thing) -> AppResult<bool> {
        let resolved = self.state.db.obligations.resolve(obligation).await?;
        if resolved {
            info!("obligation {obligation} fulfilled");
        }
        Ok(resolved)
    }

    pub async fn count_owed_by(&self, participant_id: &str) -> AppResult<usize> {
        self.state
            .db
            .obligations
            .count_pending_owed_by(&participant_thing(participant_id))
            .await
    }
}
