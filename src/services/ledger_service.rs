use surrealdb::{engine::any, method::Query, sql::Thing};
use tracing::info;

use crate::entities::participant::participant_thing;
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::middleware::error::{not_found, AppResult};
use crate::middleware::mw_ctx::CtxState;

/// Credit balances. No floor: a balance may go negative.
pub struct LedgerService<'a> {
    state: &'a CtxState,
}

impl<'a> LedgerService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn debit(&self, participant_id: &str, amount: u32) -> AppResult<i64> {
        self.adjust(participant_id, -i64::from(amount)).await
    }

    pub async fn credit(&self, participant_id: &str, amount: u32) -> AppResult<i64> {
        self.adjust(participant_id, i64::from(amount)).await
    }

    pub async fn balance(&self, participant_id: &str) -> AppResult<i64> {
        let participant = self
            .state
            .db
            .participants
            .get(&participant_thing(participant_id))
            .await?;
        Ok(not_found(participant, participant_id)?.credit_balance)
    }

    /// Debit of the content owner, composed into the assignment transaction.
    pub fn build_debit_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        owner: &Thing,
        amount: u32,
    ) -> Query<'b, any::Any> {
        self.state
            .db
            .participants
            .build_adjust_balance_query(query, owner, -i64::from(amount))
    }

    /// Credit of the assignee, composed into the acceptance transaction.
    pub fn build_credit_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        assignee: &Thing,
        amount: u32,
    ) -> Query<'b, any::Any> {
        self.state
            .db
            .participants
            .build_adjust_balance_query(query, assignee, i64::from(amount))
    }

    async fn adjust(&self, participant_id: &str, delta: i64) -> AppResult<i64> {
        let updated = self
            .state
            .db
            .participants
            .adjust_balance(&participant_thing(participant_id), delta)
            .await?;
        let participant = not_found(updated, participant_id)?;
        info!(
            "balance of {participant_id} adjusted by {delta} to {}",
            participant.credit_balance
        );
        Ok(participant.credit_balance)
    }
}
