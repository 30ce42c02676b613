use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::entities::participant::{Participant, ParticipantStatus, Tier};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ParticipantRepositoryInterface {
    async fn register(&self, participant: &Thing) -> AppResult<Participant>;
    async fn get(&self, participant: &Thing) -> AppResult<Option<Participant>>;
    async fn adjust_balance(&self, participant: &Thing, delta: i64) -> AppResult<Option<Participant>>;
    /// Moves to `status` only when the current status is one of `from`.
    async fn update_status(
        &self,
        participant: &Thing,
        from: &[ParticipantStatus],
        status: ParticipantStatus,
    ) -> AppResult<Option<Participant>>;
    async fn update_strikes(
        &self,
        participant: &Thing,
        strike_count: u32,
        status: ParticipantStatus,
    ) -> AppResult<Option<Participant>>;
    async fn update_tier(&self, participant: &Thing, tier: Tier) -> AppResult<Option<Participant>>;
    async fn top_by_completed(&self, limit: u32) -> AppResult<Vec<Participant>>;

    fn build_adjust_balance_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        delta: i64,
    ) -> Query<'b, any::Any>;

    fn build_set_strikes_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        strike_count: u32,
        status: ParticipantStatus,
    ) -> Query<'b, any::Any>;

    fn build_increment_completed_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
    ) -> Query<'b, any::Any>;
}
