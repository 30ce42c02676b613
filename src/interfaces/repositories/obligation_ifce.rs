use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::entities::reciprocal_obligation::ReciprocalObligation;
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ObligationRepositoryInterface {
    async fn create(&self, owed_by: &Thing, owed_to: &Thing) -> AppResult<ReciprocalObligation>;
    async fn oldest_pending(&self, owed_to: &Thing) -> AppResult<Option<ReciprocalObligation>>;
    /// Returns false when the obligation was not pending.
    async fn resolve(&self, obligation: &Thing) -> AppResult<bool>;
    async fn count_pending_owed_by(&self, owed_by: &Thing) -> AppResult<usize>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        owed_by: &Thing,
        owed_to: &Thing,
    ) -> Query<'b, any::Any>;

    fn build_resolve_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        obligation: &Thing,
    ) -> Query<'b, any::Any>;
}
