use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::entities::watch_record::WatchRecord;
use crate::middleware::error::AppResult;

#[async_trait]
pub trait WatchRecordRepositoryInterface {
    async fn list_by_participant(&self, participant: &Thing) -> AppResult<Vec<WatchRecord>>;
    async fn has_watched(&self, participant: &Thing, item: &Thing) -> AppResult<bool>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        item: &Thing,
    ) -> Query<'b, any::Any>;
}
