use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::entities::content_item::{CandidateView, ContentItem, ContentItemCreate, ContentStatus};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ContentItemRepositoryInterface {
    async fn create(&self, data: ContentItemCreate) -> AppResult<ContentItem>;
    async fn get(&self, item: &Thing) -> AppResult<Option<ContentItem>>;
    async fn list_by_owner(&self, owner: &Thing) -> AppResult<Vec<ContentItem>>;
    async fn count_by_owner(&self, owner: &Thing) -> AppResult<usize>;
    /// Active items of `owner` that `viewer` has never been assigned.
    async fn unwatched_active_of_owner(
        &self,
        owner: &Thing,
        viewer: &Thing,
    ) -> AppResult<Vec<ContentItem>>;
    /// Active items of other owners that `viewer` has never been assigned.
    async fn general_candidates(&self, viewer: &Thing) -> AppResult<Vec<CandidateView>>;

    /// Flips `active -> in_progress` or aborts the transaction.
    fn build_claim_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any>;

    fn build_release_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
        status: ContentStatus,
        views: u32,
    ) -> Query<'b, any::Any>;

    /// Stores the new score; `flag` moves an active item to flagged. Items in
    /// progress are flagged when their task is verified.
    fn build_update_quality_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
        quality_score: f64,
        rating_count: u32,
        flag: bool,
    ) -> Query<'b, any::Any>;

    /// Deletes the item unless it is in progress.
    fn build_delete_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any>;
}
