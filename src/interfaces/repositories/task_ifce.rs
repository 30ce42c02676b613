use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::entities::task::{Task, TaskCreate, TaskStatus};
use crate::middleware::error::AppResult;

#[async_trait]
pub trait TaskRepositoryInterface {
    async fn get(&self, task: &Thing) -> AppResult<Option<Task>>;
    async fn find_by_assignee(
        &self,
        assignee: &Thing,
        statuses: &[TaskStatus],
    ) -> AppResult<Option<Task>>;
    async fn list_non_terminal(&self) -> AppResult<Vec<Task>>;
    async fn count_by_assigner(&self, assigner: &Thing, status: TaskStatus) -> AppResult<usize>;

    /// Aborts the transaction when the assignee already holds a live task.
    fn build_guard_no_active_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        assignee: &Thing,
    ) -> Query<'b, any::Any>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        data: TaskCreate,
    ) -> Query<'b, any::Any>;

    fn build_submit_proof_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        evidence: String,
    ) -> Query<'b, any::Any>;

    fn build_complete_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
    ) -> Query<'b, any::Any>;

    fn build_fail_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        reason: Option<String>,
    ) -> Query<'b, any::Any>;

    fn build_rate_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        rating: u8,
    ) -> Query<'b, any::Any>;

    fn build_delete_non_terminal_for_item_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any>;
}
