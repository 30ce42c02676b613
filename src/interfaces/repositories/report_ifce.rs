use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::entities::report::Report;
use crate::middleware::error::AppResult;

#[async_trait]
pub trait ReportRepositoryInterface {
    async fn create(&self, reporter: &Thing, reported: &Thing, reason: String) -> AppResult<Report>;
    async fn get(&self, report: &Thing) -> AppResult<Option<Report>>;
    /// Moves `filed -> appealed` for the reported participant only; `None`
    /// when the report is not theirs or was already appealed.
    async fn appeal(
        &self,
        report: &Thing,
        reported: &Thing,
        appeal_reason: String,
    ) -> AppResult<Option<Report>>;
    async fn list_by_reporter(&self, reporter: &Thing) -> AppResult<Vec<Report>>;
    async fn list_against(&self, reported: &Thing) -> AppResult<Vec<Report>>;
    async fn latest(&self, limit: u32) -> AppResult<Vec<Report>>;
}
