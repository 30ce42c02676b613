use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::sql::Thing;

use crate::{
    database::{client::Db, table_names::PARTICIPANT_TABLE_NAME},
    entities::report::{Report, TABLE_NAME},
    interfaces::repositories::report_ifce::ReportRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

#[derive(Debug)]
pub struct ReportRepository {
    client: Arc<Db>,
}

impl ReportRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS reporter ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS reported ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS reason ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value)) > 0;
        DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string DEFAULT 'filed'
            ASSERT $value INSIDE ['filed','appealed'];
        DEFINE FIELD IF NOT EXISTS appeal_reason ON TABLE {TABLE_NAME} TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE FIELD IF NOT EXISTS appealed_at ON TABLE {TABLE_NAME} TYPE option<datetime>;
        DEFINE INDEX IF NOT EXISTS reporter_idx ON TABLE {TABLE_NAME} FIELDS reporter;
        DEFINE INDEX IF NOT EXISTS reported_idx ON TABLE {TABLE_NAME} FIELDS reported;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ReportRepositoryInterface for ReportRepository {
    async fn create(&self, reporter: &Thing, reported: &Thing, reason: String) -> AppResult<Report> {
        let mut res = self
            .client
            .query(format!(
                "CREATE {TABLE_NAME} SET reporter = $reporter, reported = $reported, reason = $reason RETURN AFTER;"
            ))
            .bind(("reporter", reporter.clone()))
            .bind(("reported", reported.clone()))
            .bind(("reason", reason))
            .await?;
        let created = res.take::<Vec<Report>>(0)?;
        created.into_iter().next().ok_or(AppError::Generic {
            description: "report was not created".to_string(),
        })
    }

    async fn get(&self, report: &Thing) -> AppResult<Option<Report>> {
        let mut res = self
            .client
            .query("SELECT * FROM $id;")
            .bind(("id", report.clone()))
            .await?;
        let found = res.take::<Vec<Report>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn appeal(
        &self,
        report: &Thing,
        reported: &Thing,
        appeal_reason: String,
    ) -> AppResult<Option<Report>> {
        let mut res = self
            .client
            .query(
                "UPDATE $id SET status = 'appealed', appeal_reason = $appeal_reason, appealed_at = time::now()
                    WHERE status = 'filed' AND reported = $reported RETURN AFTER;",
            )
            .bind(("id", report.clone()))
            .bind(("reported", reported.clone()))
            .bind(("appeal_reason", appeal_reason))
            .await?;
        let updated = res.take::<Vec<Report>>(0)?;
        Ok(updated.into_iter().next())
    }

    async fn list_by_reporter(&self, reporter: &Thing) -> AppResult<Vec<Report>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE reporter = $reporter ORDER BY created_at DESC, id DESC;"
            ))
            .bind(("reporter", reporter.clone()))
            .await?;
        Ok(res.take::<Vec<Report>>(0)?)
    }

    async fn list_against(&self, reported: &Thing) -> AppResult<Vec<Report>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE reported = $reported ORDER BY created_at DESC, id DESC;"
            ))
            .bind(("reported", reported.clone()))
            .await?;
        Ok(res.take::<Vec<Report>>(0)?)
    }

    async fn latest(&self, limit: u32) -> AppResult<Vec<Report>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} ORDER BY created_at DESC, id DESC LIMIT $limit;"
            ))
            .bind(("limit", limit))
            .await?;
        Ok(res.take::<Vec<Report>>(0)?)
    }
}
