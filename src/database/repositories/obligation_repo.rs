use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::{
    database::{client::Db, table_names::PARTICIPANT_TABLE_NAME},
    entities::reciprocal_obligation::{ReciprocalObligation, TABLE_NAME},
    interfaces::repositories::obligation_ifce::ObligationRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

#[derive(Debug)]
pub struct ObligationRepository {
    client: Arc<Db>,
}

impl ObligationRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS owed_by ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS owed_to ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string DEFAULT 'pending'
            ASSERT $value INSIDE ['pending','fulfilled'];
        DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE FIELD IF NOT EXISTS resolved_at ON TABLE {TABLE_NAME} TYPE option<datetime>;
        DEFINE INDEX IF NOT EXISTS owed_to_status_idx ON TABLE {TABLE_NAME} FIELDS owed_to, status;
        DEFINE INDEX IF NOT EXISTS owed_by_status_idx ON TABLE {TABLE_NAME} FIELDS owed_by, status;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ObligationRepositoryInterface for ObligationRepository {
    async fn create(&self, owed_by: &Thing, owed_to: &Thing) -> AppResult<ReciprocalObligation> {
        let mut res = self
            .client
            .query(format!(
                "CREATE {TABLE_NAME} SET owed_by = $owed_by, owed_to = $owed_to RETURN AFTER;"
            ))
            .bind(("owed_by", owed_by.clone()))
            .bind(("owed_to", owed_to.clone()))
            .await?;
        let created = res.take::<Vec<ReciprocalObligation>>(0)?;
        created.into_iter().next().ok_or(AppError::Generic {
            description: "obligation was not created".to_string(),
        })
    }

    async fn oldest_pending(&self, owed_to: &Thing) -> AppResult<Option<ReciprocalObligation>> {
        // id breaks ties between obligations created within the same instant
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE owed_to = $owed_to AND status = 'pending'
                    ORDER BY created_at ASC, id ASC LIMIT 1;"
            ))
            .bind(("owed_to", owed_to.clone()))
            .await?;
        let found = res.take::<Vec<ReciprocalObligation>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn resolve(&self, obligation: &Thing) -> AppResult<bool> {
        let mut res = self
            .client
            .query(
                "UPDATE $id SET status = 'fulfilled', resolved_at = time::now()
                    WHERE status = 'pending' RETURN AFTER;",
            )
            .bind(("id", obligation.clone()))
            .await?;
        let resolved = res.take::<Vec<ReciprocalObligation>>(0)?;
        Ok(!resolved.is_empty())
    }

    async fn count_pending_owed_by(&self, owed_by: &Thing) -> AppResult<usize> {
        let mut res = self
            .client
            .query(format!(
                "RETURN array::len((SELECT VALUE id FROM {TABLE_NAME} WHERE owed_by = $owed_by AND status = 'pending'));"
            ))
            .bind(("owed_by", owed_by.clone()))
            .await?;
        let count = res.take::<Option<usize>>(0)?;
        Ok(count.unwrap_or(0))
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        owed_by: &Thing,
        owed_to: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "CREATE {TABLE_NAME} SET owed_by = $_obligation_owed_by, owed_to = $_obligation_owed_to;"
            ))
            .bind(("_obligation_owed_by", owed_by.clone()))
            .bind(("_obligation_owed_to", owed_to.clone()))
    }

    fn build_resolve_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        obligation: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "UPDATE $_resolve_obligation SET status = 'fulfilled', resolved_at = time::now()
                    WHERE status = 'pending';",
            )
            .bind(("_resolve_obligation", obligation.clone()))
    }
}
