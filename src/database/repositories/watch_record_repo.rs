use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::{
    database::{
        client::Db,
        table_names::{CONTENT_ITEM_TABLE_NAME, PARTICIPANT_TABLE_NAME},
    },
    entities::watch_record::{WatchRecord, TABLE_NAME},
    interfaces::repositories::watch_record_ifce::WatchRecordRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

#[derive(Debug)]
pub struct WatchRecordRepository {
    client: Arc<Db>,
}

impl WatchRecordRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        // records outlive deleted items, so content_item may point nowhere
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS participant ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS content_item ON TABLE {TABLE_NAME} TYPE record<{CONTENT_ITEM_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE INDEX IF NOT EXISTS participant_item_idx ON TABLE {TABLE_NAME} FIELDS participant, content_item UNIQUE;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl WatchRecordRepositoryInterface for WatchRecordRepository {
    async fn list_by_participant(&self, participant: &Thing) -> AppResult<Vec<WatchRecord>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE participant = $participant ORDER BY created_at ASC;"
            ))
            .bind(("participant", participant.clone()))
            .await?;
        Ok(res.take::<Vec<WatchRecord>>(0)?)
    }

    async fn has_watched(&self, participant: &Thing, item: &Thing) -> AppResult<bool> {
        let mut res = self
            .client
            .query(format!(
                "RETURN array::len((SELECT VALUE id FROM {TABLE_NAME}
                    WHERE participant = $participant AND content_item = $item)) > 0;"
            ))
            .bind(("participant", participant.clone()))
            .bind(("item", item.clone()))
            .await?;
        let watched = res.take::<Option<bool>>(0)?;
        Ok(watched.unwrap_or(false))
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        item: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "CREATE {TABLE_NAME} SET participant = $_watch_participant, content_item = $_watch_item;"
            ))
            .bind(("_watch_participant", participant.clone()))
            .bind(("_watch_item", item.clone()))
    }
}
