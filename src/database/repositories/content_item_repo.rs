use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::{
    database::{
        client::Db,
        surrdb_utils::THROW_ITEM_UNAVAILABLE,
        table_names::{PARTICIPANT_TABLE_NAME, WATCH_RECORD_TABLE_NAME},
    },
    entities::content_item::{
        CandidateView, ContentItem, ContentItemCreate, ContentStatus, INITIAL_QUALITY_SCORE,
        MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, TABLE_NAME,
    },
    interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

#[derive(Debug)]
pub struct ContentItemRepository {
    client: Arc<Db>,
}

impl ContentItemRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS owner ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS title ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value)) > 0;
        DEFINE FIELD IF NOT EXISTS thumbnail ON TABLE {TABLE_NAME} TYPE string ASSERT string::len($value) > 0;
        DEFINE FIELD IF NOT EXISTS duration ON TABLE {TABLE_NAME} TYPE int
            ASSERT $value >= {MIN_DURATION_MINUTES} AND $value <= {MAX_DURATION_MINUTES};
        DEFINE FIELD IF NOT EXISTS link ON TABLE {TABLE_NAME} TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string DEFAULT 'active'
            ASSERT $value INSIDE ['active','in_progress','flagged'];
        DEFINE FIELD IF NOT EXISTS view_count ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS quality_score ON TABLE {TABLE_NAME} TYPE float DEFAULT {INITIAL_QUALITY_SCORE:.1}
            ASSERT $value >= 0 AND $value <= 100;
        DEFINE FIELD IF NOT EXISTS rating_count ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE INDEX IF NOT EXISTS owner_idx ON TABLE {TABLE_NAME} FIELDS owner;
        DEFINE INDEX IF NOT EXISTS status_idx ON TABLE {TABLE_NAME} FIELDS status;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ContentItemRepositoryInterface for ContentItemRepository {
    async fn create(&self, data: ContentItemCreate) -> AppResult<ContentItem> {
        let mut res = self
            .client
            .query(
                "CREATE $id SET owner = $owner, title = $title, thumbnail = $thumbnail,
                    duration = $duration, link = $link RETURN AFTER;",
            )
            .bind(("id", data.id.clone()))
            .bind(("owner", data.owner))
            .bind(("title", data.title))
            .bind(("thumbnail", data.thumbnail))
            .bind(("duration", data.duration))
            .bind(("link", data.link))
            .await?;
        let created = res.take::<Vec<ContentItem>>(0)?;
        created
            .into_iter()
            .next()
            .ok_or(AppError::EntityFailIdNotFound {
                ident: data.id.to_raw(),
            })
    }

    async fn get(&self, item: &Thing) -> AppResult<Option<ContentItem>> {
        let mut res = self
            .client
            .query("SELECT * FROM $id;")
            .bind(("id", item.clone()))
            .await?;
        let found = res.take::<Vec<ContentItem>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn list_by_owner(&self, owner: &Thing) -> AppResult<Vec<ContentItem>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE owner = $owner ORDER BY created_at ASC;"
            ))
            .bind(("owner", owner.clone()))
            .await?;
        Ok(res.take::<Vec<ContentItem>>(0)?)
    }

    async fn count_by_owner(&self, owner: &Thing) -> AppResult<usize> {
        let mut res = self
            .client
            .query(format!(
                "RETURN array::len((SELECT VALUE id FROM {TABLE_NAME} WHERE owner = $owner));"
            ))
            .bind(("owner", owner.clone()))
            .await?;
        let count = res.take::<Option<usize>>(0)?;
        Ok(count.unwrap_or(0))
    }

    async fn unwatched_active_of_owner(
        &self,
        owner: &Thing,
        viewer: &Thing,
    ) -> AppResult<Vec<ContentItem>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME}
                    WHERE owner = $owner AND owner != $viewer AND status = 'active'
                    AND id NOTINSIDE (SELECT VALUE content_item FROM {WATCH_RECORD_TABLE_NAME} WHERE participant = $viewer);"
            ))
            .bind(("owner", owner.clone()))
            .bind(("viewer", viewer.clone()))
            .await?;
        Ok(res.take::<Vec<ContentItem>>(0)?)
    }

    async fn general_candidates(&self, viewer: &Thing) -> AppResult<Vec<CandidateView>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT id, owner, owner.tier AS owner_tier, view_count FROM {TABLE_NAME}
                    WHERE status = 'active' AND owner != $viewer
                    AND id NOTINSIDE (SELECT VALUE content_item FROM {WATCH_RECORD_TABLE_NAME} WHERE participant = $viewer);"
            ))
            .bind(("viewer", viewer.clone()))
            .await?;
        Ok(res.take::<Vec<CandidateView>>(0)?)
    }

    fn build_claim_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_claimed_items = (UPDATE $_claim_item SET status = 'in_progress' WHERE status = 'active' RETURN AFTER);
                IF array::len($_claimed_items) == 0 {{ THROW \"{THROW_ITEM_UNAVAILABLE}\"; }};"
            ))
            .bind(("_claim_item", item.clone()))
    }

    fn build_release_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
        status: ContentStatus,
        views: u32,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "UPDATE $_release_item SET status = $_release_status, view_count += $_release_views
                    WHERE status = 'in_progress';",
            )
            .bind(("_release_item", item.clone()))
            .bind(("_release_status", status.as_str()))
            .bind(("_release_views", views))
    }

    fn build_update_quality_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
        quality_score: f64,
        rating_count: u32,
        flag: bool,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "UPDATE $_quality_item SET quality_score = $_quality_score,
                    rating_count = $_quality_count,
                    status = IF $_quality_flag AND status = 'active' THEN 'flagged' ELSE status END;",
            )
            .bind(("_quality_item", item.clone()))
            .bind(("_quality_score", quality_score))
            .bind(("_quality_count", rating_count))
            .bind(("_quality_flag", flag))
    }

    fn build_delete_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_deleted_items = (DELETE $_delete_item WHERE status != 'in_progress' RETURN BEFORE);
                IF array::len($_deleted_items) == 0 {{ THROW \"{THROW_ITEM_UNAVAILABLE}\"; }};"
            ))
            .bind(("_delete_item", item.clone()))
    }
}
