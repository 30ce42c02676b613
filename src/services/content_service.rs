use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::database::surrdb_utils::run_transaction;
use crate::entities::content_item::{
    content_item_thing, ContentItem, ContentItemCreate, ContentItemInput, ContentStatus,
    MAX_ITEMS_PER_PARTICIPANT, TABLE_NAME,
};
use crate::entities::participant::participant_thing;
use crate::interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface;
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::interfaces::repositories::task_ifce::TaskRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;
use surrealdb::sql::Thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Busy,
}

pub struct ContentService<'a> {
    state: &'a CtxState,
}

impl<'a> ContentService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn upload_item(&self, owner_id: &str, input: ContentItemInput) -> AppResult<ContentItem> {
        input.validate()?;
        if input.title.trim().is_empty() {
            return Err(AppError::Validation {
                description: "Title can not be empty".to_string(),
            });
        }

        let db = &self.state.db;
        let owner = participant_thing(owner_id);
        let _owner_guard = self.state.locks.lock(&owner).await;
        not_found(db.participants.get(&owner).await?, owner_id)?;

        let count = db.content_items.count_by_owner(&owner).await?;
        if count >= MAX_ITEMS_PER_PARTICIPANT {
            return Err(AppError::ItemLimitReached {
                limit: MAX_ITEMS_PER_PARTICIPANT,
            });
        }

        let item = db
            .content_items
            .create(ContentItemCreate {
                id: Thing::from((TABLE_NAME, Uuid::new_v4().to_string().as_str())),
                owner,
                title: input.title.trim().to_string(),
                thumbnail: input.thumbnail,
                duration: input.duration,
                link: input.link,
            })
            .await?;
        info!("{owner_id} uploaded item {} ({} of {MAX_ITEMS_PER_PARTICIPANT})", item.id, count + 1);
        Ok(item)
    }

    pub async fn remove_item(&self, owner_id: &str, item_id: &str) -> AppResult<RemoveOutcome> {
        let db = &self.state.db;
        let owner = participant_thing(owner_id);
        let item_thing = content_item_thing(item_id);
        let _item_guard = self.state.locks.lock(&item_thing).await;

        let item = db
            .content_items
            .get(&item_thing)
            .await?
            .filter(|item| item.owner == owner);
        let item = not_found(item, item_id)?;
        if item.status == ContentStatus::InProgress {
            return Ok(RemoveOutcome::Busy);
        }

        let removed = run_transaction(|| {
            let query = db.client.query("BEGIN TRANSACTION;");
            let query = db
                .tasks
                .build_delete_non_terminal_for_item_query(query, &item.id);
            let query = db.content_items.build_delete_query(query, &item.id);
            query.query("COMMIT TRANSACTION;")
        })
        .await;

        match removed {
            Ok(_) => {
                info!("{owner_id} removed item {}", item.id);
                Ok(RemoveOutcome::Removed)
            }
            Err(AppError::ItemUnavailable) => Ok(RemoveOutcome::Busy),
            Err(err) => Err(err),
        }
    }

    pub async fn list_items(&self, owner_id: &str) -> AppResult<Vec<ContentItem>> {
        self.state
            .db
            .content_items
            .list_by_owner(&participant_thing(owner_id))
            .await
    }

    pub async fn get_item(&self, item_id: &str) -> AppResult<ContentItem> {
        let item = self
            .state
            .db
            .content_items
            .get(&content_item_thing(item_id))
            .await?;
        not_found(item, item_id)
    }
}
