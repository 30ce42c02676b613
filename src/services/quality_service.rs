use tracing::info;

use crate::config::FeatureFlags;
use crate::database::surrdb_utils::run_transaction;
use crate::entities::content_item::{ContentStatus, FLAG_THRESHOLD, MIN_RATINGS_FOR_FLAG};
use crate::entities::participant::participant_thing;
use crate::entities::task::{task_thing, QualityRating, TaskStatus};
use crate::interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface;
use crate::interfaces::repositories::task_ifce::TaskRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;
use crate::services::notification_service::NotificationService;

#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    Rated {
        quality_score: f64,
        rating_count: u32,
        flagged: bool,
    },
    AlreadyRated,
    ScoringDisabled,
}

/// Running mean of ratings on a 0..=100 scale.
pub fn next_quality_score(score: f64, count: u32, rating: QualityRating) -> (f64, u32) {
    let total = score * f64::from(count) + rating.points();
    let count = count + 1;
    (total / f64::from(count), count)
}

pub fn should_flag(score: f64, count: u32) -> bool {
    count >= MIN_RATINGS_FOR_FLAG && score < FLAG_THRESHOLD
}

pub struct QualityService<'a> {
    state: &'a CtxState,
}

impl<'a> QualityService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn rate(
        &self,
        assignee_id: &str,
        task_id: &str,
        rating: u8,
        flags: &FeatureFlags,
    ) -> AppResult<RatingOutcome> {
        if !flags.quality_score {
            return Ok(RatingOutcome::ScoringDisabled);
        }
        let rating = QualityRating::try_from(rating)?;
        let db = &self.state.db;
        let assignee = participant_thing(assignee_id);
        let task_id_thing = task_thing(task_id);

        let _task_guard = self.state.locks.lock(&task_id_thing).await;
        let task = db
            .tasks
            .get(&task_id_thing)
            .await?
            .filter(|t| t.assignee == assignee);
        let task = not_found(task, task_id)?;

        if task.status != TaskStatus::Completed {
            return Err(AppError::Forbidden);
        }
        if task.quality_rating.is_some() {
            return Ok(RatingOutcome::AlreadyRated);
        }

        let _item_guard = self.state.locks.lock(&task.content_item).await;
        let item = not_found(
            db.content_items.get(&task.content_item).await?,
            &task.content_item.to_raw(),
        )?;

        let (quality_score, rating_count) =
            next_quality_score(item.quality_score, item.rating_count, rating);
        let crossed = should_flag(quality_score, rating_count);

        let committed = run_transaction(|| {
            let query = db.client.query("BEGIN TRANSACTION;");
            let query = db.tasks.build_rate_query(query, &task.id, rating as u8);
            let query = db.content_items.build_update_quality_query(
                query,
                &item.id,
                quality_score,
                rating_count,
                crossed,
            );
            query.query("COMMIT TRANSACTION;")
        })
        .await;

        match committed {
            Ok(_) => {}
            Err(AppError::TaskAlreadyRated) => return Ok(RatingOutcome::AlreadyRated),
            Err(err) => return Err(err),
        }

        let flagged = crossed && item.status == ContentStatus::Active;
        info!(
            "task {task_id} rated {rating:?}, item {} score {quality_score:.2} over {rating_count}",
            item.id
        );
        if flagged {
            NotificationService::new(self.state)
                .on_item_flagged(&item, quality_score)
                .await;
        }

        Ok(RatingOutcome::Rated {
            quality_score,
            rating_count,
            flagged,
        })
    }
}
