use rand::seq::SliceRandom;
use rand::Rng;
use surrealdb::sql::Thing;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FeatureFlags;
use crate::database::surrdb_utils::run_transaction;
use crate::entities::content_item::{CandidateView, ContentItem};
use crate::entities::participant::{participant_thing, ParticipantStatus, Tier};
use crate::entities::task::{Task, TaskCreate, TaskStatus, TABLE_NAME as TASK_TABLE_NAME};
use crate::interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface;
use crate::interfaces::repositories::obligation_ifce::ObligationRepositoryInterface;
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::interfaces::repositories::task_ifce::TaskRepositoryInterface;
use crate::interfaces::repositories::watch_record_ifce::WatchRecordRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;
use crate::services::ledger_service::LedgerService;
use crate::services::notification_service::NotificationService;

/// Selection rounds before giving up when other requests keep taking the picked item.
const MAX_SELECTION_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthorized,
    Blocked,
    Paused,
    AlreadyActive,
    NoCredit,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub task: Task,
    pub item: ContentItem,
    pub owner_tier: Tier,
    pub min_watch_minutes: u32,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Assigned(Assignment),
    NoneAvailable,
    Denied(DenyReason),
}

struct Selection {
    item: ContentItem,
    owner_tier: Tier,
    obligation: Option<Thing>,
}

/// Orders general-pool candidates: owner tier rank descending, then fewest
/// views, ties broken uniformly at random.
pub fn rank_candidates<R: Rng + ?Sized>(
    mut candidates: Vec<CandidateView>,
    rng: &mut R,
) -> Vec<CandidateView> {
    candidates.shuffle(rng);
    // stable sort keeps the shuffled order among equals
    candidates.sort_by(|a, b| {
        b.owner_tier
            .rank()
            .cmp(&a.owner_tier.rank())
            .then(a.view_count.cmp(&b.view_count))
    });
    candidates
}

pub struct MatchingService<'a> {
    state: &'a CtxState,
}

impl<'a> MatchingService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn request_assignment(
        &self,
        requester_id: &str,
        flags: &FeatureFlags,
    ) -> AppResult<MatchOutcome> {
        if !self.state.gatekeeper.is_authorized(requester_id).await {
            return Ok(MatchOutcome::Denied(DenyReason::NotAuthorized));
        }

        let db = &self.state.db;
        let requester = participant_thing(requester_id);
        let _requester_guard = self.state.locks.lock(&requester).await;

        let participant = not_found(db.participants.get(&requester).await?, requester_id)?;
        match participant.status {
            ParticipantStatus::Blocked => return Ok(MatchOutcome::Denied(DenyReason::Blocked)),
            ParticipantStatus::Paused => return Ok(MatchOutcome::Denied(DenyReason::Paused)),
            ParticipantStatus::Active => {}
        }

        let live = db
            .tasks
            .find_by_assignee(
                &requester,
                &[TaskStatus::Assigned, TaskStatus::ProofSubmitted],
            )
            .await?;
        if live.is_some() {
            return Ok(MatchOutcome::Denied(DenyReason::AlreadyActive));
        }

        if flags.task_credits && participant.credit_balance <= 0 {
            return Ok(MatchOutcome::Denied(DenyReason::NoCredit));
        }

        for attempt in 1..=MAX_SELECTION_ATTEMPTS {
            let selection = match self.select(&requester, flags).await {
                Ok(Some(selection)) => selection,
                Ok(None) => return Ok(MatchOutcome::NoneAvailable),
                Err(AppError::ItemUnavailable) => {
                    debug!("picked item vanished, attempt {attempt}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            match self.commit(&requester, selection, flags).await {
                Ok(assignment) => {
                    info!(
                        "{requester_id} assigned item {} as task {}",
                        assignment.item.id, assignment.task.id
                    );
                    NotificationService::new(self.state)
                        .on_assignment_created(
                            &assignment.task,
                            &assignment.item,
                            assignment.owner_tier,
                        )
                        .await;
                    return Ok(MatchOutcome::Assigned(assignment));
                }
                Err(AppError::ItemUnavailable) => {
                    debug!("picked item taken before commit, attempt {attempt}");
                }
                Err(AppError::TaskAlreadyActive) => {
                    return Ok(MatchOutcome::Denied(DenyReason::AlreadyActive));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(MatchOutcome::NoneAvailable)
    }

    async fn select(&self, requester: &Thing, flags: &FeatureFlags) -> AppResult<Option<Selection>> {
        if flags.reciprocal_tasks {
            if let Some(selection) = self.select_reciprocal(requester).await? {
                return Ok(Some(selection));
            }
        }
        self.select_general(requester).await
    }

    async fn select_reciprocal(&self, requester: &Thing) -> AppResult<Option<Selection>> {
        let db = &self.state.db;
        let Some(obligation) = db.obligations.oldest_pending(requester).await? else {
            return Ok(None);
        };
        let items = db
            .content_items
            .unwatched_active_of_owner(&obligation.owed_by, requester)
            .await?;
        let picked = {
            let mut rng = rand::thread_rng();
            items.choose(&mut rng).cloned()
        };
        let Some(item) = picked else {
            debug!("obligation {} has no eligible item", obligation.id);
            return Ok(None);
        };
        let owner = db.participants.get(&item.owner).await?;
        debug!("reciprocal pick {} for obligation {}", item.id, obligation.id);
        Ok(Some(Selection {
            item,
            owner_tier: owner.map(|o| o.tier).unwrap_or_default(),
            obligation: Some(obligation.id),
        }))
    }

    async fn select_general(&self, requester: &Thing) -> AppResult<Option<Selection>> {
        let db = &self.state.db;
        let candidates = db.content_items.general_candidates(requester).await?;
        let head = {
            let mut rng = rand::thread_rng();
            rank_candidates(candidates, &mut rng).into_iter().next()
        };
        let Some(head) = head else {
            return Ok(None);
        };
        let Some(item) = db.content_items.get(&head.id).await? else {
            // deleted since the candidate scan
            return Err(AppError::ItemUnavailable);
        };
        debug!("general pick {} (tier {}, views {})", item.id, head.owner_tier, head.view_count);
        Ok(Some(Selection {
            item,
            owner_tier: head.owner_tier,
            obligation: None,
        }))
    }

    async fn commit(
        &self,
        requester: &Thing,
        selection: Selection,
        flags: &FeatureFlags,
    ) -> AppResult<Assignment> {
        let db = &self.state.db;
        let ledger = LedgerService::new(self.state);
        let Selection {
            item,
            owner_tier,
            obligation,
        } = selection;
        let task_id = Thing::from((TASK_TABLE_NAME, Uuid::new_v4().to_string().as_str()));

        run_transaction(|| {
            let query = db.client.query("BEGIN TRANSACTION;");
            let query = db.tasks.build_guard_no_active_query(query, requester);
            let query = db.content_items.build_claim_query(query, &item.id);
            let query = db.tasks.build_create_query(
                query,
                TaskCreate {
                    id: task_id.clone(),
                    content_item: item.id.clone(),
                    assigner: item.owner.clone(),
                    assignee: requester.clone(),
                    obligation: obligation.clone(),
                },
            );
            let mut query = db.watch_records.build_create_query(query, requester, &item.id);
            if flags.task_credits {
                query = ledger.build_debit_query(query, &item.owner, item.duration);
            }
            query.query("COMMIT TRANSACTION;")
        })
        .await?;

        let task = not_found(db.tasks.get(&task_id).await?, &task_id.to_raw())?;
        let min_watch_minutes = item.min_watch_minutes();
        Ok(Assignment {
            task,
            item,
            owner_tier,
            min_watch_minutes,
        })
    }
}
