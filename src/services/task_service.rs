use std::collections::HashMap;

use surrealdb::sql::Thing;
use tracing::info;

use crate::config::FeatureFlags;
use crate::database::surrdb_utils::{record_key, run_transaction};
use crate::entities::content_item::ContentStatus;
use crate::entities::participant::participant_thing;
use crate::entities::task::{task_thing, Task, TaskStatus};
use crate::interfaces::repositories::content_item_ifce::ContentItemRepositoryInterface;
use crate::interfaces::repositories::obligation_ifce::ObligationRepositoryInterface;
use crate::interfaces::repositories::participant_ifce::ParticipantRepositoryInterface;
use crate::interfaces::repositories::task_ifce::TaskRepositoryInterface;
use crate::middleware::error::{not_found, AppError, AppResult};
use crate::middleware::mw_ctx::CtxState;
use crate::services::ledger_service::LedgerService;
use crate::services::notification_service::NotificationService;
use crate::services::quality_service::should_flag;
use crate::services::strike_service::{apply_strike, StrikeService};

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted(Task),
    EvidenceMissing,
    AlreadyProcessed,
}

#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Accepted(Task),
    Rejected { task: Task, strike_count: u32 },
    AlreadyProcessed,
}

/// Backlog of one content owner: live tasks on their items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub owner: Thing,
    pub awaiting_proof: usize,
    pub awaiting_verification: usize,
    pub tasks: Vec<Thing>,
}

impl PendingVerification {
    pub fn total(&self) -> usize {
        self.awaiting_proof + self.awaiting_verification
    }
}

/// Groups live tasks by assigner, largest backlog first.
pub fn group_pending(tasks: Vec<Task>) -> Vec<PendingVerification> {
    let mut by_owner: HashMap<Thing, PendingVerification> = HashMap::new();
    for task in tasks.into_iter().filter(|t| !t.status.is_terminal()) {
        let entry = by_owner
            .entry(task.assigner.clone())
            .or_insert_with(|| PendingVerification {
                owner: task.assigner.clone(),
                awaiting_proof: 0,
                awaiting_verification: 0,
                tasks: vec![],
            });
        match task.status {
            TaskStatus::Assigned => entry.awaiting_proof += 1,
            TaskStatus::ProofSubmitted => entry.awaiting_verification += 1,
            TaskStatus::Completed | TaskStatus::Failed => {}
        }
        entry.tasks.push(task.id);
    }
    let mut grouped = by_owner.into_values().collect::<Vec<_>>();
    grouped.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| a.owner.to_string().cmp(&b.owner.to_string()))
    });
    grouped
}

pub struct TaskService<'a> {
    state: &'a CtxState,
}

impl<'a> TaskService<'a> {
    pub fn new(state: &'a CtxState) -> Self {
        Self { state }
    }

    pub async fn get_task(&self, task_id: &str) -> AppResult<Task> {
        let task = self.state.db.tasks.get(&task_thing(task_id)).await?;
        not_found(task, task_id)
    }

    /// The assignee's live task, if any.
    pub async fn active_task(&self, assignee_id: &str) -> AppResult<Option<Task>> {
        self.state
            .db
            .tasks
            .find_by_assignee(
                &participant_thing(assignee_id),
                &[TaskStatus::Assigned, TaskStatus::ProofSubmitted],
            )
            .await
    }

    pub async fn submit_proof(
        &self,
        assignee_id: &str,
        evidence: Option<String>,
    ) -> AppResult<SubmitOutcome> {
        let db = &self.state.db;
        let assignee = participant_thing(assignee_id);
        let _assignee_guard = self.state.locks.lock(&assignee).await;

        let task = db
            .tasks
            .find_by_assignee(&assignee, &[TaskStatus::Assigned])
            .await?;
        let task = not_found(task, assignee_id)?;

        let evidence = match evidence.map(|e| e.trim().to_string()) {
            Some(e) if !e.is_empty() => e,
            _ => return Ok(SubmitOutcome::EvidenceMissing),
        };

        let _task_guard = self.state.locks.lock(&task.id).await;
        let submitted = run_transaction(|| {
            let query = db.client.query("BEGIN TRANSACTION;");
            let query = db
                .tasks
                .build_submit_proof_query(query, &task.id, evidence.clone());
            query.query("COMMIT TRANSACTION;")
        })
        .await;
        match submitted {
            Ok(_) => {}
            Err(AppError::TaskAlreadyProcessed) => return Ok(SubmitOutcome::AlreadyProcessed),
            Err(err) => return Err(err),
        }

        let task = not_found(db.tasks.get(&task.id).await?, &task.id.to_raw())?;
        info!("proof submitted for task {}", task.id);
        NotificationService::new(self.state)
            .on_verification_requested(&task, &evidence)
            .await;
        Ok(SubmitOutcome::Submitted(task))
    }

    pub async fn accept_proof(
        &self,
        owner_id: &str,
        task_id: &str,
        flags: &FeatureFlags,
    ) -> AppResult<VerifyOutcome> {
        let db = &self.state.db;
        let task_id_thing = task_thing(task_id);
        let _task_guard = self.state.locks.lock(&task_id_thing).await;

        let task = self.owned_task(owner_id, &task_id_thing).await?;
        if task.status != TaskStatus::ProofSubmitted {
            return Ok(VerifyOutcome::AlreadyProcessed);
        }

        let _item_guard = self.state.locks.lock(&task.content_item).await;
        let item = not_found(
            db.content_items.get(&task.content_item).await?,
            &task.content_item.to_raw(),
        )?;
        let release_status = self.release_status(item.quality_score, item.rating_count, flags);
        let ledger = LedgerService::new(self.state);

        let accepted = run_transaction(|| {
            let query = db.client.query("BEGIN TRANSACTION;");
            let query = db.tasks.build_complete_query(query, &task.id);
            let query = db
                .content_items
                .build_release_query(query, &item.id, release_status, 1);
            let mut query = db
                .participants
                .build_increment_completed_query(query, &task.assignee);
            if flags.task_credits {
                query = ledger.build_credit_query(query, &task.assignee, item.duration);
            }
            if flags.reciprocal_tasks {
                query = db
                    .obligations
                    .build_create_query(query, &task.assigner, &task.assignee);
            }
            if let Some(obligation) = &task.obligation {
                query = db.obligations.build_resolve_query(query, obligation);
            }
            query.query("COMMIT TRANSACTION;")
        })
        .await;
        match accepted {
            Ok(_) => {}
            Err(AppError::TaskAlreadyProcessed) => return Ok(VerifyOutcome::AlreadyProcessed),
            Err(err) => return Err(err),
        }

        let task = not_found(db.tasks.get(&task.id).await?, task_id)?;
        info!("task {task_id} accepted, item {} back as {release_status}", item.id);

        let notifications = NotificationService::new(self.state);
        let credited = if flags.task_credits { item.duration } else { 0 };
        notifications
            .on_proof_accepted(&task, credited, flags.quality_score)
            .await;
        if release_status == ContentStatus::Flagged {
            notifications.on_item_flagged(&item, item.quality_score).await;
        }
        Ok(VerifyOutcome::Accepted(task))
    }

    pub async fn reject_proof(
        &self,
        owner_id: &str,
        task_id: &str,
        reason: Option<String>,
        flags: &FeatureFlags,
    ) -> AppResult<VerifyOutcome> {
        let db = &self.state.db;
        let task_id_thing = task_thing(task_id);
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        // the assignee never changes, so it can be read before any lock is held
        let assignee = self.owned_task(owner_id, &task_id_thing).await?.assignee;
        let (task, item, release_status, strike) = {
            let _assignee_guard = self.state.locks.lock(&assignee).await;
            let _task_guard = self.state.locks.lock(&task_id_thing).await;
            let task = self.owned_task(owner_id, &task_id_thing).await?;
            if task.status != TaskStatus::ProofSubmitted {
                return Ok(VerifyOutcome::AlreadyProcessed);
            }

            let _item_guard = self.state.locks.lock(&task.content_item).await;
            let item = not_found(
                db.content_items.get(&task.content_item).await?,
                &task.content_item.to_raw(),
            )?;
            let release_status =
                self.release_status(item.quality_score, item.rating_count, flags);
            let current = not_found(
                db.participants.get(&assignee).await?,
                &record_key(&assignee),
            )?;
            let strike = apply_strike(current.strike_count, current.status);

            let rejected = run_transaction(|| {
                let query = db.client.query("BEGIN TRANSACTION;");
                let query = db.tasks.build_fail_query(query, &task.id, reason.clone());
                let query = db
                    .content_items
                    .build_release_query(query, &item.id, release_status, 0);
                let query = db.participants.build_set_strikes_query(
                    query,
                    &assignee,
                    strike.strike_count,
                    strike.status,
                );
                query.query("COMMIT TRANSACTION;")
            })
            .await;
            match rejected {
                Ok(_) => {}
                Err(AppError::TaskAlreadyProcessed) => {
                    return Ok(VerifyOutcome::AlreadyProcessed)
                }
                Err(err) => return Err(err),
            }
            (task, item, release_status, strike)
        };

        let task = not_found(db.tasks.get(&task.id).await?, task_id)?;
        let assignee = not_found(
            db.participants.get(&assignee).await?,
            &record_key(&assignee),
        )?;
        info!(
            "task {task_id} rejected, assignee strikes {}",
            strike.strike_count
        );

        let notifications = NotificationService::new(self.state);
        notifications
            .on_proof_rejected(&task, reason, strike.strike_count)
            .await;
        StrikeService::new(self.state).announce(&assignee, &strike).await;
        if release_status == ContentStatus::Flagged {
            notifications.on_item_flagged(&item, item.quality_score).await;
        }
        Ok(VerifyOutcome::Rejected {
            task,
            strike_count: strike.strike_count,
        })
    }

    pub async fn pending_verifications(&self) -> AppResult<Vec<PendingVerification>> {
        let tasks = self.state.db.tasks.list_non_terminal().await?;
        Ok(group_pending(tasks))
    }

    async fn owned_task(&self, owner_id: &str, task: &Thing) -> AppResult<Task> {
        let owner = participant_thing(owner_id);
        let found = self
            .state
            .db
            .tasks
            .get(task)
            .await?
            .filter(|t| t.assigner == owner);
        not_found(found, &task.to_raw())
    }

    /// Where the item goes once its task is verified.
    fn release_status(&self, score: f64, rating_count: u32, flags: &FeatureFlags) -> ContentStatus {
        if flags.quality_score && should_flag(score, rating_count) {
            ContentStatus::Flagged
        } else {
            ContentStatus::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, assigner: &str, status: TaskStatus) -> Task {
        Task {
            id: task_thing(id),
            content_item: Thing::from(("content_item", id)),
            assigner: participant_thing(assigner),
            assignee: participant_thing("viewer"),
            status,
            proof: None,
            rejection_reason: None,
            quality_rating: None,
            obligation: None,
            assigned_at: Utc::now(),
            proof_submitted_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn pending_grouped_by_owner_largest_first() {
        let grouped = group_pending(vec![
            task("t1", "alice", TaskStatus::Assigned),
            task("t2", "bob", TaskStatus::ProofSubmitted),
            task("t3", "bob", TaskStatus::Assigned),
            task("t4", "alice", TaskStatus::Completed),
            task("t5", "carol", TaskStatus::ProofSubmitted),
        ]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].owner, participant_thing("bob"));
        assert_eq!(grouped[0].awaiting_proof, 1);
        assert_eq!(grouped[0].awaiting_verification, 1);
        assert_eq!(grouped[1].owner, participant_thing("alice"));
        assert_eq!(grouped[1].tasks, vec![task_thing("t1")]);
        assert_eq!(grouped[2].owner, participant_thing("carol"));
    }
}
