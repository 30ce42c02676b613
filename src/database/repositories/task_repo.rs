use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::{
    database::{
        client::Db,
        surrdb_utils::{
            THROW_TASK_ALREADY_ACTIVE, THROW_TASK_ALREADY_PROCESSED, THROW_TASK_ALREADY_RATED,
        },
        table_names::{CONTENT_ITEM_TABLE_NAME, OBLIGATION_TABLE_NAME, PARTICIPANT_TABLE_NAME},
    },
    entities::task::{Task, TaskCreate, TaskStatus, TABLE_NAME},
    interfaces::repositories::task_ifce::TaskRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

const NON_TERMINAL: &str = "['assigned','proof_submitted']";

#[derive(Debug)]
pub struct TaskRepository {
    client: Arc<Db>,
}

impl TaskRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS content_item ON TABLE {TABLE_NAME} TYPE record<{CONTENT_ITEM_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS assigner ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS assignee ON TABLE {TABLE_NAME} TYPE record<{PARTICIPANT_TABLE_NAME}>;
        DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string
            ASSERT $value INSIDE ['assigned','proof_submitted','completed','failed'];
        DEFINE FIELD IF NOT EXISTS proof ON TABLE {TABLE_NAME} TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS rejection_reason ON TABLE {TABLE_NAME} TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS quality_rating ON TABLE {TABLE_NAME} TYPE option<int> ASSERT $value == NONE OR $value INSIDE [0, 1];
        DEFINE FIELD IF NOT EXISTS obligation ON TABLE {TABLE_NAME} TYPE option<record<{OBLIGATION_TABLE_NAME}>>;
        DEFINE FIELD IF NOT EXISTS assigned_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE FIELD IF NOT EXISTS proof_submitted_at ON TABLE {TABLE_NAME} TYPE option<datetime>;
        DEFINE FIELD IF NOT EXISTS resolved_at ON TABLE {TABLE_NAME} TYPE option<datetime>;
        DEFINE INDEX IF NOT EXISTS assignee_status_idx ON TABLE {TABLE_NAME} FIELDS assignee, status;
        DEFINE INDEX IF NOT EXISTS item_status_idx ON TABLE {TABLE_NAME} FIELDS content_item, status;
        DEFINE INDEX IF NOT EXISTS assigner_idx ON TABLE {TABLE_NAME} FIELDS assigner;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }

    /// Compare-and-swap on status, aborting the transaction when another
    /// caller got there first.
    fn build_transition_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        from: TaskStatus,
        set: &str,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_moved_tasks = (UPDATE $_transition_task SET {set} WHERE status = $_transition_from RETURN AFTER);
                IF array::len($_moved_tasks) == 0 {{ THROW \"{THROW_TASK_ALREADY_PROCESSED}\"; }};"
            ))
            .bind(("_transition_task", task.clone()))
            .bind(("_transition_from", from.as_str()))
    }
}

#[async_trait]
impl TaskRepositoryInterface for TaskRepository {
    async fn get(&self, task: &Thing) -> AppResult<Option<Task>> {
        let mut res = self
            .client
            .query("SELECT * FROM $id;")
            .bind(("id", task.clone()))
            .await?;
        let found = res.take::<Vec<Task>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn find_by_assignee(
        &self,
        assignee: &Thing,
        statuses: &[TaskStatus],
    ) -> AppResult<Option<Task>> {
        let statuses = statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect::<Vec<String>>();
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE assignee = $assignee AND status INSIDE $statuses
                    ORDER BY assigned_at DESC LIMIT 1;"
            ))
            .bind(("assignee", assignee.clone()))
            .bind(("statuses", statuses))
            .await?;
        let found = res.take::<Vec<Task>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn list_non_terminal(&self) -> AppResult<Vec<Task>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE status INSIDE {NON_TERMINAL} ORDER BY assigned_at ASC;"
            ))
            .await?;
        Ok(res.take::<Vec<Task>>(0)?)
    }

    async fn count_by_assigner(&self, assigner: &Thing, status: TaskStatus) -> AppResult<usize> {
        let mut res = self
            .client
            .query(format!(
                "RETURN array::len((SELECT VALUE id FROM {TABLE_NAME} WHERE assigner = $assigner AND status = $status));"
            ))
            .bind(("assigner", assigner.clone()))
            .bind(("status", status.as_str()))
            .await?;
        let count = res.take::<Option<usize>>(0)?;
        Ok(count.unwrap_or(0))
    }

    fn build_guard_no_active_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        assignee: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_live_tasks = (SELECT VALUE id FROM {TABLE_NAME} WHERE assignee = $_guard_assignee AND status INSIDE {NON_TERMINAL});
                IF array::len($_live_tasks) > 0 {{ THROW \"{THROW_TASK_ALREADY_ACTIVE}\"; }};"
            ))
            .bind(("_guard_assignee", assignee.clone()))
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        data: TaskCreate,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "CREATE $_task_id SET content_item = $_task_item, assigner = $_task_assigner,
                    assignee = $_task_assignee, status = 'assigned', obligation = $_task_obligation;",
            )
            .bind(("_task_id", data.id))
            .bind(("_task_item", data.content_item))
            .bind(("_task_assigner", data.assigner))
            .bind(("_task_assignee", data.assignee))
            .bind(("_task_obligation", data.obligation))
    }

    fn build_submit_proof_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        evidence: String,
    ) -> Query<'b, any::Any> {
        self.build_transition_query(
            query,
            task,
            TaskStatus::Assigned,
            "status = 'proof_submitted', proof = $_proof_evidence, proof_submitted_at = time::now()",
        )
        .bind(("_proof_evidence", evidence))
    }

    fn build_complete_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
    ) -> Query<'b, any::Any> {
        self.build_transition_query(
            query,
            task,
            TaskStatus::ProofSubmitted,
            "status = 'completed', resolved_at = time::now()",
        )
    }

    fn build_fail_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        reason: Option<String>,
    ) -> Query<'b, any::Any> {
        self.build_transition_query(
            query,
            task,
            TaskStatus::ProofSubmitted,
            "status = 'failed', rejection_reason = $_reject_reason, resolved_at = time::now()",
        )
        .bind(("_reject_reason", reason))
    }

    fn build_rate_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task: &Thing,
        rating: u8,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_rated_tasks = (UPDATE $_rate_task SET quality_rating = $_rate_value
                    WHERE status = 'completed' AND quality_rating = NONE RETURN AFTER);
                IF array::len($_rated_tasks) == 0 {{ THROW \"{THROW_TASK_ALREADY_RATED}\"; }};"
            ))
            .bind(("_rate_task", task.clone()))
            .bind(("_rate_value", rating))
    }

    fn build_delete_non_terminal_for_item_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        item: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "DELETE {TABLE_NAME} WHERE content_item = $_orphan_item AND status INSIDE {NON_TERMINAL};"
            ))
            .bind(("_orphan_item", item.clone()))
    }
}
