use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{engine::any, method::Query, sql::Thing};

use crate::{
    database::client::Db,
    entities::participant::{Participant, ParticipantStatus, Tier, TABLE_NAME},
    interfaces::repositories::participant_ifce::ParticipantRepositoryInterface,
    middleware::error::{AppError, AppResult},
};

#[derive(Debug)]
pub struct ParticipantRepository {
    client: Arc<Db>,
}

impl ParticipantRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
        DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string DEFAULT 'active'
            ASSERT $value INSIDE ['active','paused','blocked'];
        DEFINE FIELD IF NOT EXISTS strike_count ON TABLE {TABLE_NAME} TYPE int DEFAULT 0 ASSERT $value >= 0;
        DEFINE FIELD IF NOT EXISTS completed_task_count ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS tier ON TABLE {TABLE_NAME} TYPE string DEFAULT 'Bronze'
            ASSERT $value INSIDE ['Bronze','Silver','Gold'];
        DEFINE FIELD IF NOT EXISTS credit_balance ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
        DEFINE INDEX IF NOT EXISTS completed_idx ON TABLE {TABLE_NAME} FIELDS completed_task_count;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepositoryInterface for ParticipantRepository {
    async fn register(&self, participant: &Thing) -> AppResult<Participant> {
        let mut res = self
            .client
            .query("UPSERT $id RETURN AFTER;")
            .bind(("id", participant.clone()))
            .await?;
        let registered = res.take::<Vec<Participant>>(0)?;
        registered.into_iter().next().ok_or(AppError::EntityFailIdNotFound {
            ident: participant.to_raw(),
        })
    }

    async fn get(&self, participant: &Thing) -> AppResult<Option<Participant>> {
        let mut res = self
            .client
            .query("SELECT * FROM $id;")
            .bind(("id", participant.clone()))
            .await?;
        let found = res.take::<Vec<Participant>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn adjust_balance(
        &self,
        participant: &Thing,
        delta: i64,
    ) -> AppResult<Option<Participant>> {
        let mut res = self
            .client
            .query("UPDATE $id SET credit_balance += $delta RETURN AFTER;")
            .bind(("id", participant.clone()))
            .bind(("delta", delta))
            .await?;
        let found = res.take::<Vec<Participant>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn update_status(
        &self,
        participant: &Thing,
        from: &[ParticipantStatus],
        status: ParticipantStatus,
    ) -> AppResult<Option<Participant>> {
        let from = from
            .iter()
            .map(|s| s.as_str().to_string())
            .collect::<Vec<String>>();
        let mut res = self
            .client
            .query("UPDATE $id SET status = $status WHERE status INSIDE $from RETURN AFTER;")
            .bind(("id", participant.clone()))
            .bind(("status", status.as_str()))
            .bind(("from", from))
            .await?;
        let updated = res.take::<Vec<Participant>>(0)?;
        Ok(updated.into_iter().next())
    }

    async fn update_strikes(
        &self,
        participant: &Thing,
        strike_count: u32,
        status: ParticipantStatus,
    ) -> AppResult<Option<Participant>> {
        let mut res = self
            .client
            .query("UPDATE $id SET strike_count = $strike_count, status = $status RETURN AFTER;")
            .bind(("id", participant.clone()))
            .bind(("strike_count", strike_count))
            .bind(("status", status.as_str()))
            .await?;
        let found = res.take::<Vec<Participant>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn update_tier(&self, participant: &Thing, tier: Tier) -> AppResult<Option<Participant>> {
        let mut res = self
            .client
            .query("UPDATE $id SET tier = $tier RETURN AFTER;")
            .bind(("id", participant.clone()))
            .bind(("tier", tier.as_str()))
            .await?;
        let found = res.take::<Vec<Participant>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn top_by_completed(&self, limit: u32) -> AppResult<Vec<Participant>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} ORDER BY completed_task_count DESC LIMIT $limit;"
            ))
            .bind(("limit", limit))
            .await?;
        Ok(res.take::<Vec<Participant>>(0)?)
    }

    fn build_adjust_balance_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        delta: i64,
    ) -> Query<'b, any::Any> {
        query
            .query("UPDATE $_ledger_participant SET credit_balance += $_ledger_delta;")
            .bind(("_ledger_participant", participant.clone()))
            .bind(("_ledger_delta", delta))
    }

    fn build_set_strikes_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
        strike_count: u32,
        status: ParticipantStatus,
    ) -> Query<'b, any::Any> {
        query
            .query("UPDATE $_strike_participant SET strike_count = $_strike_count, status = $_strike_status;")
            .bind(("_strike_participant", participant.clone()))
            .bind(("_strike_count", strike_count))
            .bind(("_strike_status", status.as_str()))
    }

    fn build_increment_completed_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        participant: &Thing,
    ) -> Query<'b, any::Any> {
        query
            .query("UPDATE $_completed_participant SET completed_task_count += 1;")
            .bind(("_completed_participant", participant.clone()))
    }
}
