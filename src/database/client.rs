use std::sync::Arc;

use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::info;

use crate::middleware::error::AppResult;

use super::repositories::{
    content_item_repo::ContentItemRepository, obligation_repo::ObligationRepository,
    participant_repo::ParticipantRepository, report_repo::ReportRepository,
    task_repo::TaskRepository,
    watch_record_repo::WatchRecordRepository,
};

pub type Db = Surreal<Any>;

#[derive(Debug)]
pub struct DbConfig<'a> {
    pub url: &'a str,
    pub database: &'a str,
    pub namespace: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Debug)]
pub struct Database {
    pub client: Arc<Db>,
    pub participants: ParticipantRepository,
    pub content_items: ContentItemRepository,
    pub tasks: TaskRepository,
    pub watch_records: WatchRecordRepository,
    pub obligations: ObligationRepository,
    pub reports: ReportRepository,
}

impl Database {
    pub async fn connect(config: DbConfig<'_>) -> AppResult<Self> {
        info!("->> connecting DB url={} ns={} db={}", config.url, config.namespace, config.database);
        let conn = connect(config.url).await?;

        if let (Some(username), Some(password)) = (config.username, config.password) {
            conn.signin(Root { username, password }).await?;
        }

        conn.use_ns(config.namespace)
            .use_db(config.database)
            .await?;

        let version = conn.version().await?;
        info!("->> connected DB version: {version}");

        Ok(Self::from_client(Arc::new(conn)))
    }

    pub fn from_client(client: Arc<Db>) -> Self {
        Self {
            participants: ParticipantRepository::new(client.clone()),
            content_items: ContentItemRepository::new(client.clone()),
            tasks: TaskRepository::new(client.clone()),
            watch_records: WatchRecordRepository::new(client.clone()),
            obligations: ObligationRepository::new(client.clone()),
            reports: ReportRepository::new(client.clone()),
            client,
        }
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        self.participants.mutate_db().await?;
        self.content_items.mutate_db().await?;
        self.tasks.mutate_db().await?;
        self.watch_records.mutate_db().await?;
        self.obligations.mutate_db().await?;
        self.reports.mutate_db().await?;
        info!("->> migrations applied");
        Ok(())
    }
}
