#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fake::{faker::lorem::en::Sentence, Fake};
use watch_exchange::config::{AppConfig, FeatureFlags};
use watch_exchange::database::client::{Database, DbConfig};
use watch_exchange::entities::content_item::{ContentItem, ContentItemInput};
use watch_exchange::entities::exchange_event::ExchangeEvent;
use watch_exchange::entities::participant::Participant;
use watch_exchange::entities::task::Task;
use watch_exchange::interfaces::access_gatekeeper::{AccessGatekeeperInterface, OpenAccess};
use watch_exchange::interfaces::messaging::MessagingGatewayInterface;
use watch_exchange::middleware::mw_ctx::{create_ctx_state, CtxState};
use watch_exchange::services::content_service::ContentService;
use watch_exchange::services::ledger_service::LedgerService;
use watch_exchange::services::matching_service::{MatchOutcome, MatchingService};
use watch_exchange::services::participant_service::ParticipantService;
use watch_exchange::services::task_service::{SubmitOutcome, TaskService, VerifyOutcome};

pub const OPERATOR: &str = "operator";

/// Keeps every delivered event for assertions.
#[derive(Default)]
pub struct RecordingGateway {
    delivered: Mutex<Vec<(Vec<String>, ExchangeEvent)>>,
}

impl RecordingGateway {
    pub fn events_for(&self, receiver: &str) -> Vec<ExchangeEvent> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(receivers, _)| receivers.iter().any(|r| r == receiver))
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ExchangeEvent) -> bool) -> usize {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, event)| predicate(event))
            .count()
    }
}

#[async_trait]
impl MessagingGatewayInterface for RecordingGateway {
    async fn deliver(&self, receivers: Vec<String>, event: ExchangeEvent) -> Result<(), String> {
        self.delivered.lock().unwrap().push((receivers, event));
        Ok(())
    }
}

/// Gateway that is always down.
pub struct FailingGateway;

#[async_trait]
impl MessagingGatewayInterface for FailingGateway {
    async fn deliver(&self, _receivers: Vec<String>, _event: ExchangeEvent) -> Result<(), String> {
        Err("gateway offline".to_string())
    }
}

#[derive(Default)]
pub struct ListGatekeeper {
    denied: Mutex<HashSet<String>>,
}

impl ListGatekeeper {
    pub fn deny(&self, participant_id: &str) {
        self.denied.lock().unwrap().insert(participant_id.to_string());
    }
}

#[async_trait]
impl AccessGatekeeperInterface for ListGatekeeper {
    async fn is_authorized(&self, participant_id: &str) -> bool {
        !self.denied.lock().unwrap().contains(participant_id)
    }
}

pub struct TestEngine {
    pub state: Arc<CtxState>,
    pub gateway: Arc<RecordingGateway>,
    pub gatekeeper: Arc<ListGatekeeper>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        db_namespace: "test".to_string(),
        db_database: "test".to_string(),
        db_password: None,
        db_username: None,
        db_url: "mem://".to_string(),
        reciprocal_tasks_enabled: true,
        quality_score_enabled: true,
        task_credits_enabled: true,
        operator_ids: vec![OPERATOR.to_string()],
    }
}

async fn connect_test_db(config: &AppConfig) -> Database {
    let db = Database::connect(DbConfig {
        url: &config.db_url,
        database: &config.db_database,
        namespace: &config.db_namespace,
        username: config.db_username.as_deref(),
        password: config.db_password.as_deref(),
    })
    .await
    .expect("connect in-memory db");
    db.run_migrations().await.expect("migrations run");
    db
}

pub async fn create_engine() -> TestEngine {
    let config = test_config();
    let db = connect_test_db(&config).await;
    let gateway = Arc::new(RecordingGateway::default());
    let gatekeeper = Arc::new(ListGatekeeper::default());
    let state = create_ctx_state(db, &config, gateway.clone(), gatekeeper.clone());
    TestEngine {
        state,
        gateway,
        gatekeeper,
    }
}

pub async fn create_engine_with_failing_gateway() -> Arc<CtxState> {
    let config = test_config();
    let db = connect_test_db(&config).await;
    create_ctx_state(
        db,
        &config,
        Arc::new(FailingGateway),
        Arc::new(OpenAccess),
    )
}

pub fn flags() -> FeatureFlags {
    FeatureFlags::default()
}

pub fn item_input(duration: u32) -> ContentItemInput {
    let title: String = Sentence(2..5).fake();
    ContentItemInput {
        title,
        thumbnail: format!("thumb-{}", uuid::Uuid::new_v4()),
        duration,
        link: None,
    }
}

pub async fn register(state: &CtxState, id: &str) -> Participant {
    ParticipantService::new(state).register(id).await.unwrap()
}

pub async fn register_with_credit(state: &CtxState, id: &str, credit: u32) -> Participant {
    register(state, id).await;
    LedgerService::new(state).credit(id, credit).await.unwrap();
    ParticipantService::new(state).get(id).await.unwrap()
}

pub async fn upload(state: &CtxState, owner: &str, duration: u32) -> ContentItem {
    ContentService::new(state)
        .upload_item(owner, item_input(duration))
        .await
        .unwrap()
}

pub async fn request(state: &CtxState, requester: &str) -> MatchOutcome {
    MatchingService::new(state)
        .request_assignment(requester, &flags())
        .await
        .unwrap()
}

pub async fn request_assigned(state: &CtxState, requester: &str) -> Task {
    match request(state, requester).await {
        MatchOutcome::Assigned(assignment) => assignment.task,
        other => panic!("expected assignment for {requester}, got {other:?}"),
    }
}

pub async fn submit(state: &CtxState, assignee: &str) -> Task {
    match TaskService::new(state)
        .submit_proof(assignee, Some("https://proof.example/screenshot.png".to_string()))
        .await
        .unwrap()
    {
        SubmitOutcome::Submitted(task) => task,
        other => panic!("expected submission, got {other:?}"),
    }
}

/// Assign, prove and accept one task for `viewer`; returns the completed task.
pub async fn complete_one(state: &CtxState, viewer: &str, owner: &str) -> Task {
    let task = request_assigned(state, viewer).await;
    submit(state, viewer).await;
    let task_id = watch_exchange::database::surrdb_utils::record_key(&task.id);
    match TaskService::new(state)
        .accept_proof(owner, &task_id, &flags())
        .await
        .unwrap()
    {
        VerifyOutcome::Accepted(task) => task,
        other => panic!("expected acceptance, got {other:?}"),
    }
}

pub fn key(thing: &surrealdb::sql::Thing) -> String {
    watch_exchange::database::surrdb_utils::record_key(thing)
}
