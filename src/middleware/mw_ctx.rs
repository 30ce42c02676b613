use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::interfaces::access_gatekeeper::AccessGatekeeperInterface;
use crate::interfaces::messaging::MessagingGatewayInterface;
use crate::utils::entity_locks::EntityLocks;

pub struct CtxState {
    pub db: Database,
    pub messaging: Arc<dyn MessagingGatewayInterface + Send + Sync>,
    pub gatekeeper: Arc<dyn AccessGatekeeperInterface + Send + Sync>,
    pub locks: EntityLocks,
    pub operator_ids: Vec<String>,
}

impl Debug for CtxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtxState")
            .field("db", &self.db)
            .field("locks", &self.locks.len())
            .field("operator_ids", &self.operator_ids)
            .finish()
    }
}

pub fn create_ctx_state(
    db: Database,
    config: &AppConfig,
    messaging: Arc<dyn MessagingGatewayInterface + Send + Sync>,
    gatekeeper: Arc<dyn AccessGatekeeperInterface + Send + Sync>,
) -> Arc<CtxState> {
    Arc::new(CtxState {
        db,
        messaging,
        gatekeeper,
        locks: EntityLocks::new(),
        operator_ids: config.operator_ids.clone(),
    })
}
