use async_trait::async_trait;

/// Decides, outside the engine, whether a participant may request work
/// (subscriptions, trials, payments).
#[async_trait]
pub trait AccessGatekeeperInterface {
    async fn is_authorized(&self, participant_id: &str) -> bool;
}

/// Lets everybody in.
#[derive(Debug, Default, Clone)]
pub struct OpenAccess;

#[async_trait]
impl AccessGatekeeperInterface for OpenAccess {
    async fn is_authorized(&self, _participant_id: &str) -> bool {
        true
    }
}
