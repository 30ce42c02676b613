use async_trait::async_trait;

use crate::entities::exchange_event::ExchangeEvent;

/// Outbound channel to participants and operators. Receivers are external
/// participant ids.
#[async_trait]
pub trait MessagingGatewayInterface {
    async fn deliver(&self, receivers: Vec<String>, event: ExchangeEvent) -> Result<(), String>;
}
