use crate::domain::money::Amount;
use crate::domain::ports::Notifier;
use crate::domain::task::UserId;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Notification sink that records deliveries in the service log.
///
/// The real delivery channel (mail, push) lives outside this core; callers
/// treat the port as fire-and-forget either way.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn wallet_funded(&self, user_id: UserId, amount: Amount, reference: &str) -> Result<()> {
        info!(user_id, amount = %amount.value(), reference, "wallet funded notification");
        Ok(())
    }
}
