use async_trait::async_trait;

use crate::error::NotifyError;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// One outbound notification channel. Implementations report failures
/// instead of retrying; the dispatcher decides what to log.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Channels without a subject line (chat) ignore `subject`.
    async fn send(&self, subject: &str, body: &str) -> NotifyResult<()>;
}
