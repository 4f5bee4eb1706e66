use crate::services::host::{Messenger, ModuleRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Joins channels the loader asked for (e.g. a module's update channel
/// approved by the user) and reports back whether it worked.
pub struct ChannelJoinService {
    registry: Arc<dyn ModuleRegistry>,
    messenger: Arc<dyn Messenger>,
}

impl ChannelJoinService {
    pub fn new(registry: Arc<dyn ModuleRegistry>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            registry,
            messenger,
        }
    }

    /// Handles at most one pending request. Returns its outcome, if any.
    pub async fn poll_once(&self) -> Option<bool> {
        let request = self.registry.take_channel_join_request()?;

        let joined = match self.messenger.join_channel(&request.channel).await {
            Ok(()) => {
                info!("Joined channel {}", request.channel);
                true
            }
            Err(e) => {
                error!("Failed to join channel {}: {:?}", request.channel, e);
                false
            }
        };

        request.complete(joined);
        Some(joined)
    }

    /// Starts the background polling task.
    pub fn start_join_runner(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Channel join runner started.");
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;
                self.poll_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::host::ChannelJoinRequest;
    use crate::testing::{FakeMessenger, FakeRegistry};

    #[tokio::test]
    async fn test_poll_once() {
        let registry = Arc::new(FakeRegistry::default());
        let messenger = Arc::new(FakeMessenger::default());
        let service = ChannelJoinService::new(registry.clone(), messenger.clone());

        assert_eq!(service.poll_once().await, None);

        let (request, rx) = ChannelJoinRequest::new("hikka_news");
        registry.queue_join_request(request);
        assert_eq!(service.poll_once().await, Some(true));
        assert_eq!(rx.await.ok(), Some(true));
        assert!(messenger.journal().contains(&"join_channel hikka_news".to_string()));

        messenger.fail_on("join_channel");
        let (request, rx) = ChannelJoinRequest::new("private_chan");
        registry.queue_join_request(request);
        assert_eq!(service.poll_once().await, Some(false));
        assert_eq!(rx.await.ok(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_picks_up_requests() {
        let registry = Arc::new(FakeRegistry::default());
        let messenger = Arc::new(FakeMessenger::default());
        let service = Arc::new(ChannelJoinService::new(registry.clone(), messenger));

        let handle = service.start_join_runner();

        let (request, rx) = ChannelJoinRequest::new("hikka_news");
        registry.queue_join_request(request);
        assert_eq!(rx.await.ok(), Some(true));

        handle.abort();
    }
}
