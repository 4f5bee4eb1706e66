use crate::Error;
use crate::services::host::Dashboard;
use std::sync::Arc;
use tracing::info;

pub const FORCE_INSECURE_TOKEN: &str = "force_insecure";

/// Whether `weburl` must warn before exposing the dashboard link.
pub fn requires_privacy_gate(force: bool, is_private: bool, text: &str) -> bool {
    !force && !is_private && !text.to_lowercase().contains(FORCE_INSECURE_TOKEN)
}

/// Owns access to the injected dashboard.
pub struct WebService {
    dashboard: Arc<dyn Dashboard>,
}

impl WebService {
    pub fn new(dashboard: Arc<dyn Dashboard>) -> Self {
        Self { dashboard }
    }

    /// Starts the dashboard if needed and opens a proxied tunnel to it.
    pub async fn tunnel_url(&self) -> Result<String, Error> {
        if !self.dashboard.is_running() {
            info!("Starting web dashboard");
            self.dashboard.start().await?;
        }

        self.dashboard.url(true).await
    }

    /// Non-proxied URL, for hosts that expose the dashboard themselves.
    pub async fn direct_url(&self) -> Result<String, Error> {
        self.dashboard.url(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDashboard;

    #[test]
    fn test_privacy_gate() {
        assert!(requires_privacy_gate(false, false, ".weburl"));
        assert!(!requires_privacy_gate(true, false, ".weburl"));
        assert!(!requires_privacy_gate(false, true, ".weburl"));
        assert!(!requires_privacy_gate(false, false, ".weburl FORCE_INSECURE"));
    }

    #[tokio::test]
    async fn test_tunnel_starts_dashboard_once() {
        let dashboard = Arc::new(FakeDashboard::default());
        let web = WebService::new(dashboard.clone());

        assert_eq!(web.tunnel_url().await.unwrap(), "https://tunnel.example/abc");
        assert_eq!(web.tunnel_url().await.unwrap(), "https://tunnel.example/abc");
        assert_eq!(dashboard.starts(), 1);

        assert_eq!(web.direct_url().await.unwrap(), "http://127.0.0.1:8080");
    }
}
