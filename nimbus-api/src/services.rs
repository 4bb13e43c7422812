//! Process wiring: store, placement, connectors and the completion listener.

use std::sync::Arc;
use std::time::Duration;

use nimbus_core::connector::ConnectorRegistry;
use nimbus_core::{
    ChannelNotifier, Cloud, CompletionListener, DataStore, ManagerContext, MockConnector,
    ProviderAccount, StaticPlacement,
};
use tracing::info;

/// Settings the binary collects from its command line.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub accounts: Vec<ProviderAccount>,
    /// Interval at which pending provider jobs are re-polled.
    pub poll_interval: Duration,
    /// Auto-complete latency for the mock provider. `None` keeps its
    /// pending jobs running until completed explicitly.
    pub mock_latency: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            accounts: vec![ProviderAccount::new("local", "mock", &["local"])],
            poll_interval: Duration::from_millis(1000),
            mock_latency: None,
        }
    }
}

/// Everything a server instance runs.
pub struct Services {
    pub cloud: Cloud,
    pub listener: CompletionListener,
    pub mock: Arc<MockConnector>,
}

impl Services {
    pub fn assemble(store: Arc<dyn DataStore>, config: &ServiceConfig) -> Self {
        let mut mock = MockConnector::new();
        if let Some(latency) = config.mock_latency {
            mock = mock.with_latency(latency);
        }
        let mock = Arc::new(mock);
        let connectors = ConnectorRegistry::new().with(mock.clone());

        for account in &config.accounts {
            info!(
                account_id = %account.id,
                provider_type = %account.provider_type,
                locations = ?account.locations,
                "Configured provider account"
            );
        }
        let placement = StaticPlacement::new(config.accounts.clone());

        let (notifier, rx) = ChannelNotifier::new();
        let ctx = ManagerContext::new(
            store,
            Arc::new(placement),
            Arc::new(connectors),
            Arc::new(notifier),
        );
        let cloud = Cloud::new(ctx);
        let listener = CompletionListener::new(cloud.dispatcher.clone(), rx, config.poll_interval);

        Self {
            cloud,
            listener,
            mock,
        }
    }
}
