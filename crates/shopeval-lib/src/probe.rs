//! Polling liveness check for a launched agent endpoint.

use crate::client::A2aClient;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Explicit probe timing knobs; tests shrink these for determinism.
#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    /// Pause between failed attempts.
    pub interval: Duration,
    /// Total budget before giving up.
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Polls the discovery endpoint until it resolves or the budget elapses.
///
/// Any successful card resolution returns `true` immediately; failures are
/// logged and swallowed. This proves the endpoint accepts the discovery
/// request, not that its internal state is warm.
pub async fn wait_until_ready(client: &A2aClient, base_url: &str, config: ProbeConfig) -> bool {
    let deadline = Instant::now() + config.timeout;
    loop {
        match client.resolve_endpoint(base_url).await {
            Ok(card) => {
                info!(agent = %card.name, url = %base_url, "agent is ready");
                return true;
            }
            Err(e) => {
                debug!(url = %base_url, error = %e, "liveness check failed");
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(config.interval).await;
    }
}
