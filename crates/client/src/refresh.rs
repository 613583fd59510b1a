//! Background session refresh on a fixed interval.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::ClientError;

/// Handle to a running refresh loop. Dropping it stops the loop.
pub struct AutoRefresh {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    /// Spawn the loop. The first refresh happens one `interval` from now.
    ///
    /// The task holds a weak reference, so it ends on its own once the
    /// client is dropped.
    pub fn spawn(client: Weak<ApiClient>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(client, interval, cancel.clone()));
        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(client: Weak<ApiClient>, interval: Duration, cancel: CancellationToken) {
    tracing::debug!(interval_ms = interval.as_millis() as u64, "Auto-refresh started");

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(client) = client.upgrade() else {
            break;
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = client.refresh() => result,
        };

        match result {
            Ok(session) => tracing::debug!(user_id = session.user.id, "Auto-refresh succeeded"),
            Err(ClientError::NotLoggedIn | ClientError::SessionExpired) => {
                tracing::info!("Auto-refresh ended: no session");
                break;
            }
            // Transient failures keep the schedule; the next tick retries.
            Err(e) => tracing::warn!(error = %e, "Auto-refresh failed"),
        }
    }

    tracing::debug!("Auto-refresh stopped");
}
