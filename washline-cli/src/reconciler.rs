//! Optional periodic reconciliation.
//!
//! Expiry is normally observed lazily by the next request. When an interval is
//! configured, this task also reconciles on a timer so that machines are
//! reclaimed and queued users promoted even while nobody is polling. It takes
//! the same lock as the request handlers.

use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::server::SharedClient;

/// Spawn the background reconciler. Cancel the returned token to stop it.
pub fn spawn_reconcile_task(client: SharedClient, every: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        run_reconcile_loop(client, every, cancel_clone).await;
    });

    cancel
}

async fn run_reconcile_loop(client: SharedClient, every: Duration, cancel: CancellationToken) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(interval_secs = every.as_secs(), "Background reconciler started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Background reconciler shutting down");
                break;
            }
            _ = ticker.tick() => {
                let expired = client.lock().await.reconcile();
                if !expired.is_empty() {
                    debug!(count = expired.len(), "Background reconciliation reclaimed machines");
                }
            }
        }
    }
}
