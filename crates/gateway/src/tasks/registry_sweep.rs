//! Credential registry sweep background task.
//!
//! Expired entries are already treated as invalid on lookup; the sweep only
//! bounds memory by dropping them.
//!
//! # Graceful Shutdown
//!
//! The task exits when its cancellation token is cancelled. A sweep in
//! progress runs to completion first.

use crate::observability::metrics::record_registry_sweep;
use crate::session::CredentialRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Start the registry sweep background task.
///
/// Runs one sweep per `interval` until `cancel_token` is triggered. The first
/// sweep runs immediately.
#[instrument(skip_all, name = "gateway.task.registry_sweep")]
pub async fn start_registry_sweep(
    registry: Arc<CredentialRegistry>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    info!(
        target: "gateway.task.registry_sweep",
        interval_seconds = interval.as_secs(),
        "Starting registry sweep task"
    );

    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_sweep(&registry);
            }
            () = cancel_token.cancelled() => {
                info!(
                    target: "gateway.task.registry_sweep",
                    "Registry sweep task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(target: "gateway.task.registry_sweep", "Registry sweep task stopped");
}

/// Run a single sweep, returning the number of entries removed.
pub(crate) fn run_sweep(registry: &CredentialRegistry) -> usize {
    let removed = registry.sweep();
    let remaining = registry.len();

    record_registry_sweep(removed, remaining);

    if removed > 0 {
        debug!(
            target: "gateway.task.registry_sweep",
            removed,
            remaining,
            "Swept expired credentials"
        );
    }

    removed
}
