use std::time::Duration;
use tokio::task::JoinHandle;

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for ctrl-c only");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;

    tracing::info!("shutdown requested");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
}

/// Cancels `task` and waits until its future, and everything it owns, has
/// been dropped.
pub async fn stop<T>(name: &str, task: JoinHandle<T>) {
    task.abort();
    match task.await {
        Err(e) if !e.is_cancelled() => tracing::error!(task = name, error = %e, "task failed"),
        _ => tracing::debug!(task = name, "task stopped"),
    }
}

/// Waits up to `grace` for `task` to finish on its own. Returns false when
/// the grace period ran out.
pub async fn drain<T>(name: &str, task: JoinHandle<T>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, task).await {
        Ok(Ok(_)) => {
            tracing::info!(task = name, "drained");
            true
        }
        Ok(Err(e)) => {
            tracing::error!(task = name, error = %e, "task failed while draining");
            true
        }
        Err(_) => {
            tracing::warn!(task = name, grace_ms = grace.as_millis() as u64, "grace period elapsed, pending work dropped");
            false
        }
    }
}
