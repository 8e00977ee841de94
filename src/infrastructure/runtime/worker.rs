//! Async worker - runs in Tokio runtime and handles backend calls

use std::sync::mpsc::Sender;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, RwLock};

use crate::core::HealthState;
use crate::infrastructure::api::{endpoints, Backend, Request};
use crate::infrastructure::runtime::bridge::{Batch, RuntimeCommand, RuntimeEvent};
use crate::infrastructure::runtime::refresh::{log_tick_error, RefreshLoop, RefreshSchedule};

type SharedBackend = Arc<RwLock<Arc<dyn Backend>>>;

/// Outcome counts of one settled batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run the async worker loop until shutdown or until the command channel closes
pub async fn run_async_worker(
    backend: Arc<dyn Backend>,
    schedule: RefreshSchedule,
    mut cmd_rx: mpsc::UnboundedReceiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let shared: SharedBackend = Arc::new(RwLock::new(backend));
    let mut refresh = spawn_refresh_loop(shared.clone(), schedule, evt_tx.clone());

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            RuntimeCommand::Shutdown => break,

            RuntimeCommand::Dispatch(batch) => {
                let backend = shared.read().await.clone();
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    run_batch(backend, batch, &evt_tx).await;
                });
            }

            RuntimeCommand::SwapBackend(next) => {
                tracing::info!(base_url = next.base_url(), "switching backend");
                *shared.write().await = next;
            }
        }
    }

    refresh.stop();
    tracing::info!("runtime worker stopped");
    Ok(())
}

/// Run every job of a batch concurrently, forwarding each result as it
/// completes. One failure never cancels the others.
pub async fn run_batch(
    backend: Arc<dyn Backend>,
    batch: Batch,
    evt_tx: &Sender<RuntimeEvent>,
) -> BatchOutcome {
    let mut pending: FuturesUnordered<_> = batch
        .jobs
        .into_iter()
        .map(|job| {
            let backend = backend.clone();
            async move {
                let result = backend.send(&job.request).await;
                (job.ticket, job.request, result)
            }
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    while let Some((ticket, request, result)) = pending.next().await {
        match &result {
            Ok(_) => outcome.succeeded += 1,
            Err(err) => {
                outcome.failed += 1;
                tracing::warn!(request = %request.describe(), error = %err, "backend call failed");
            }
        }
        let _ = evt_tx.send(RuntimeEvent::Fetched { ticket, result });
    }

    let _ = evt_tx.send(RuntimeEvent::BatchSettled {
        id: batch.id,
        succeeded: outcome.succeeded,
        failed: outcome.failed,
        announce: batch.announce,
    });
    outcome
}

/// Liveness probe: updates the indicator, then hands the tick to the UI.
/// A failed probe is returned as the tick's error.
fn spawn_refresh_loop(
    shared: SharedBackend,
    schedule: RefreshSchedule,
    evt_tx: Sender<RuntimeEvent>,
) -> RefreshLoop {
    RefreshLoop::spawn(
        schedule,
        move |tick| {
            let shared = shared.clone();
            let evt_tx = evt_tx.clone();
            async move {
                let backend = shared.read().await.clone();
                let probe = backend.send(&Request::get(endpoints::HEALTH)).await;
                let state = HealthState::from_probe(&probe);
                let _ = evt_tx.send(RuntimeEvent::Health(state));
                let _ = evt_tx.send(RuntimeEvent::Tick(tick));
                match probe {
                    Ok(_) => Ok(()),
                    Err(err) => Err(anyhow::anyhow!("health probe failed: {err}")),
                }
            }
        },
        log_tick_error,
    )
}
