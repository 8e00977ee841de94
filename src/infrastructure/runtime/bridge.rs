//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI thread owns every piece of page state. The runtime thread only
//! performs backend I/O and drives the refresh loop, reporting back through
//! [`RuntimeEvent`]s that the TUI polls once per frame.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::mpsc as async_mpsc;

use crate::core::HealthState;
use crate::infrastructure::api::{ApiResult, Backend, Request};
use crate::infrastructure::runtime::refresh::{RefreshSchedule, Tick};
use crate::infrastructure::runtime::worker::run_async_worker;

/// One backend call within a batch
#[derive(Debug, Clone)]
pub struct Job {
    pub ticket: u64,
    pub request: Request,
}

/// Independent calls that settle together
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: u64,
    pub jobs: Vec<Job>,
    /// Report the settled summary on the status line
    pub announce: bool,
}

/// Commands sent from the TUI to the async worker
pub enum RuntimeCommand {
    /// Run a batch with all-settled semantics
    Dispatch(Batch),
    /// Use a different backend for every later call
    SwapBackend(Arc<dyn Backend>),
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A single job finished
    Fetched { ticket: u64, result: ApiResult },
    /// Every job of a batch finished
    BatchSettled {
        id: u64,
        succeeded: usize,
        failed: usize,
        announce: bool,
    },
    /// Liveness probe result from the refresh loop
    Health(HealthState),
    /// Refresh loop tick; the TUI refreshes the page that is active right now
    Tick(Tick),
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: async_mpsc::UnboundedSender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    pub fn new(backend: Arc<dyn Backend>, schedule: RefreshSchedule) -> Result<Self> {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("create Tokio runtime")?;

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("socdash-runtime".to_string())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) =
                        run_async_worker(backend, schedule, cmd_rx, evt_tx.clone()).await
                    {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })
            .context("spawn runtime thread")?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
