//! Background thread hosting the update cycle.
//!
//! The update cycle runs on its own thread with a single-threaded Tokio
//! runtime for its timer and shutdown signal. The UI only ever sees the
//! snapshots it publishes.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use super::cycle::UpdateCycle;
use super::snapshot::RenderSnapshot;

/// Handle to the background update cycle.
pub struct MetricsRuntime {
    /// Receiver for RenderSnapshot publications
    pub snapshot_rx: watch::Receiver<Arc<RenderSnapshot>>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    worker: Option<thread::JoinHandle<()>>,
}

impl MetricsRuntime {
    /// Start ticking `cycle` every `delay` on a dedicated thread.
    pub fn start(cycle: UpdateCycle, delay: Duration) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let snapshot_rx = cycle.subscribe();
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        let worker = thread::Builder::new()
            .name("metrics-worker".to_string())
            .spawn(move || runtime.block_on(cycle.run(delay, shutdown_rx)))?;

        Ok(Self {
            snapshot_rx,
            shutdown_tx,
            worker: Some(worker),
        })
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Arc<RenderSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Signal the update cycle to stop.
    ///
    /// A cycle blocked in a slow source is not waited for; the thread is
    /// detached and ends with the process.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());

        if let Some(worker) = self.worker.take() {
            thread::sleep(Duration::from_millis(20));
            if worker.is_finished() {
                if worker.join().is_err() {
                    log::error!("Update cycle thread panicked");
                }
            } else {
                log::debug!("Update cycle still busy at shutdown, detaching");
            }
        }
    }
}
