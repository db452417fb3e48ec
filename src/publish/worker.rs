//! Background publish worker.
//!
//! A publish runs on its own thread and streams [`PublishEvent`]s back over a
//! channel. [`PublishGate`] admits one run at a time; the gate reopens when
//! the worker thread finishes, including when it panics.

use super::{CommandRunner, PublishError, PublishEvent, PublishReport, Publisher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Shared "publish in flight" flag.
#[derive(Debug, Clone, Default)]
pub struct PublishGate {
    busy: Arc<AtomicBool>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<GateGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A running publish.
pub struct PublishHandle {
    events: Receiver<PublishEvent>,
    thread: JoinHandle<PublishReport>,
}

impl PublishHandle {
    /// Progress events. The iterator ends when the worker finishes.
    pub fn events(&self) -> &Receiver<PublishEvent> {
        &self.events
    }

    /// Wait for the run to finish.
    pub fn join(self) -> Result<PublishReport, PublishError> {
        self.thread.join().map_err(|_| PublishError::WorkerPanicked)
    }
}

/// Start `publisher` on a worker thread unless another publish holds `gate`.
pub fn spawn<R>(publisher: Publisher<R>, gate: &PublishGate) -> Result<PublishHandle, PublishError>
where
    R: CommandRunner + 'static,
{
    let guard = gate.acquire().ok_or(PublishError::AlreadyRunning)?;
    let (tx, rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("publish".into())
        .spawn(move || {
            let _guard = guard;
            publisher.publish(Some(&tx))
        })
        .map_err(|e| PublishError::Spawn {
            step: "Starting publish worker".into(),
            message: e.to_string(),
        })?;

    Ok(PublishHandle { events: rx, thread })
}
