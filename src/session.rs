//! Runs detection, apply and restore on a background worker, one at a time.
//!
//! The worker logs through a [`ChannelLog`]; the calling thread replays each
//! entry through its own logger as it arrives, so console output and task
//! records are only ever touched on the foreground.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::error::SessionError;
use crate::logging::{ChannelLog, Log};
use crate::tasks::Context;

/// Clears the busy flag when the worker finishes, however it finishes.
#[derive(Debug)]
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrator owning the reentrancy guard.
///
/// Clones share the guard.
#[derive(Debug, Clone, Default)]
pub struct Session {
    busy: Arc<AtomicBool>,
}

impl Session {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run `job` on a worker thread against a copy of `ctx`, replaying its
    /// log entries through `foreground` until it finishes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if another job is running and
    /// [`SessionError::WorkerLost`] if the worker could not be started or
    /// panicked.
    pub fn run<T, F>(&self, ctx: &Context, foreground: &dyn Log, job: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&Context) -> T + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let (log, rx) = ChannelLog::new();
        let worker_ctx = ctx.with_log(Arc::new(log));
        let handle = thread::Builder::new()
            .name("encfix-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                job(&worker_ctx)
            })
            .map_err(|_| SessionError::WorkerLost)?;

        for entry in rx {
            entry.replay(foreground);
        }
        handle.join().map_err(|_| SessionError::WorkerLost)
    }
}
