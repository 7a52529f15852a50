//! Out-of-band cancellation of the running script
//!
//! A stop request marks the run that is executing at the time of the request.
//! The interpreter polls the mark at its progress checkpoint (every
//! operation) and terminates the run there. Native calls that never return to
//! the interpreter are not interrupted until they do.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::{Error, Result};

/// Identifies one execution on one OS thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTarget {
    pub thread: ThreadId,
    pub run: u64,
}

#[derive(Debug, Default)]
pub struct Interrupts {
    current: Mutex<Option<RunTarget>>,
    pending: AtomicBool,
    closed: AtomicBool,
    next_run: AtomicU64,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<RunTarget>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register the calling thread as running a new script
    pub fn begin(&self) -> RunTicket<'_> {
        let target = RunTarget {
            thread: thread::current().id(),
            run: self.next_run.fetch_add(1, Ordering::Relaxed),
        };
        let mut current = self.current_slot();
        *current = Some(target);
        self.pending.store(false, Ordering::SeqCst);
        RunTicket {
            interrupts: self,
            target,
        }
    }

    /// The run currently executing, if any
    pub fn current(&self) -> Option<RunTarget> {
        *self.current_slot()
    }

    /// Mark `target` for interruption. No-op unless it is still running.
    pub fn raise(&self, target: RunTarget) -> bool {
        let current = self.current_slot();
        if *current == Some(target) {
            self.pending.store(true, Ordering::SeqCst);
            tracing::debug!(run = target.run, "interrupt raised");
            true
        } else {
            tracing::debug!(run = target.run, "interrupt target no longer running");
            false
        }
    }

    /// Polled by the interpreter on the executing thread
    pub fn checkpoint(&self) -> bool {
        self.pending.load(Ordering::Relaxed) || self.closed.load(Ordering::Relaxed)
    }

    /// Interrupt the current run and every run after it. Used at teardown,
    /// where a run may start between the stop and the worker's exit.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("interrupts closed");
    }

    /// Interrupt whatever is running now, from a short-lived helper thread so
    /// the caller never waits.
    ///
    /// Returns `Ok(None)` when nothing is running.
    pub fn request_stop(self: &Arc<Self>) -> Result<Option<JoinHandle<bool>>> {
        let Some(target) = self.current() else {
            tracing::debug!("stop requested while idle");
            return Ok(None);
        };
        let interrupts = Arc::clone(self);
        thread::Builder::new()
            .name("lark-script-stop".to_string())
            .spawn(move || interrupts.raise(target))
            .map(Some)
            .map_err(|source| Error::Spawn {
                name: "stop",
                source,
            })
    }
}

/// Registration of a running script; dropping it returns to idle
pub struct RunTicket<'a> {
    interrupts: &'a Interrupts,
    target: RunTarget,
}

impl RunTicket<'_> {
    pub fn target(&self) -> RunTarget {
        self.target
    }
}

impl Drop for RunTicket<'_> {
    fn drop(&mut self) {
        let mut current = self.interrupts.current_slot();
        if *current == Some(self.target) {
            *current = None;
            self.interrupts.pending.store(false, Ordering::SeqCst);
        }
    }
}
