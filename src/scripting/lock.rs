//! The global execution lock
//!
//! Only a thread holding an [`ExecutionGuard`] may touch the interpreter.
//! The guard releases on every exit path, unwinding included. A thread that
//! already holds the lock gets a nested guard instead of deadlocking; nested
//! guards give no access to the protected state.

use std::cell::RefCell;
use std::sync::{Mutex, MutexGuard};

thread_local! {
    /// Addresses of the execution locks held by this thread
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

pub struct ExecutionLock<T> {
    inner: Mutex<T>,
}

impl<T> ExecutionLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Whether the calling thread holds this lock
    pub fn held_by_current_thread(&self) -> bool {
        let id = self.id();
        HELD.with(|held| held.borrow().contains(&id))
    }

    /// Block until the calling thread is the sole holder
    pub fn acquire(&self) -> ExecutionGuard<'_, T> {
        if self.held_by_current_thread() {
            return ExecutionGuard {
                inner: None,
                id: self.id(),
            };
        }

        let guard = self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("execution lock poisoned by a panicking holder; recovering");
            poisoned.into_inner()
        });
        let id = self.id();
        HELD.with(|held| held.borrow_mut().push(id));
        tracing::trace!("execution lock acquired");

        ExecutionGuard {
            inner: Some(guard),
            id,
        }
    }
}

/// Scoped ownership of the execution lock
pub struct ExecutionGuard<'a, T> {
    inner: Option<MutexGuard<'a, T>>,
    id: usize,
}

impl<T> ExecutionGuard<'_, T> {
    /// True when the thread already held the lock at acquisition
    pub fn is_nested(&self) -> bool {
        self.inner.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_deref_mut()
    }
}

impl<T> Drop for ExecutionGuard<'_, T> {
    fn drop(&mut self) {
        if self.inner.is_none() {
            return;
        }
        // Unregister before the mutex itself is released below
        let id = self.id;
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&h| h == id) {
                held.remove(pos);
            }
        });
        self.inner = None;
        tracing::trace!("execution lock released");
    }
}
