//! Process-wide interpreter lifecycle
//!
//! The interpreter lives behind the execution lock in one of three states:
//! not yet started, ready (suspended between requests), or disabled after a
//! failed start. Being "active" means being borrowed through an
//! [`EngineGuard`]. The interpreter is never torn down; dropping the engine
//! just releases the memory.

use std::path::Path;
use std::sync::OnceLock;

use super::interpreter::{Bindings, Interpreter, StartOptions, StateHandle};
use super::lock::{ExecutionGuard, ExecutionLock};
use crate::error::{Error, Result};
use crate::paths::{self, BaseDirs};

enum InterpreterState {
    Uninitialized(Box<Bindings>),
    Ready(Interpreter),
    Disabled(String),
}

/// Owner of the single embedded interpreter
pub struct ScriptEngine {
    lock: ExecutionLock<InterpreterState>,
    main: OnceLock<StateHandle>,
}

impl ScriptEngine {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            lock: ExecutionLock::new(InterpreterState::Uninitialized(Box::new(bindings))),
            main: OnceLock::new(),
        }
    }

    /// Start the interpreter. Idempotent.
    ///
    /// Returns the main state handle that requests resume. A failed start
    /// disables scripting for the life of the engine: the first call reports
    /// [`Error::Initialization`], every later call [`Error::Disabled`].
    pub fn initialize(
        &self,
        machine_base_dir: &Path,
        user_base_dir: &Path,
        prefer_installed_runtime: bool,
        argv: &[String],
    ) -> Result<StateHandle> {
        if let Some(handle) = self.main.get() {
            return Ok(*handle);
        }

        let mut guard = self.lock.acquire();
        let state = guard.get_mut().ok_or(Error::NestedExecution)?;

        let bindings = match std::mem::replace(
            state,
            InterpreterState::Disabled("initialization did not finish".to_string()),
        ) {
            InterpreterState::Uninitialized(bindings) => bindings,
            InterpreterState::Ready(interpreter) => {
                // Another thread won the race
                let handle = interpreter.handle();
                *state = InterpreterState::Ready(interpreter);
                return Ok(handle);
            }
            InterpreterState::Disabled(reason) => {
                *state = InterpreterState::Disabled(reason.clone());
                return Err(Error::Disabled(reason));
            }
        };

        let dirs = BaseDirs::new(machine_base_dir, user_base_dir);
        let search_path = paths::search_path(
            dirs.module_dirs(),
            paths::installed_search_path(),
            prefer_installed_runtime,
        );
        let options = StartOptions {
            search_path,
            argv: argv.to_vec(),
        };

        match Interpreter::start(*bindings, options) {
            Ok(interpreter) => {
                let handle = interpreter.handle();
                tracing::info!(
                    state = %handle,
                    search_path = ?interpreter.search_path(),
                    "script engine initialized"
                );
                *state = InterpreterState::Ready(interpreter);
                let _ = self.main.set(handle);
                Ok(handle)
            }
            Err(reason) => {
                tracing::error!(%reason, "script engine failed to initialize");
                *state = InterpreterState::Disabled(reason.clone());
                Err(Error::Initialization(reason))
            }
        }
        // Lock released here; the interpreter is now suspended
    }

    /// The canonical state requests resume, once initialized
    pub fn main_state(&self) -> Option<StateHandle> {
        self.main.get().copied()
    }

    pub fn is_initialized(&self) -> bool {
        self.main.get().is_some()
    }

    /// Block until the calling thread holds the execution lock
    pub fn lock(&self) -> EngineGuard<'_> {
        EngineGuard(self.lock.acquire())
    }
}

/// Execution lock held over the interpreter
pub struct EngineGuard<'a>(ExecutionGuard<'a, InterpreterState>);

impl EngineGuard<'_> {
    /// Make `owner` the active interpreter state for the guard's lifetime
    pub fn resume(&mut self, owner: StateHandle) -> Result<&mut Interpreter> {
        match self.0.get_mut() {
            None => Err(Error::NestedExecution),
            Some(InterpreterState::Uninitialized(_)) => Err(Error::NotInitialized),
            Some(InterpreterState::Disabled(reason)) => Err(Error::Disabled(reason.clone())),
            Some(InterpreterState::Ready(interpreter)) => {
                if interpreter.handle() == owner {
                    Ok(interpreter)
                } else {
                    Err(Error::StaleState(owner))
                }
            }
        }
    }
}
