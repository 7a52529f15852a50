//! Error types for the script engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::scripting::StateHandle;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside of script evaluation itself.
///
/// Failures raised *by* a script are not errors of this type; they are
/// captured as a [`Diagnostic`](crate::scripting::Diagnostic) on the request
/// that produced them.
#[derive(Debug, Error)]
pub enum Error {
    /// The interpreter could not be brought up.
    #[error("script engine failed to initialize: {0}")]
    Initialization(String),

    /// A previous initialization failed; scripting stays off.
    #[error("scripting is disabled: {0}")]
    Disabled(String),

    /// A request was executed before the interpreter was initialized.
    #[error("script engine is not initialized")]
    NotInitialized,

    /// A request carried a state handle the interpreter does not own.
    #[error("interpreter state {0} is not the active main state")]
    StaleState(StateHandle),

    /// The calling thread already holds the execution lock.
    #[error("execution lock is already held by this thread")]
    NestedExecution,

    /// A script path could not be turned into one the interpreter accepts.
    #[error("cannot resolve path {}: {source}", path.display())]
    PathResolution {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A script file could not be read.
    #[error("cannot open script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A helper or worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed or written.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}
