//! Embedded Rhai scripting for the lark editor
//!
//! [`ScriptPlugin`] is the entry point: it starts the interpreter on first
//! use, runs scripts inline or on a background worker, delivers stop
//! requests to the running script, and forwards host notifications to the
//! script-visible editor objects.

pub mod config;
pub mod editor;
pub mod error;
pub mod host;
pub mod paths;
pub mod plugin;
pub mod scripting;

pub use error::{Error, Result};
pub use plugin::{PluginBuilder, ScriptPlugin};
pub use scripting::{
    Diagnostic, ExecutionRequest, FailureKind, RunOutcome, Target, completion_channel,
};
