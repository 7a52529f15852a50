//! Scripting module - the embedded Rhai interpreter and its execution model
//!
//! Scripts see the editor under the `lark` namespace:
//! - `lark::config::*` - engine settings
//! - `lark::console::*` - console output
//! - `lark::editor::*` - the current editable buffer
//!
//! Requests run one at a time: either inline on the caller's thread or on a
//! single persistent worker thread fed by a FIFO queue. Every interpreter
//! call happens under the execution lock.

mod api;
mod diagnostic;
mod engine;
mod executor;
mod interpreter;
mod interrupt;
mod lock;
mod queue;
mod request;

pub use diagnostic::{Diagnostic, FailureKind};
pub use engine::{EngineGuard, ScriptEngine};
pub use executor::Executor;
pub use interpreter::{Bindings, Interpreter, StartOptions, StateHandle};
pub use interrupt::{Interrupts, RunTarget, RunTicket};
pub use lock::{ExecutionGuard, ExecutionLock};
pub use queue::{Consumer, WorkQueue};
pub use request::{
    CompletionSignal, ExecutionRequest, RunOutcome, Target, completion_channel,
};
