use std::fmt;
use std::path::PathBuf;

use tokio::sync::oneshot;

use super::{Diagnostic, StateHandle};

/// What a request runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A script file
    File(PathBuf),
    /// Literal source text
    Statement(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::File(path) => write!(f, "{}", path.display()),
            Target::Statement(_) => write!(f, "<statement>"),
        }
    }
}

/// How a request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Interrupted(Diagnostic),
    Faulted(Diagnostic),
}

impl RunOutcome {
    pub fn failed(diagnostic: Diagnostic) -> Self {
        if diagnostic.is_interrupted() {
            RunOutcome::Interrupted(diagnostic)
        } else {
            RunOutcome::Faulted(diagnostic)
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::Interrupted(d) | RunOutcome::Faulted(d) => Some(d),
        }
    }
}

/// Fired once a request has run and its errors have been reported
pub type CompletionSignal = oneshot::Sender<RunOutcome>;

/// A one-shot completion signal and the receiver to wait on
pub fn completion_channel() -> (CompletionSignal, oneshot::Receiver<RunOutcome>) {
    oneshot::channel()
}

/// A unit of work for the interpreter, consumed exactly once
#[derive(Debug)]
pub struct ExecutionRequest {
    target: Target,
    owner: Option<StateHandle>,
    synchronous: bool,
    completion: Option<CompletionSignal>,
}

impl ExecutionRequest {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            owner: None,
            synchronous: false,
            completion: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Target::File(path.into()))
    }

    pub fn statement(source: impl Into<String>) -> Self {
        Self::new(Target::Statement(source.into()))
    }

    /// Run inline on the submitting thread
    pub fn synchronous(mut self) -> Self {
        self.synchronous = true;
        self
    }

    pub fn with_completion(mut self, signal: CompletionSignal) -> Self {
        self.completion = Some(signal);
        self
    }

    /// Resume `owner` instead of the interpreter's main state
    pub fn with_owner(mut self, owner: StateHandle) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    pub fn owner(&self) -> Option<StateHandle> {
        self.owner
    }

    pub(crate) fn into_parts(self) -> (Target, Option<StateHandle>, Option<CompletionSignal>) {
        (self.target, self.owner, self.completion)
    }
}
