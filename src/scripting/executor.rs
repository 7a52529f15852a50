//! Runs one request against the interpreter and reports how it ended

use std::sync::Arc;

use super::engine::ScriptEngine;
use super::interrupt::Interrupts;
use super::queue::Consumer;
use super::{Diagnostic, ExecutionRequest, RunOutcome};
use crate::config::{ADD_EXTRA_LINE_TO_OUTPUT, OPEN_CONSOLE_ON_ERROR, SettingsSource};
use crate::error::Error;
use crate::host::{Console, Menu};

pub struct Executor {
    engine: Arc<ScriptEngine>,
    interrupts: Arc<Interrupts>,
    console: Arc<dyn Console>,
    settings: Arc<dyn SettingsSource>,
    menu: Arc<dyn Menu>,
}

impl Executor {
    pub fn new(
        engine: Arc<ScriptEngine>,
        interrupts: Arc<Interrupts>,
        console: Arc<dyn Console>,
        settings: Arc<dyn SettingsSource>,
        menu: Arc<dyn Menu>,
    ) -> Self {
        Self {
            engine,
            interrupts,
            console,
            settings,
            menu,
        }
    }

    /// Run a request on the calling thread.
    ///
    /// Blocks on the execution lock. Script failures are reported to the
    /// console and returned, never raised. The completion signal fires last.
    pub fn execute(&self, request: ExecutionRequest) -> RunOutcome {
        let (target, owner, completion) = request.into_parts();
        let span = tracing::info_span!("script", %target);
        let _entered = span.enter();

        let outcome = {
            let mut guard = self.engine.lock();
            let resumed = match owner.or_else(|| self.engine.main_state()) {
                Some(owner) => guard.resume(owner),
                None => Err(Error::NotInitialized),
            };

            let outcome = match resumed {
                Ok(interpreter) => {
                    let _run = self.interrupts.begin();
                    tracing::debug!("running");
                    match interpreter.execute(&target) {
                        Ok(()) => RunOutcome::Completed,
                        Err(diagnostic) => RunOutcome::failed(diagnostic),
                    }
                }
                Err(err) => RunOutcome::Faulted(Diagnostic::from_error(&err, &target.to_string())),
            };
            drop(guard);
            outcome
        };

        match &outcome {
            RunOutcome::Completed => tracing::debug!("completed"),
            RunOutcome::Interrupted(_) => tracing::info!("interrupted"),
            RunOutcome::Faulted(d) => tracing::warn!(error_type = d.error_type, "faulted"),
        }
        if let Some(diagnostic) = outcome.diagnostic() {
            self.report(diagnostic);
        }

        if let Some(signal) = completion {
            // The waiter may have gone away
            let _ = signal.send(outcome.clone());
        }
        outcome
    }

    fn report(&self, diagnostic: &Diagnostic) {
        self.console.write_error(&format!("{diagnostic}\n"));

        if self.settings.is_enabled(ADD_EXTRA_LINE_TO_OUTPUT) {
            self.console.write_text("\n");
        }
        if self.settings.is_enabled(OPEN_CONSOLE_ON_ERROR) {
            self.console.show();
        }
    }
}

impl Consumer<ExecutionRequest> for Executor {
    fn consume(&self, request: ExecutionRequest) {
        self.execute(request);
    }

    fn queue_started(&self) {
        self.menu.set_stop_enabled(true);
    }

    fn queue_complete(&self) {
        tracing::debug!("script queue drained");
        self.menu.set_stop_enabled(false);
    }
}
