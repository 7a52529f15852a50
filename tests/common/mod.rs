#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lark_script::config::SharedSettings;
use lark_script::host::{Console, Menu};
use lark_script::paths::BaseDirs;
use lark_script::{PluginBuilder, RunOutcome, ScriptPlugin};
use rhai::{EvalAltResult, Module};
use tokio::sync::oneshot;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Console that keeps everything written to it
#[derive(Default)]
pub struct RecordingConsole {
    out: Mutex<String>,
    err: Mutex<String>,
    shown: AtomicUsize,
    changed: Condvar,
}

impl RecordingConsole {
    pub fn output(&self) -> String {
        self.out.lock().unwrap().clone()
    }

    pub fn errors(&self) -> String {
        self.err.lock().unwrap().clone()
    }

    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    /// Block until stdout output contains `needle`
    pub fn wait_for_output(&self, needle: &str) -> bool {
        let out = self.out.lock().unwrap();
        let (out, _) = self
            .changed
            .wait_timeout_while(out, TIMEOUT, |out| !out.contains(needle))
            .unwrap();
        out.contains(needle)
    }
}

impl Console for RecordingConsole {
    fn write_text(&self, text: &str) {
        self.out.lock().unwrap().push_str(text);
        self.changed.notify_all();
    }

    fn write_error(&self, text: &str) {
        self.err.lock().unwrap().push_str(text);
        self.changed.notify_all();
    }

    fn show(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingMenu(Mutex<Vec<bool>>);

impl RecordingMenu {
    pub fn states(&self) -> Vec<bool> {
        self.0.lock().unwrap().clone()
    }
}

impl Menu for RecordingMenu {
    fn set_stop_enabled(&self, enabled: bool) {
        self.0.lock().unwrap().push(enabled);
    }
}

/// Host-side controls scripts can poll through the `gate` module
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
    entered: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Gate {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` scripts have called `gate::enter()`
    pub fn wait_entered(&self, count: usize) {
        let start = Instant::now();
        while self.entered() < count {
            assert!(start.elapsed() < TIMEOUT, "script never entered the gate");
            thread::sleep(Duration::from_millis(2));
        }
    }

    /// `gate::is_open()`, `gate::enter()` and `gate::exit()`
    pub fn module(self: &Arc<Self>) -> Module {
        let mut module = Module::new();

        let gate = Arc::clone(self);
        module.set_native_fn("is_open", move || -> Result<bool, Box<EvalAltResult>> {
            Ok(gate.open.load(Ordering::SeqCst))
        });

        let gate = Arc::clone(self);
        module.set_native_fn("enter", move || -> Result<(), Box<EvalAltResult>> {
            gate.entered.fetch_add(1, Ordering::SeqCst);
            let active = gate.active.fetch_add(1, Ordering::SeqCst) + 1;
            gate.max_active.fetch_max(active, Ordering::SeqCst);
            Ok(())
        });

        let gate = Arc::clone(self);
        module.set_native_fn("exit", move || -> Result<(), Box<EvalAltResult>> {
            gate.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });

        module
    }
}

pub struct Harness {
    pub plugin: ScriptPlugin,
    pub console: Arc<RecordingConsole>,
    pub menu: Arc<RecordingMenu>,
    pub gate: Arc<Gate>,
    pub settings: SharedSettings,
}

pub type Parts = (
    PluginBuilder,
    Arc<RecordingConsole>,
    Arc<RecordingMenu>,
    Arc<Gate>,
    SharedSettings,
);

/// Builder wired to recording collaborators and the `gate` module
pub fn builder(dirs: BaseDirs) -> Parts {
    let console = Arc::new(RecordingConsole::default());
    let menu = Arc::new(RecordingMenu::default());
    let gate = Arc::new(Gate::default());
    let settings = SharedSettings::default();
    let builder = ScriptPlugin::builder(dirs)
        .argv(vec!["lark".to_string(), "--test".to_string()])
        .settings(settings.clone())
        .console(console.clone())
        .menu(menu.clone())
        .module("gate", gate.module());
    (builder, console, menu, gate, settings)
}

pub fn harness() -> Harness {
    let (builder, console, menu, gate, settings) =
        builder(BaseDirs::new("/nonexistent/machine", "/nonexistent/user"));
    Harness {
        plugin: builder.build(),
        console,
        menu,
        gate,
        settings,
    }
}

pub fn wait(rx: oneshot::Receiver<RunOutcome>) -> RunOutcome {
    rx.blocking_recv().expect("completion signal dropped")
}

pub fn wait_idle(plugin: &ScriptPlugin) {
    let start = Instant::now();
    while plugin.consumer_busy() {
        assert!(start.elapsed() < TIMEOUT, "worker never went idle");
        thread::sleep(Duration::from_millis(2));
    }
}
