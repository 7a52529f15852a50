//! The script plugin: what the host application talks to
//!
//! Owns the engine, the request queue and its worker, the cancellation
//! registry and the notification bridge. All methods are meant to be called
//! from the host's UI thread, though submission is safe from any thread.

use std::sync::Arc;
use std::thread::JoinHandle;

use rhai::Module;

use crate::config::SharedSettings;
use crate::editor::{HostEvent, NotificationBridge, Views};
use crate::error::{Error, Result};
use crate::host::{
    Console, HostWindow, IgnoreNotifications, LogConsole, Menu, NoMenu, NotificationSink,
    SingleView,
};
use crate::paths::BaseDirs;
use crate::scripting::{
    Bindings, Consumer, ExecutionRequest, Executor, Interrupts, RunOutcome, ScriptEngine,
    StateHandle, WorkQueue,
};

const WORKER_THREAD: &str = "lark-script-worker";

/// Builder for [`ScriptPlugin`]
pub struct PluginBuilder {
    dirs: BaseDirs,
    argv: Vec<String>,
    settings: SharedSettings,
    console: Arc<dyn Console>,
    menu: Arc<dyn Menu>,
    window: Arc<dyn HostWindow>,
    editor_sink: Arc<dyn NotificationSink>,
    host_sink: Arc<dyn NotificationSink>,
    views: Views,
    modules: Vec<(String, Module)>,
    bootstrap: Option<String>,
}

impl PluginBuilder {
    pub fn new(dirs: BaseDirs) -> Self {
        Self {
            dirs,
            argv: std::env::args().collect(),
            settings: SharedSettings::default(),
            console: Arc::new(LogConsole),
            menu: Arc::new(NoMenu),
            window: Arc::new(SingleView),
            editor_sink: Arc::new(IgnoreNotifications),
            host_sink: Arc::new(IgnoreNotifications),
            views: Views::new(),
            modules: Vec::new(),
            bootstrap: None,
        }
    }

    /// Command line exposed to scripts as `ARGV`
    pub fn argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    pub fn settings(mut self, settings: SharedSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn menu(mut self, menu: Arc<dyn Menu>) -> Self {
        self.menu = menu;
        self
    }

    pub fn window(mut self, window: Arc<dyn HostWindow>) -> Self {
        self.window = window;
        self
    }

    /// Receives notifications from the editing views
    pub fn editor_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.editor_sink = sink;
        self
    }

    /// Receives all other host notifications
    pub fn host_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.host_sink = sink;
        self
    }

    pub fn views(mut self, views: Views) -> Self {
        self.views = views;
        self
    }

    /// Register an extra module, visible to scripts as `name::*`
    pub fn module(mut self, name: impl Into<String>, module: Module) -> Self {
        self.modules.push((name.into(), module));
        self
    }

    /// Source evaluated once at initialization
    pub fn bootstrap(mut self, source: impl Into<String>) -> Self {
        self.bootstrap = Some(source.into());
        self
    }

    pub fn build(self) -> ScriptPlugin {
        let interrupts = Arc::new(Interrupts::new());
        let engine = Arc::new(ScriptEngine::new(Bindings {
            console: Arc::clone(&self.console),
            settings: self.settings.clone(),
            views: self.views.clone(),
            interrupts: Arc::clone(&interrupts),
            modules: self.modules,
            bootstrap: self.bootstrap,
        }));
        let executor = Arc::new(Executor::new(
            Arc::clone(&engine),
            Arc::clone(&interrupts),
            Arc::clone(&self.console),
            Arc::new(self.settings.clone()),
            self.menu,
        ));
        let consumer: Arc<dyn Consumer<ExecutionRequest>> = executor.clone();
        let queue = WorkQueue::new(WORKER_THREAD, consumer);
        let bridge = NotificationBridge::new(
            self.window,
            self.editor_sink,
            self.host_sink,
            self.views.clone(),
        );

        ScriptPlugin {
            dirs: self.dirs,
            argv: self.argv,
            settings: self.settings,
            console: self.console,
            views: self.views,
            engine,
            executor,
            interrupts,
            queue,
            bridge,
        }
    }
}

pub struct ScriptPlugin {
    dirs: BaseDirs,
    argv: Vec<String>,
    settings: SharedSettings,
    console: Arc<dyn Console>,
    views: Views,
    engine: Arc<ScriptEngine>,
    executor: Arc<Executor>,
    interrupts: Arc<Interrupts>,
    queue: WorkQueue<ExecutionRequest>,
    bridge: NotificationBridge,
}

impl ScriptPlugin {
    pub fn builder(dirs: BaseDirs) -> PluginBuilder {
        PluginBuilder::new(dirs)
    }

    pub fn dirs(&self) -> &BaseDirs {
        &self.dirs
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// The buffers scripts edit through `lark::editor`
    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Start the interpreter if it is not running yet.
    ///
    /// An initialization failure is written to the console once and leaves
    /// scripting disabled; it is never raised into the host.
    pub fn initialize(&self) -> Result<StateHandle> {
        let prefer_installed = self.settings.get().prefer_installed_runtime;
        let result = self.engine.initialize(
            &self.dirs.machine,
            &self.dirs.user,
            prefer_installed,
            &self.argv,
        );
        if let Err(Error::Initialization(reason)) = &result {
            self.console
                .write_error(&format!("Scripting is unavailable: {reason}\n"));
        }
        result
    }

    fn prepare(&self, request: ExecutionRequest) -> Option<ExecutionRequest> {
        match self.initialize() {
            Ok(main) if request.owner().is_none() => Some(request.with_owner(main)),
            Ok(_) => Some(request),
            Err(err) => {
                tracing::warn!(%err, target = %request.target(), "script not run");
                None
            }
        }
    }

    /// Queue a request for the worker thread. Never blocks.
    ///
    /// Returns `false` when the worker is busy and `allow_queuing` is off,
    /// or when scripting is unavailable.
    pub fn submit(&self, request: ExecutionRequest, allow_queuing: bool) -> bool {
        let Some(request) = self.prepare(request) else {
            return false;
        };
        let accepted = self.queue.produce(request, allow_queuing);
        if !accepted {
            tracing::debug!("script rejected: worker busy");
        }
        accepted
    }

    /// Run a request inline on the calling thread, bypassing the queue.
    ///
    /// Waits for the execution lock if the worker is mid-request. Returns
    /// after the request and its error reporting have finished.
    pub fn run_synchronously(&self, request: ExecutionRequest) -> Option<RunOutcome> {
        let request = self.prepare(request)?;
        Some(self.executor.execute(request))
    }

    /// Dispatch on the request's own synchronous flag.
    ///
    /// Without `allow_queuing`, a busy worker refuses synchronous requests
    /// too rather than blocking the caller behind it.
    pub fn run_script(&self, request: ExecutionRequest, allow_queuing: bool) -> bool {
        if !allow_queuing && self.consumer_busy() {
            tracing::debug!(target = %request.target(), "script rejected: worker busy");
            return false;
        }
        if request.is_synchronous() {
            self.run_synchronously(request).is_some()
        } else {
            self.submit(request, allow_queuing)
        }
    }

    /// Run the machine then the user startup script, where present
    pub fn run_startup_scripts(&self) {
        for path in self.dirs.startup_scripts() {
            if path.is_file() {
                tracing::info!(path = %path.display(), "running startup script");
                self.run_synchronously(ExecutionRequest::file(path).synchronous());
            }
        }
    }

    pub fn consumer_busy(&self) -> bool {
        self.queue.consumer_busy()
    }

    /// Interrupt the running script at its next checkpoint.
    ///
    /// Returns the helper thread delivering the interrupt, or `None` when
    /// nothing is running.
    pub fn request_stop(&self) -> Option<JoinHandle<bool>> {
        match self.interrupts.request_stop() {
            Ok(helper) => helper,
            Err(err) => {
                tracing::error!(%err, "could not request stop");
                None
            }
        }
    }

    /// Feed a host notification through to the script objects
    pub fn notify(&mut self, event: HostEvent) {
        self.bridge.notify(event);
    }
}

impl Drop for ScriptPlugin {
    fn drop(&mut self) {
        // Close first so nothing queued can start after the interrupt
        self.queue.close();
        self.interrupts.close();
        self.queue.join();
        // Wait out any synchronous run still holding the lock
        let _guard = self.engine.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EventCode, Source, View};
    use std::sync::Mutex;

    struct Window(Mutex<View>);

    impl HostWindow for Window {
        fn current_view(&self) -> View {
            *self.0.lock().unwrap()
        }
    }

    fn plugin() -> ScriptPlugin {
        ScriptPlugin::builder(BaseDirs::new("/nonexistent/machine", "/nonexistent/user"))
            .argv(vec!["lark".to_string()])
            .build()
    }

    #[test]
    fn requests_get_main_state() {
        let plugin = plugin();
        let outcome = plugin.run_synchronously(ExecutionRequest::statement("let a = 1;"));
        assert_eq!(outcome, Some(RunOutcome::Completed));
        assert!(plugin.engine.is_initialized());
    }

    #[test]
    fn stop_while_idle_spawns_nothing() {
        let plugin = plugin();
        plugin.initialize().unwrap();
        assert!(plugin.request_stop().is_none());
        assert!(!plugin.consumer_busy());
    }

    #[test]
    fn view_switch_reaches_scripts() {
        let window = Arc::new(Window(Mutex::new(View::Primary)));
        let mut plugin = ScriptPlugin::builder(BaseDirs::new("/m", "/u"))
            .window(window.clone())
            .build();
        plugin.views().write(View::Secondary).set_text("other");

        *window.0.lock().unwrap() = View::Secondary;
        plugin.notify(HostEvent::new(EventCode::BufferActivated, Source::Other));

        let outcome = plugin.run_synchronously(ExecutionRequest::statement(
            r#"if lark::editor::text() != "other" { throw "wrong buffer"; }"#,
        ));
        assert_eq!(outcome, Some(RunOutcome::Completed));
    }
}
