//! The embedded Rhai interpreter state

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::{AST, Array, Dynamic, Engine, Module, Scope};

use super::api;
use super::interrupt::Interrupts;
use super::{Diagnostic, Target};
use crate::config::SharedSettings;
use crate::editor::Views;
use crate::host::Console;
use crate::paths;

/// Value carried by the termination error of an interrupted run
const INTERRUPT_TOKEN: &str = "interrupted";

static NEXT_STATE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle naming an interpreter execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(u64);

impl StateHandle {
    fn next() -> Self {
        Self(NEXT_STATE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

/// Everything the interpreter exposes to scripts, wired in at startup
pub struct Bindings {
    pub console: Arc<dyn Console>,
    pub settings: SharedSettings,
    pub views: Views,
    pub interrupts: Arc<Interrupts>,
    /// Extra host modules, registered as `name::*`
    pub modules: Vec<(String, Module)>,
    /// Evaluated once right after startup
    pub bootstrap: Option<String>,
}

/// Startup configuration for [`Interpreter::start`]
pub struct StartOptions {
    pub search_path: Vec<PathBuf>,
    pub argv: Vec<String>,
}

/// A running interpreter: engine, global scope and accumulated functions
pub struct Interpreter {
    engine: Engine,
    scope: Scope<'static>,
    functions: AST,
    search_path: Vec<PathBuf>,
    handle: StateHandle,
}

impl Interpreter {
    pub fn start(bindings: Bindings, options: StartOptions) -> Result<Self, String> {
        let Bindings {
            console,
            settings,
            views,
            interrupts,
            modules,
            bootstrap,
        } = bindings;
        let StartOptions { search_path, argv } = options;

        let mut engine = Engine::new();

        // Safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(settings.get().max_operations);

        // Cancellation checkpoint, polled on every operation
        engine.on_progress(move |_ops| {
            interrupts
                .checkpoint()
                .then(|| Dynamic::from(INTERRUPT_TOKEN.to_string()))
        });

        {
            let c = Arc::clone(&console);
            engine.on_print(move |text| c.write_text(&format!("{text}\n")));
        }
        {
            let c = Arc::clone(&console);
            engine.on_debug(move |text, source, pos| {
                let text = match (source, pos.line()) {
                    (Some(source), Some(line)) => format!("{source}:{line} | {text}\n"),
                    (None, Some(line)) => format!("{line} | {text}\n"),
                    _ => format!("{text}\n"),
                };
                c.write_text(&text);
            });
        }

        // Module search path
        let mut resolvers = ModuleResolversCollection::new();
        for dir in &search_path {
            resolvers.push(FileModuleResolver::new_with_path(dir.clone()));
        }
        engine.set_module_resolver(resolvers);

        // The `lark` namespace
        let mut lark_module = Module::new();
        lark_module.set_sub_module("config", api::config::create_module(settings));
        lark_module.set_sub_module("console", api::console::create_module(console));
        lark_module.set_sub_module("editor", api::editor::create_module(views));
        engine.register_static_module("lark", lark_module.into());

        for (name, module) in modules {
            engine.register_static_module(name, module.into());
        }

        let mut scope = Scope::new();
        let argv: Array = argv.into_iter().map(Dynamic::from).collect();
        scope.push_constant("ARGV", argv);
        let search: Array = search_path
            .iter()
            .map(|p| Dynamic::from(p.display().to_string()))
            .collect();
        scope.push_constant("SEARCH_PATH", search);

        let mut interpreter = Self {
            engine,
            scope,
            functions: AST::default(),
            search_path,
            handle: StateHandle::next(),
        };

        if let Some(source) = bootstrap {
            interpreter
                .run_source("<bootstrap>", &source)
                .map_err(|d| d.to_string())?;
        }

        Ok(interpreter)
    }

    pub fn handle(&self) -> StateHandle {
        self.handle
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Run a request target in the global scope
    pub fn execute(&mut self, target: &Target) -> Result<(), Diagnostic> {
        match target {
            Target::Statement(source) => self.run_source("<statement>", source),
            Target::File(path) => {
                let (resolved, source) = paths::read_script(path)
                    .map_err(|err| Diagnostic::from_error(&err, &path.display().to_string()))?;
                self.run_source(&resolved.display().to_string(), &source)
            }
        }
    }

    fn run_source(&mut self, name: &str, source: &str) -> Result<(), Diagnostic> {
        let mut ast = self
            .engine
            .compile_with_scope(&self.scope, source)
            .map_err(|err| Diagnostic::from_eval(&err.into(), name))?;
        ast.set_source(name);

        // Functions stay defined for later requests, even if this one fails
        self.functions = self.functions.merge(&ast.clone_functions_only());
        let mut program = self.functions.merge(&ast);
        program.set_source(name);

        self.engine
            .run_ast_with_scope(&mut self.scope, &program)
            .map_err(|err| Diagnostic::from_eval(&err, name))
    }
}
