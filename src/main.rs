use std::env;
use std::io::Write;
use std::sync::Arc;

use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use lark_script::config::{SharedSettings, Settings};
use lark_script::host::{Console, Menu};
use lark_script::paths::BaseDirs;
use lark_script::{Error, ExecutionRequest, ScriptPlugin};

/// Script output on stdout, diagnostics in red on stderr
struct TerminalConsole;

impl Console for TerminalConsole {
    fn write_text(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn write_error(&self, text: &str) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "{}", text.red());
        let _ = err.flush();
    }

    fn show(&self) {}
}

struct TerminalMenu;

impl Menu for TerminalMenu {
    fn set_stop_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "stop command");
    }
}

enum Command<'a> {
    Run(&'a str),
    Stop,
    Busy,
    Help,
    Quit,
    Statement(&'a str),
}

fn parse(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = match line.split_once(' ') {
        Some((":run", path)) => Command::Run(path.trim()),
        _ => match line {
            ":stop" => Command::Stop,
            ":busy" => Command::Busy,
            ":help" => Command::Help,
            ":quit" | ":q" => Command::Quit,
            _ => Command::Statement(line),
        },
    };
    Some(command)
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  :run <file>  queue a script file");
    println!("  :stop        interrupt the running script (also Ctrl-C)");
    println!("  :busy        show whether the worker is running");
    println!("  :quit        exit");
    println!("Anything else runs as a statement.");
}

#[tokio::main]
async fn main() -> lark_script::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let dirs = BaseDirs::for_current_user()
        .ok_or_else(|| Error::Initialization("could not locate the home directory".into()))?;
    let settings = Settings::load(&dirs.settings_file())?;
    tracing::info!(machine = %dirs.machine.display(), user = %dirs.user.display(), "script dirs");

    let plugin = ScriptPlugin::builder(dirs)
        .argv(env::args().collect())
        .settings(SharedSettings::new(settings))
        .console(Arc::new(TerminalConsole))
        .menu(Arc::new(TerminalMenu))
        .build();

    plugin.run_startup_scripts();
    if let Some(path) = env::args().nth(1) {
        plugin.submit(ExecutionRequest::file(path), true);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    None => {}
                    Some(Command::Quit) => break,
                    Some(Command::Help) => print_help(),
                    Some(Command::Stop) => {
                        plugin.request_stop();
                    }
                    Some(Command::Busy) => {
                        let state = if plugin.consumer_busy() { "busy" } else { "idle" };
                        println!("{state}");
                    }
                    Some(Command::Run(path)) => {
                        plugin.submit(ExecutionRequest::file(path), true);
                    }
                    Some(Command::Statement(source)) => {
                        if !plugin.submit(ExecutionRequest::statement(source), false) {
                            println!("{}", "worker busy; :stop or wait".yellow());
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if plugin.request_stop().is_none() {
                    break;
                }
            }
        }
    }

    // Stops any running script and joins the worker
    drop(plugin);
    Ok(())
}
