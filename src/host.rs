//! Interfaces the embedding application provides to the script engine
//!
//! Every collaborator has a headless default so the engine can run without
//! a UI attached (tests, the terminal host).

use crate::editor::{HostEvent, View};

/// Output sink for script output and diagnostics
pub trait Console: Send + Sync {
    fn write_text(&self, text: &str);
    fn write_error(&self, text: &str);
    /// Bring the console to the front
    fn show(&self);
}

/// The host's "stop script" menu command
pub trait Menu: Send + Sync {
    fn set_stop_enabled(&self, enabled: bool);
}

/// Queries answered by the host's main window
pub trait HostWindow: Send + Sync {
    fn current_view(&self) -> View;
}

/// A script-visible object that receives forwarded host notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &HostEvent);
}

/// Console that writes through `tracing`
#[derive(Debug, Default)]
pub struct LogConsole;

impl Console for LogConsole {
    fn write_text(&self, text: &str) {
        tracing::info!(target: "lark_script::console", "{}", text.trim_end());
    }

    fn write_error(&self, text: &str) {
        tracing::error!(target: "lark_script::console", "{}", text.trim_end());
    }

    fn show(&self) {}
}

/// Menu with no stop command
#[derive(Debug, Default)]
pub struct NoMenu;

impl Menu for NoMenu {
    fn set_stop_enabled(&self, enabled: bool) {
        tracing::trace!(enabled, "stop command toggled");
    }
}

/// Window with a single, primary view
#[derive(Debug, Default)]
pub struct SingleView;

impl HostWindow for SingleView {
    fn current_view(&self) -> View {
        View::Primary
    }
}

/// Sink that drops every notification
#[derive(Debug, Default)]
pub struct IgnoreNotifications;

impl NotificationSink for IgnoreNotifications {
    fn notify(&self, event: &HostEvent) {
        tracing::trace!(?event, "notification dropped");
    }
}
