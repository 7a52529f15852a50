//! Routes host notifications to the script-visible objects
//!
//! Events are tagged with their logical [`Source`] when the host builds them,
//! so routing never compares window handles.

use std::sync::Arc;

use super::{View, Views};
use crate::host::{HostWindow, NotificationSink};

/// Where a notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    PrimaryView,
    SecondaryView,
    /// The scripting console's own text surface
    Console,
    /// The host application itself
    Other,
}

/// Notification codes the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    BufferActivated,
    FileOpened,
    FileSaved,
    FileClosed,
    Modified,
    /// Anything else, forwarded untouched
    Other(u32),
}

/// A structured host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEvent {
    pub code: EventCode,
    pub source: Source,
}

impl HostEvent {
    pub fn new(code: EventCode, source: Source) -> Self {
        Self { code, source }
    }
}

/// Forwards host notifications and tracks which view is active
///
/// Only ever called on the host's UI thread. Never takes the execution lock.
pub struct NotificationBridge {
    window: Arc<dyn HostWindow>,
    editor: Arc<dyn NotificationSink>,
    host: Arc<dyn NotificationSink>,
    views: Views,
    current_view: View,
}

impl NotificationBridge {
    pub fn new(
        window: Arc<dyn HostWindow>,
        editor: Arc<dyn NotificationSink>,
        host: Arc<dyn NotificationSink>,
        views: Views,
    ) -> Self {
        let current_view = window.current_view();
        views.set_active(current_view);
        Self {
            window,
            editor,
            host,
            views,
            current_view,
        }
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn notify(&mut self, event: HostEvent) {
        match event.source {
            Source::PrimaryView | Source::SecondaryView => self.editor.notify(&event),
            // Console notifications would feed back into the console
            Source::Console => {}
            Source::Other => {
                if event.code == EventCode::BufferActivated {
                    let view = self.window.current_view();
                    if view != self.current_view {
                        tracing::debug!(from = %self.current_view, to = %view, "active view changed");
                        self.current_view = view;
                        self.views.set_active(view);
                    }
                }
                self.host.notify(&event);
            }
        }
    }
}
