use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Buffer;

/// One of the host's two editing views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Primary,
    Secondary,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Primary => write!(f, "primary"),
            View::Secondary => write!(f, "secondary"),
        }
    }
}

/// The buffers behind both views plus the script-visible "current buffer"
/// binding
#[derive(Debug, Clone, Default)]
pub struct Views {
    primary: Arc<RwLock<Buffer>>,
    secondary: Arc<RwLock<Buffer>>,
    active: Arc<RwLock<View>>,
}

impl Views {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> View {
        self.active.read().map(|v| *v).unwrap_or_default()
    }

    /// Redirect the current-buffer binding to another view
    pub fn set_active(&self, view: View) {
        if let Ok(mut active) = self.active.write() {
            *active = view;
        }
    }

    fn slot(&self, view: View) -> &RwLock<Buffer> {
        match view {
            View::Primary => &self.primary,
            View::Secondary => &self.secondary,
        }
    }

    pub fn read(&self, view: View) -> RwLockReadGuard<'_, Buffer> {
        self.slot(view)
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self, view: View) -> RwLockWriteGuard<'_, Buffer> {
        self.slot(view)
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Buffer of the active view
    pub fn current(&self) -> RwLockReadGuard<'_, Buffer> {
        self.read(self.active())
    }

    pub fn current_mut(&self) -> RwLockWriteGuard<'_, Buffer> {
        self.write(self.active())
    }
}
