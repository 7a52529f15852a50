use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const ADD_EXTRA_LINE_TO_OUTPUT: &str = "ADDEXTRALINETOOUTPUT";
pub const OPEN_CONSOLE_ON_ERROR: &str = "OPENCONSOLEONERROR";
pub const PREFER_INSTALLED_RUNTIME: &str = "PREFERINSTALLEDRUNTIME";
pub const MAX_OPERATIONS: &str = "MAXOPERATIONS";

/// Read-only key lookup consulted by the engine at run time
pub trait SettingsSource: Send + Sync {
    fn get_setting(&self, name: &str) -> Option<String>;

    /// `true` when the setting is present and set to `"1"`
    fn is_enabled(&self, name: &str) -> bool {
        self.get_setting(name).as_deref() == Some("1")
    }
}

/// Script engine settings, customizable from scripts or a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Output
    pub add_extra_line_to_output: bool,
    pub open_console_on_error: bool,

    // Interpreter
    pub prefer_installed_runtime: bool,
    pub max_operations: u64, // 0 = unlimited
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            add_extra_line_to_output: false,
            open_console_on_error: true,

            prefer_installed_runtime: false,
            max_operations: 0,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON file, falling back to defaults when missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let flag = |b: bool| if b { "1" } else { "0" }.to_string();
        match name {
            ADD_EXTRA_LINE_TO_OUTPUT => Some(flag(self.add_extra_line_to_output)),
            OPEN_CONSOLE_ON_ERROR => Some(flag(self.open_console_on_error)),
            PREFER_INSTALLED_RUNTIME => Some(flag(self.prefer_installed_runtime)),
            MAX_OPERATIONS => Some(self.max_operations.to_string()),
            _ => None,
        }
    }
}

/// Settings shared between the host, the engine and the `lark::config` module
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Arc<RwLock<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.0.read().unwrap_or_else(|poisoned| {
            tracing::warn!("settings lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Get the current settings (cloned)
    pub fn get(&self) -> Settings {
        self.read().clone()
    }

    /// Apply a change to the settings
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self.0.write().unwrap_or_else(|poisoned| {
            tracing::warn!("settings lock poisoned; recovering");
            poisoned.into_inner()
        });
        f(&mut settings);
    }
}

impl SettingsSource for SharedSettings {
    fn get_setting(&self, name: &str) -> Option<String> {
        self.read().lookup(name)
    }
}
