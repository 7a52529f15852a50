//! Script directories and path marshaling

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name probed in each `scripts` directory at startup
pub const STARTUP_SCRIPT: &str = "startup.rhai";

/// Environment variable holding the installed module search path
pub const SEARCH_PATH_ENV: &str = "LARK_SCRIPT_PATH";

/// The machine-wide and per-user script roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirs {
    pub machine: PathBuf,
    pub user: PathBuf,
}

impl BaseDirs {
    pub fn new(machine: impl Into<PathBuf>, user: impl Into<PathBuf>) -> Self {
        Self {
            machine: machine.into(),
            user: user.into(),
        }
    }

    /// `<exe dir>/lark-script` and `~/.config/lark/script`
    pub fn for_current_user() -> Option<Self> {
        let exe = std::env::current_exe().ok()?;
        let machine = exe.parent()?.join("lark-script");
        let user = dirs::home_dir()?.join(".config").join("lark").join("script");
        Some(Self { machine, user })
    }

    /// Library and script directories, in search order
    pub fn module_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.machine.join("lib"),
            self.user.join("lib"),
            self.machine.join("scripts"),
            self.user.join("scripts"),
        ]
    }

    /// Startup scripts, machine before user
    pub fn startup_scripts(&self) -> [PathBuf; 2] {
        [
            self.machine.join("scripts").join(STARTUP_SCRIPT),
            self.user.join("scripts").join(STARTUP_SCRIPT),
        ]
    }

    pub fn settings_file(&self) -> PathBuf {
        self.user.join("settings.json")
    }
}

/// The installed search path from the environment
pub fn installed_search_path() -> Vec<PathBuf> {
    std::env::var_os(SEARCH_PATH_ENV)
        .map(|value| std::env::split_paths(&value).collect())
        .unwrap_or_default()
}

/// Combine our module dirs with the installed path.
///
/// Ours go first unless the installed runtime is preferred.
pub fn search_path(
    ours: Vec<PathBuf>,
    installed: Vec<PathBuf>,
    prefer_installed: bool,
) -> Vec<PathBuf> {
    if prefer_installed {
        installed.into_iter().chain(ours).collect()
    } else {
        ours.into_iter().chain(installed).collect()
    }
}

/// Whether a path contains anything outside 7-bit ASCII
pub fn has_extended_chars(path: &Path) -> bool {
    !path.to_string_lossy().is_ascii()
}

/// Path to hand to the interpreter's file loader.
///
/// Paths with extended characters are resolved to their canonical form
/// first; the file must therefore exist.
pub fn interpreter_path(path: &Path) -> Result<PathBuf> {
    if !has_extended_chars(path) {
        return Ok(path.to_path_buf());
    }
    std::fs::canonicalize(path).map_err(|source| Error::PathResolution {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a script through [`interpreter_path`]
pub fn read_script(path: &Path) -> Result<(PathBuf, String)> {
    let resolved = interpreter_path(path)?;
    let content = std::fs::read_to_string(&resolved).map_err(|source| Error::ScriptRead {
        path: resolved.clone(),
        source,
    })?;
    Ok((resolved, content))
}
