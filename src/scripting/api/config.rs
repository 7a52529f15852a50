//! lark::config - Engine settings
//!
//! Usage in Rhai:
//! ```rhai
//! lark::config::set_open_console_on_error(false);
//! lark::config::set_add_extra_line_to_output(true);
//! let limit = lark::config::get_setting("MAXOPERATIONS");
//! ```

use rhai::plugin::*;

use crate::config::{SettingsSource, SharedSettings};

/// Create the config module with access to settings
pub fn create_module(settings: SharedSettings) -> rhai::Module {
    let mut module = rhai::Module::new();

    // set_add_extra_line_to_output(enabled: bool)
    {
        let s = settings.clone();
        module.set_native_fn(
            "set_add_extra_line_to_output",
            move |enabled: bool| -> Result<(), Box<EvalAltResult>> {
                s.update(|settings| settings.add_extra_line_to_output = enabled);
                Ok(())
            },
        );
    }

    // get_add_extra_line_to_output() -> bool
    {
        let s = settings.clone();
        module.set_native_fn(
            "get_add_extra_line_to_output",
            move || -> Result<bool, Box<EvalAltResult>> { Ok(s.get().add_extra_line_to_output) },
        );
    }

    // set_open_console_on_error(enabled: bool)
    {
        let s = settings.clone();
        module.set_native_fn(
            "set_open_console_on_error",
            move |enabled: bool| -> Result<(), Box<EvalAltResult>> {
                s.update(|settings| settings.open_console_on_error = enabled);
                Ok(())
            },
        );
    }

    // get_open_console_on_error() -> bool
    {
        let s = settings.clone();
        module.set_native_fn(
            "get_open_console_on_error",
            move || -> Result<bool, Box<EvalAltResult>> { Ok(s.get().open_console_on_error) },
        );
    }

    // get_setting(name: &str) -> String, "" when unknown
    {
        let s = settings;
        module.set_native_fn(
            "get_setting",
            move |name: &str| -> Result<String, Box<EvalAltResult>> {
                Ok(s.get_setting(name).unwrap_or_default())
            },
        );
    }

    module
}
