//! lark::console - Script console output
//!
//! `print` and `debug` already go to the console; these are for explicit
//! error output and raising the console window.

use std::sync::Arc;

use rhai::{EvalAltResult, Module};

use crate::host::Console;

pub fn create_module(console: Arc<dyn Console>) -> Module {
    let mut module = Module::new();

    {
        let c = Arc::clone(&console);
        module.set_native_fn("write", move |text: &str| -> Result<(), Box<EvalAltResult>> {
            c.write_text(text);
            Ok(())
        });
    }

    {
        let c = Arc::clone(&console);
        module.set_native_fn("error", move |text: &str| -> Result<(), Box<EvalAltResult>> {
            c.write_error(text);
            Ok(())
        });
    }

    module.set_native_fn("show", move || -> Result<(), Box<EvalAltResult>> {
        console.show();
        Ok(())
    });

    module
}
