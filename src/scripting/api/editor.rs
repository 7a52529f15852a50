//! lark::editor - The current editable buffer
//!
//! Always refers to the buffer of the active view; the binding moves when
//! the host reports a view change.
//!
//! Usage in Rhai:
//! ```rhai
//! if lark::editor::view() == "secondary" {
//!     lark::editor::append("\n// touched by script");
//! }
//! ```

use rhai::{Dynamic, EvalAltResult, INT, Module};

use crate::editor::Views;

pub fn create_module(views: Views) -> Module {
    let mut module = Module::new();

    // view() -> "primary" | "secondary"
    {
        let v = views.clone();
        module.set_native_fn("view", move || -> Result<String, Box<EvalAltResult>> {
            Ok(v.active().to_string())
        });
    }

    // text() -> String
    {
        let v = views.clone();
        module.set_native_fn("text", move || -> Result<String, Box<EvalAltResult>> {
            Ok(v.current().text())
        });
    }

    // set_text(text: &str)
    {
        let v = views.clone();
        module.set_native_fn("set_text", move |text: &str| -> Result<(), Box<EvalAltResult>> {
            v.current_mut().set_text(text);
            Ok(())
        });
    }

    // append(text: &str)
    {
        let v = views.clone();
        module.set_native_fn("append", move |text: &str| -> Result<(), Box<EvalAltResult>> {
            v.current_mut().append(text);
            Ok(())
        });
    }

    // line_count() -> INT
    {
        let v = views.clone();
        module.set_native_fn("line_count", move || -> Result<INT, Box<EvalAltResult>> {
            Ok(v.current().line_count() as INT)
        });
    }

    // line(idx: INT) -> String, or () when out of range
    module.set_native_fn("line", move |idx: INT| -> Result<Dynamic, Box<EvalAltResult>> {
        let line = usize::try_from(idx)
            .ok()
            .and_then(|idx| views.current().line(idx));
        Ok(line.map(Dynamic::from).unwrap_or(Dynamic::UNIT))
    });

    module
}
