//! Script failures as traceback-style text

use std::fmt;

use rhai::EvalAltResult;

use crate::error::Error;

/// How a run that did not complete ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Cancelled at the user's request
    Interrupted,
    /// The script raised an error, or could not be loaded
    Faulted,
}

/// A formatted account of a script failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: FailureKind,
    /// Short error class, e.g. `RuntimeError`
    pub error_type: &'static str,
    pub message: String,
    /// Script the failure came from
    pub source: String,
    /// Call frames, outermost first
    pub frames: Vec<String>,
}

impl Diagnostic {
    pub fn from_eval(err: &EvalAltResult, source: &str) -> Self {
        let mut frames = Vec::new();
        let mut leaf = err;
        loop {
            match leaf {
                EvalAltResult::ErrorInFunctionCall(name, src, inner, pos) => {
                    let src = if src.is_empty() { source } else { src.as_str() };
                    frames.push(match pos.line() {
                        Some(line) => format!("{src}, line {line}, in {name}"),
                        None => format!("{src}, in {name}"),
                    });
                    leaf = inner.as_ref();
                }
                EvalAltResult::ErrorInModule(name, inner, pos) => {
                    frames.push(match pos.line() {
                        Some(line) => format!("{source}, line {line}, in module '{name}'"),
                        None => format!("{source}, in module '{name}'"),
                    });
                    leaf = inner.as_ref();
                }
                _ => break,
            }
        }

        let interrupted = matches!(leaf, EvalAltResult::ErrorTerminated(..));
        Self {
            kind: if interrupted {
                FailureKind::Interrupted
            } else {
                FailureKind::Faulted
            },
            error_type: error_type(leaf),
            message: if interrupted {
                "script interrupted".to_string()
            } else {
                leaf.to_string()
            },
            source: source.to_string(),
            frames,
        }
    }

    /// A failure before the script got to run
    pub fn from_error(err: &Error, source: &str) -> Self {
        let error_type = match err {
            Error::PathResolution { .. } | Error::ScriptRead { .. } | Error::Io(_) => "IOError",
            _ => "EngineError",
        };
        Self {
            kind: FailureKind::Faulted,
            error_type,
            message: err.to_string(),
            source: source.to_string(),
            frames: Vec::new(),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.kind == FailureKind::Interrupted
    }
}

fn error_type(err: &EvalAltResult) -> &'static str {
    match err {
        EvalAltResult::ErrorParsing(..) => "SyntaxError",
        EvalAltResult::ErrorRuntime(..) => "RuntimeError",
        EvalAltResult::ErrorTerminated(..) => "Interrupted",
        EvalAltResult::ErrorFunctionNotFound(..) => "FunctionNotFound",
        EvalAltResult::ErrorVariableNotFound(..) => "NameError",
        EvalAltResult::ErrorModuleNotFound(..) => "ModuleNotFound",
        EvalAltResult::ErrorMismatchDataType(..) | EvalAltResult::ErrorMismatchOutputType(..) => {
            "TypeError"
        }
        EvalAltResult::ErrorArithmetic(..) => "ArithmeticError",
        EvalAltResult::ErrorArrayBounds(..) | EvalAltResult::ErrorIndexNotFound(..) => {
            "IndexError"
        }
        EvalAltResult::ErrorTooManyOperations(..) => "OperationLimit",
        _ => "ScriptError",
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback (most recent call last):")?;
        writeln!(f, "  {}", self.source)?;
        for frame in &self.frames {
            writeln!(f, "  {frame}")?;
        }
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::Engine;

    fn fail(script: &str) -> Diagnostic {
        let engine = Engine::new();
        let err = engine.run(script).unwrap_err();
        Diagnostic::from_eval(&err, "test.rhai")
    }

    #[test]
    fn thrown_value_is_runtime_error() {
        let d = fail(r#"throw "boom";"#);
        assert_eq!(d.kind, FailureKind::Faulted);
        assert_eq!(d.error_type, "RuntimeError");
        assert!(d.message.contains("boom"));
    }

    #[test]
    fn function_calls_become_frames() {
        let d = fail(
            r#"
            fn inner() { throw "deep"; }
            fn outer() { inner() }
            outer();
            "#,
        );
        assert_eq!(d.frames.len(), 2);
        assert!(d.frames[0].ends_with("in outer"));
        assert!(d.frames[1].ends_with("in inner"));
        assert!(d.message.contains("deep"));
    }

    #[test]
    fn display_ends_with_type_and_message() {
        let d = fail("let x = ;");
        assert_eq!(d.error_type, "SyntaxError");
        let text = d.to_string();
        assert!(text.starts_with("Traceback"));
        assert!(text.contains("test.rhai"));
        assert!(text.lines().last().unwrap().starts_with("SyntaxError: "));
    }

    #[test]
    fn unknown_variable_is_name_error() {
        assert_eq!(fail("print(nope);").error_type, "NameError");
    }
}
