//! Positional binding and the `eval` verb's three evaluation policies.
//!
//! Arguments bind by position to lowercase letters: the first argument is
//! `a`, the second `b`, and so on.  The `function` option picks the policy:
//!
//! | `function` | behaviour |
//! |------------|-----------|
//! | `true`     | always return a callable; its arguments append to the ones given now |
//! | `false`    | evaluate immediately, even with no arguments |
//! | absent     | evaluate if any arguments were given, otherwise return a callable |

use std::rc::Rc;

use tracing::warn;

use crate::error::VerbError;

use super::callable::Callable;
use super::expr::{Binding, CompiledExpression};
use super::value::Value;

const SYMBOLS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Map `args[i]` to the `i`-th lowercase letter.  Arguments past `z` are
/// dropped.
pub fn bind(args: &[Value]) -> Binding {
    if args.len() > SYMBOLS.len() {
        warn!(
            count = args.len(),
            "eval binds at most {} positional arguments; the rest are ignored",
            SYMBOLS.len()
        );
    }
    SYMBOLS
        .chars()
        .zip(args)
        .map(|(sym, v)| (sym.to_string(), v.clone()))
        .collect()
}

/// A compiled formula plus the arguments bound so far.
#[derive(Debug)]
pub struct DeferredExpression {
    compiled: Rc<CompiledExpression>,
    bound: Vec<Value>,
}

impl DeferredExpression {
    pub fn new(compiled: Rc<CompiledExpression>, bound: Vec<Value>) -> Self {
        DeferredExpression { compiled, bound }
    }

    pub fn source(&self) -> &str {
        self.compiled.source()
    }

    /// Evaluate with `args` appended to the bound arguments.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value, VerbError> {
        let mut all = self.bound.clone();
        all.extend(args);
        evaluate_compiled(&self.compiled, &all)
    }
}

fn evaluate_compiled(compiled: &CompiledExpression, args: &[Value]) -> Result<Value, VerbError> {
    compiled.evaluate(&bind(args)).map(Value::number)
}

/// Compile `text` and apply the evaluation policy selected by `function`.
pub fn evaluate(function: Option<bool>, text: &str, args: Vec<Value>) -> Result<Value, VerbError> {
    let compiled = Rc::new(CompiledExpression::compile(text)?);
    let defer = function.unwrap_or(args.is_empty());
    if defer {
        let deferred = DeferredExpression::new(compiled, args);
        Ok(Value::Callable(Callable::Deferred(Rc::new(deferred))))
    } else {
        evaluate_compiled(&compiled, &args)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
