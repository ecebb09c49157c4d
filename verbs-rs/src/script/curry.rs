//! Arity-aware invocation of library functions.
//!
//! The host always passes whatever tokens appear on a script line, so a
//! library function of arity *N* may be called with any number of
//! arguments.  [`apply`] runs the function once its first *N* slots are
//! filled and otherwise returns a [`PartialApplication`] holding what was
//! supplied.  A partial application repeats the same rule against the
//! combined argument list each time it is invoked, to any depth.
//!
//! [`Value::Placeholder`] marks a slot to bind later: when a partial
//! application is invoked, new arguments fill placeholder slots left to
//! right before being appended.

use std::rc::Rc;

use tracing::trace;

use crate::error::VerbError;

use super::callable::Callable;
use super::value::Value;

/// Effective arity of variadic functions for currying purposes.
pub const VARIADIC_ARITY: usize = 2;

/// Declared arity of a library function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments; extras are ignored.
    Fixed(usize),
    /// Unbounded (`min`, `max`): curries as arity 2, but a saturated call
    /// reduces over every supplied argument.
    Variadic,
}

impl Arity {
    pub fn effective(self) -> usize {
        match self {
            Arity::Fixed(n) => n,
            Arity::Variadic => VARIADIC_ARITY,
        }
    }
}

/// Signature of every library function body.  The slice holds exactly the
/// arity's worth of arguments (or all of them, for variadic functions) and
/// contains no placeholders.
pub type NativeFn = fn(&[Value]) -> Result<Value, VerbError>;

/// A named library function and its declared arity.
#[derive(Debug)]
pub struct LibFn {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

/// Outcome of applying a function to an argument list.
#[derive(Debug)]
pub enum Curried {
    Result(Value),
    Partial(PartialApplication),
}

impl Curried {
    /// Collapse into a script value; partials become [`Callable::Partial`].
    pub fn into_value(self) -> Value {
        match self {
            Curried::Result(v) => v,
            Curried::Partial(p) => Value::Callable(Callable::Partial(Rc::new(p))),
        }
    }
}

/// A library function with a bound argument prefix (possibly containing
/// placeholders).
#[derive(Debug, Clone)]
pub struct PartialApplication {
    func: &'static LibFn,
    bound: Vec<Value>,
}

impl PartialApplication {
    /// A partial application with nothing bound yet.
    pub fn new(func: &'static LibFn) -> Self {
        PartialApplication {
            func,
            bound: Vec::new(),
        }
    }

    pub fn func(&self) -> &'static LibFn {
        self.func
    }

    pub fn bound(&self) -> &[Value] {
        &self.bound
    }

    /// Number of slots still needed before the function runs.
    pub fn remaining(&self) -> usize {
        let needed = self.func.arity.effective();
        let filled = self
            .bound
            .iter()
            .take(needed)
            .filter(|v| !matches!(v, Value::Placeholder))
            .count();
        needed - filled
    }

    /// Invoke with more arguments.  `self` is left untouched.
    pub fn apply(&self, args: Vec<Value>) -> Result<Curried, VerbError> {
        apply(self.func, merge_args(&self.bound, args))
    }
}

/// Apply `func` to `args`, or capture them in a partial application.
pub fn apply(func: &'static LibFn, args: Vec<Value>) -> Result<Curried, VerbError> {
    let ready = match func.arity {
        Arity::Fixed(n) => fills(&args, n),
        Arity::Variadic => {
            args.len() >= VARIADIC_ARITY && !args.iter().any(|v| matches!(v, Value::Placeholder))
        }
    };
    if !ready {
        trace!(function = func.name, bound = args.len(), "partial application");
        return Ok(Curried::Partial(PartialApplication { func, bound: args }));
    }
    let used = match func.arity {
        Arity::Fixed(n) => &args[..n],
        Arity::Variadic => &args[..],
    };
    (func.func)(used).map(Curried::Result)
}

/// `true` if the first `n` slots of `args` exist and none is a placeholder.
pub(crate) fn fills(args: &[Value], n: usize) -> bool {
    args.len() >= n && !args[..n].iter().any(|v| matches!(v, Value::Placeholder))
}

/// Combine a bound prefix with newly supplied arguments: new arguments fill
/// placeholder slots first, then append.
pub(crate) fn merge_args(bound: &[Value], args: Vec<Value>) -> Vec<Value> {
    let mut incoming = args.into_iter();
    let mut merged: Vec<Value> = bound
        .iter()
        .map(|v| match v {
            Value::Placeholder => incoming.next().unwrap_or(Value::Placeholder),
            other => other.clone(),
        })
        .collect();
    merged.extend(incoming);
    merged
}

// ── Tests ─────────────────────────────────────────────────────────────────────
