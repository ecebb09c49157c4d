//! Function values a verb may hand back to the script.

use std::fmt;
use std::rc::Rc;

use crate::delay::PendingWait;
use crate::error::VerbError;

use super::curry::PartialApplication;
use super::deferred::DeferredExpression;
use super::value::Value;

/// A value that can be invoked with further arguments.
///
/// All variants are immutable snapshots: invoking one produces a new value
/// and never changes the callable itself.
#[derive(Debug, Clone)]
pub enum Callable {
    /// A library function with a bound prefix of arguments.
    Partial(Rc<PartialApplication>),
    /// A compiled formula awaiting (more) positional arguments.
    Deferred(Rc<DeferredExpression>),
    /// A `wait` that has not received enough arguments yet.
    Wait(Rc<PendingWait>),
}

impl Callable {
    /// Invoke synchronously.
    ///
    /// A non-blocking [`Callable::Wait`] needs the scheduler and fails with
    /// [`VerbError::NeedsScheduler`]; the `call` verb resumes it instead.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, VerbError> {
        match self {
            Callable::Partial(p) => p.apply(args).map(|c| c.into_value()),
            Callable::Deferred(d) => d.invoke(args),
            Callable::Wait(w) => w.call_blocking(args),
        }
    }
}

/// Identity comparison: two callables are equal only if they are the same
/// snapshot.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Partial(a), Callable::Partial(b)) => Rc::ptr_eq(a, b),
            (Callable::Deferred(a), Callable::Deferred(b)) => Rc::ptr_eq(a, b),
            (Callable::Wait(a), Callable::Wait(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Partial(p) => write!(f, "<function {}/{}>", p.func().name, p.remaining()),
            Callable::Deferred(d) => write!(f, "<expression {:?}>", d.source()),
            Callable::Wait(_) => write!(f, "<function wait>"),
        }
    }
}
