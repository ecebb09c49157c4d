//! Script values and verbs.
//!
//! - [`value`]: the dynamic [`Value`] type
//! - [`curry`]: arity-aware application and partial application
//! - [`builtins`]: the function library registry
//! - [`expr`] and [`deferred`]: compiled formulas and the `eval` policies
//! - [`verbs`]: verb dispatch
//! - [`runner`]: the line-oriented harness that drives verbs from text

pub mod builtins;
pub mod callable;
pub mod curry;
pub mod deferred;
pub mod expr;
pub mod runner;
pub mod value;
pub mod verbs;

pub use callable::Callable;
pub use expr::CompiledExpression;
pub use runner::{Runner, ScriptError};
pub use value::Value;
pub use verbs::{call_verb, Options};
