//! Verb runtime for line-oriented scripts.
//!
//! Scripts call verbs by name with positional arguments.  The crate provides
//! the machinery every verb shares: a per-run variable environment with
//! `$RESULT` propagation, a currying adapter over a function library,
//! a `wait` primitive with explicit blocking and non-blocking modes, and a
//! deferred math-expression evaluator.
//!
//! ```rust
//! use verbs::script::Runner;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mut runner = Runner::default();
//! runner.exec_script("power 2 10 | as big\neval \"a + 1\" $big | echo $RESULT").await.unwrap();
//! assert_eq!(runner.context_mut().take_output(), vec!["1025"]);
//! # });
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod delay;
pub mod error;
pub mod script;
pub mod var;

pub use context::ExecutionContext;
pub use error::VerbError;
