//! Verb dispatch.
//!
//! Every verb has the same shape: `(context, options, args) -> Value`.  A
//! handful of core verbs touch the context directly; every other name is
//! looked up in the function library and forwarded through the curry
//! adapter.

use std::collections::BTreeMap;

use tracing::debug;

use crate::context::ExecutionContext;
use crate::delay;
use crate::error::VerbError;

use super::builtins;
use super::callable::Callable;
use super::curry::{self, Curried};
use super::deferred;
use super::value::Value;

/// Named options passed alongside the positional arguments
/// (`--function=false` in script text).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_owned(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `function` option: `Some(true)` forces a callable, `Some(false)`
    /// forces evaluation, `None` leaves the choice to the argument count.
    pub fn function(&self) -> Option<bool> {
        match self.get("function")? {
            Value::Bool(b) => Some(*b),
            v if v.is_nil() => None,
            v => Some(v.as_bool()),
        }
    }
}

/// Invoke verb `name`.
///
/// Only structural problems are errors; lookups that find nothing produce
/// [`Value::Undefined`].
pub async fn call_verb(
    ctx: &mut ExecutionContext,
    name: &str,
    options: &Options,
    args: Vec<Value>,
) -> Result<Value, VerbError> {
    debug!(verb = name, args = args.len(), "call");
    match name {
        "as" | "assign" => assign(ctx, args),
        "get" => Ok(get(ctx, &args)),
        "unset" => Ok(unset(ctx, &args)),
        "wait" | "sleep" => Ok(delay::wait(ctx, args).await),
        "eval" | "evaluate" => eval(options, args),
        "call" | "invoke" => invoke(ctx, args).await,
        "lib" => lib(args),
        "getElement" => Ok(get_element(&args)),
        "echo" => Ok(echo(ctx, &args)),
        other => match builtins::lookup(other) {
            Some(f) => curry::apply(f, args).map(Curried::into_value),
            None => Err(VerbError::UnknownVerb(other.to_owned())),
        },
    }
}

/// Split off the first argument.
fn split_first(args: Vec<Value>) -> (Option<Value>, Vec<Value>) {
    let mut it = args.into_iter();
    let first = it.next();
    (first, it.collect())
}

/// `as name [value]`: value defaults to `$RESULT`.
fn assign(ctx: &mut ExecutionContext, args: Vec<Value>) -> Result<Value, VerbError> {
    let (name, rest) = split_first(args);
    let name = match name {
        Some(Value::Str(s)) => s,
        Some(other) if !other.is_nil() => other.to_string(),
        _ => return Err(VerbError::InvalidName(String::new())),
    };
    let value = match rest.into_iter().next() {
        Some(v) => v,
        None => ctx.last_result().clone(),
    };
    ctx.vars_mut().assign(&name, value)
}

/// `get name`.  In script text the name is written bare (`get k`) or quoted
/// (`get "$k"`); an unquoted `$k` is substituted before the verb runs.
fn get(ctx: &ExecutionContext, args: &[Value]) -> Value {
    match args.first() {
        Some(name) => ctx.vars().resolve(name.to_string().trim()),
        None => Value::Undefined,
    }
}

/// Removes each named variable; the pipeline value passes through.  Names
/// follow the same bare-or-quoted rule as `get`.
fn unset(ctx: &mut ExecutionContext, args: &[Value]) -> Value {
    for name in args {
        let name = name.to_string();
        if !ctx.vars_mut().unset(&name) {
            debug!(name, "unset: no such variable");
        }
    }
    ctx.last_result().clone()
}

fn eval(options: &Options, args: Vec<Value>) -> Result<Value, VerbError> {
    let (text, rest) = split_first(args);
    let text = match text {
        Some(Value::Str(s)) => s,
        Some(other) if !other.is_nil() => other.to_string(),
        _ => return Err(VerbError::invalid_argument("eval", "missing expression")),
    };
    deferred::evaluate(options.function(), &text, rest)
}

/// `call f args…`.  A pending wait is resumed on the scheduler; other
/// callables are invoked synchronously.  Anything else, strings included,
/// is `NotCallable`: use `lib` to call a function by name.
async fn invoke(ctx: &mut ExecutionContext, args: Vec<Value>) -> Result<Value, VerbError> {
    let (target, rest) = split_first(args);
    match target.unwrap_or_default() {
        Value::Callable(Callable::Wait(w)) => Ok(w.resume(ctx, rest).await),
        Value::Callable(c) => c.call(rest),
        other => Err(VerbError::NotCallable {
            type_name: other.type_name(),
        }),
    }
}

/// `lib name args…`: resolve a library function by name at call time.
fn lib(args: Vec<Value>) -> Result<Value, VerbError> {
    let (name, rest) = split_first(args);
    let name = name.map(|v| v.to_string()).unwrap_or_default();
    let func = builtins::lookup(&name).ok_or(VerbError::UnknownFunction(name))?;
    curry::apply(func, rest).map(Curried::into_value)
}

fn get_element(args: &[Value]) -> Value {
    match args.split_first() {
        Some((root, keys)) => builtins::get_in(root, keys),
        None => Value::Undefined,
    }
}

fn echo(ctx: &mut ExecutionContext, args: &[Value]) -> Value {
    let text = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    ctx.output.push(text.clone());
    Value::Str(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::delay::DelayMode;

    async fn verb(ctx: &mut ExecutionContext, name: &str, args: Vec<Value>) -> Result<Value, VerbError> {
        call_verb(ctx, name, &Options::new(), args).await
    }

    fn ints(ns: &[i64]) -> Vec<Value> {
        ns.iter().copied().map(Value::Int).collect()
    }

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    fn callable(v: Value) -> Callable {
        match v {
            Value::Callable(c) => c,
            other => panic!("expected a callable, got {other}"),
        }
    }

    #[tokio::test]
    async fn as_stores_both_keys_and_returns_value() {
        let mut ctx = ExecutionContext::new();
        let v = verb(&mut ctx, "as", vec![s(" total "), Value::Int(8)]).await.unwrap();
        assert_eq!(v, Value::Int(8));
        assert_eq!(ctx.vars().resolve("total"), Value::Int(8));
        assert_eq!(ctx.vars().resolve("$total"), Value::Int(8));
    }

    #[tokio::test]
    async fn as_defaults_to_last_result() {
        let mut ctx = ExecutionContext::new();
        ctx.set_last_result(s("carried"));
        verb(&mut ctx, "assign", vec![s("x")]).await.unwrap();
        assert_eq!(ctx.vars().resolve("$x"), s("carried"));
    }

    #[tokio::test]
    async fn as_rejects_empty_name() {
        let mut ctx = ExecutionContext::new();
        assert!(matches!(
            verb(&mut ctx, "as", vec![s("  "), Value::Int(1)]).await,
            Err(VerbError::InvalidName(_))
        ));
        assert!(matches!(verb(&mut ctx, "as", vec![]).await, Err(VerbError::InvalidName(_))));
    }

    #[tokio::test]
    async fn get_and_unset() {
        let mut ctx = ExecutionContext::new();
        verb(&mut ctx, "as", vec![s("k"), Value::Int(3)]).await.unwrap();
        assert_eq!(verb(&mut ctx, "get", vec![s("$k")]).await.unwrap(), Value::Int(3));
        ctx.set_last_result(Value::Int(11));
        assert_eq!(verb(&mut ctx, "unset", vec![s("k")]).await.unwrap(), Value::Int(11));
        assert_eq!(verb(&mut ctx, "get", vec![s("k")]).await.unwrap(), Value::Undefined);
    }

    #[tokio::test]
    async fn curried_power() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(verb(&mut ctx, "power", ints(&[2, 3])).await.unwrap(), Value::Int(8));

        let f = verb(&mut ctx, "power", ints(&[2])).await.unwrap();
        assert_eq!(callable(f).call(ints(&[3])).unwrap(), Value::Int(8));

        let g = verb(&mut ctx, "power", vec![]).await.unwrap();
        assert_eq!(callable(g).call(ints(&[2, 3])).unwrap(), Value::Int(8));
    }

    #[tokio::test]
    async fn variadic_min() {
        let mut ctx = ExecutionContext::new();
        let f = verb(&mut ctx, "min", ints(&[9])).await.unwrap();
        assert_eq!(callable(f).call(ints(&[3])).unwrap(), Value::Int(3));
        assert_eq!(verb(&mut ctx, "min", ints(&[7, 1])).await.unwrap(), Value::Int(1));
    }

    #[tokio::test]
    async fn placeholder_binding() {
        let mut ctx = ExecutionContext::new();
        let f = verb(&mut ctx, "subtract", vec![Value::Placeholder, Value::Int(3)]).await.unwrap();
        assert_eq!(verb(&mut ctx, "call", vec![f, Value::Int(10)]).await.unwrap(), Value::Int(7));
    }

    #[tokio::test]
    async fn get_element_traverses_nested_maps() {
        let mut ctx = ExecutionContext::new();
        let obj = Value::parse_literal(r#"{"a": 1, "b": 2, "c": {"d": 5}}"#);
        let hit = verb(&mut ctx, "getElement", vec![obj.clone(), s("c"), s("d")]).await;
        assert_eq!(hit.unwrap(), Value::Int(5));
        let miss = verb(&mut ctx, "getElement", vec![obj, s("c"), s("f")]).await;
        assert_eq!(miss.unwrap(), Value::Undefined);
    }

    #[tokio::test]
    async fn eval_policies() {
        let mut ctx = ExecutionContext::new();
        let sum = verb(&mut ctx, "eval", vec![s("a + b"), Value::Int(5), Value::Int(4)]).await;
        assert_eq!(sum.unwrap(), Value::Int(9));

        let forced = Options::new().with("function", Value::Bool(true));
        let f = call_verb(&mut ctx, "eval", &forced, vec![s("a + b"), Value::Int(5)]).await.unwrap();
        assert_eq!(callable(f).call(ints(&[4])).unwrap(), Value::Int(9));

        let immediate = Options::new().with("function", Value::Bool(false));
        let v = call_verb(&mut ctx, "evaluate", &immediate, vec![s("9 + 4")]).await.unwrap();
        assert_eq!(v, Value::Int(13));
    }

    #[tokio::test]
    async fn eval_without_expression_is_an_error() {
        let mut ctx = ExecutionContext::new();
        assert!(matches!(
            verb(&mut ctx, "eval", vec![]).await,
            Err(VerbError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn calling_a_resolved_value_fails() {
        let mut ctx = ExecutionContext::new();
        let eight = verb(&mut ctx, "power", ints(&[2, 3])).await.unwrap();
        assert_eq!(
            verb(&mut ctx, "call", vec![eight, Value::Int(1)]).await,
            Err(VerbError::NotCallable { type_name: "integer" })
        );
    }

    #[tokio::test]
    async fn calling_a_string_fails_even_if_it_names_a_function() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            verb(&mut ctx, "call", vec![s("add"), Value::Int(1), Value::Int(2)]).await,
            Err(VerbError::NotCallable { type_name: "string" })
        );
        assert_eq!(
            verb(&mut ctx, "call", vec![s("nope"), Value::Int(1)]).await,
            Err(VerbError::NotCallable { type_name: "string" })
        );
    }

    #[tokio::test]
    async fn lib_dispatches_by_name() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(verb(&mut ctx, "lib", vec![s("add"), Value::Int(2), Value::Int(5)]).await.unwrap(), Value::Int(7));
        assert_eq!(
            verb(&mut ctx, "lib", vec![s("nosuch")]).await,
            Err(VerbError::UnknownFunction("nosuch".into()))
        );
    }

    #[tokio::test]
    async fn unknown_verb() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(
            verb(&mut ctx, "frobnicate", vec![]).await,
            Err(VerbError::UnknownVerb("frobnicate".into()))
        );
    }

    #[tokio::test]
    async fn echo_buffers_output() {
        let mut ctx = ExecutionContext::new();
        let v = verb(&mut ctx, "echo", vec![s("x ="), Value::Int(3)]).await.unwrap();
        assert_eq!(v, s("x = 3"));
        assert_eq!(ctx.take_output(), vec!["x = 3".to_owned()]);
        assert!(ctx.output.is_empty());
    }

    #[tokio::test]
    async fn wait_resolves_with_result_after_period() {
        let mut ctx = ExecutionContext::new();
        ctx.set_last_result(s("kept"));
        let start = Instant::now();
        let v = verb(&mut ctx, "wait", vec![Value::Float(0.03)]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(v, s("kept"));
    }

    #[tokio::test]
    async fn pending_wait_is_resumed_by_call() {
        let mut ctx = ExecutionContext::new();
        let w = verb(&mut ctx, "sleep", vec![]).await.unwrap();
        let v = verb(&mut ctx, "call", vec![w, Value::Int(0), s("late")]).await.unwrap();
        assert_eq!(v, s("late"));
    }

    #[tokio::test]
    async fn blocking_wait_with_one_argument_yields_callable() {
        let mut ctx = ExecutionContext::with_delay_mode(DelayMode::Blocking);
        let w = verb(&mut ctx, "wait", vec![Value::Int(0)]).await.unwrap();
        assert!(matches!(w, Value::Callable(Callable::Wait(_))));
        let v = verb(&mut ctx, "call", vec![w, s("answer")]).await.unwrap();
        assert_eq!(v, s("answer"));
    }

    #[test]
    fn function_option() {
        assert_eq!(Options::new().function(), None);
        assert_eq!(Options::new().with("function", Value::Bool(false)).function(), Some(false));
        assert_eq!(Options::new().with("function", Value::Null).function(), None);
        assert_eq!(Options::new().with("function", s("yes")).function(), Some(true));
    }
}
