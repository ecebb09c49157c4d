//! The `wait` verb: pause a pipeline for a number of seconds.
//!
//! Two modes exist and they are not interchangeable:
//!
//! - [`DelayMode::NonBlocking`] (default) sleeps on the tokio timer.  Only the
//!   current pipeline is suspended; other tasks on the runtime keep running.
//!   `wait(period)` resolves with `$RESULT`, `wait(period, response)` with
//!   `response`.
//! - [`DelayMode::Blocking`] spins the current thread until the period has
//!   elapsed.  **Nothing else on the runtime makes progress while it spins**,
//!   including timers and I/O unrelated to this script.  It is opt-in via the
//!   `blocking_wait` setting.  `wait(period)` returns a callable awaiting the
//!   response; `wait(period, response)` stalls, then returns `response`.
//!
//! Both modes curry like library functions: too few arguments yield a
//! callable that accepts the rest, and placeholders defer a slot.

use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::error::VerbError;
use crate::script::curry::{fills, merge_args};
use crate::script::{Callable, Value};

/// How `wait` suspends the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    #[default]
    NonBlocking,
    Blocking,
}

impl DelayMode {
    /// Arguments needed before the wait starts.
    fn arity(self) -> usize {
        match self {
            DelayMode::NonBlocking => 1,
            DelayMode::Blocking => 2,
        }
    }
}

/// A `wait` still missing arguments.  The mode is fixed at creation.
#[derive(Debug, Clone)]
pub struct PendingWait {
    mode: DelayMode,
    bound: Vec<Value>,
}

enum WaitPlan {
    Pending(PendingWait),
    Sleep {
        period: Duration,
        response: Option<Value>,
    },
}

fn plan(mode: DelayMode, args: Vec<Value>) -> WaitPlan {
    if !fills(&args, mode.arity()) {
        return WaitPlan::Pending(PendingWait { mode, bound: args });
    }
    let mut args = args.into_iter();
    let period = args.next().map(|v| period_from(&v)).unwrap_or_default();
    WaitPlan::Sleep {
        period,
        response: args.next(),
    }
}

/// Seconds → `Duration`.  Negative or non-numeric periods clamp to zero.
fn period_from(v: &Value) -> Duration {
    let secs = v.as_float();
    if secs.is_nan() || secs < 0.0 {
        warn!(period = %v, "wait period is not a non-negative number; not waiting");
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Stall the current thread without yielding.
pub fn busy_wait(period: Duration) {
    warn!(?period, "blocking wait: the whole runtime is stalled until it completes");
    let deadline = Instant::now().checked_add(period);
    loop {
        match deadline {
            Some(d) if Instant::now() >= d => break,
            _ => std::hint::spin_loop(),
        }
    }
}

async fn run(ctx: &ExecutionContext, mode: DelayMode, args: Vec<Value>) -> Value {
    match plan(mode, args) {
        WaitPlan::Pending(p) => Value::Callable(Callable::Wait(Rc::new(p))),
        WaitPlan::Sleep { period, response } => {
            debug!(?period, ?mode, "wait");
            match mode {
                DelayMode::NonBlocking => tokio::time::sleep(period).await,
                DelayMode::Blocking => busy_wait(period),
            }
            response.unwrap_or_else(|| ctx.last_result().clone())
        }
    }
}

/// The `wait` verb, in the context's configured mode.
pub async fn wait(ctx: &ExecutionContext, args: Vec<Value>) -> Value {
    run(ctx, ctx.delay_mode(), args).await
}

impl PendingWait {
    pub fn mode(&self) -> DelayMode {
        self.mode
    }

    /// Supply more arguments, suspending on the scheduler if the wait starts.
    pub async fn resume(&self, ctx: &ExecutionContext, args: Vec<Value>) -> Value {
        run(ctx, self.mode, merge_args(&self.bound, args)).await
    }

    /// Supply more arguments without a scheduler.
    ///
    /// Only a blocking wait can complete this way; a non-blocking one that
    /// would start sleeping fails with [`VerbError::NeedsScheduler`].
    pub fn call_blocking(&self, args: Vec<Value>) -> Result<Value, VerbError> {
        match plan(self.mode, merge_args(&self.bound, args)) {
            WaitPlan::Pending(p) => Ok(Value::Callable(Callable::Wait(Rc::new(p)))),
            WaitPlan::Sleep { .. } if self.mode == DelayMode::NonBlocking => {
                Err(VerbError::NeedsScheduler)
            }
            WaitPlan::Sleep { period, response } => {
                busy_wait(period);
                Ok(response.unwrap_or_default())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
