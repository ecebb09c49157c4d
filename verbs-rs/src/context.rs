//! Per-run state handed to every verb.

use crate::delay::DelayMode;
use crate::script::Value;
use crate::var::VariableEnvironment;

/// Everything a verb may read or write during one script run.
///
/// Created once per run by the host and passed by `&mut` into each verb
/// call; there is no process-wide variable table.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    vars: VariableEnvironment,
    delay_mode: DelayMode,
    /// Lines produced by `echo`, drained by the host.
    pub output: Vec<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay_mode(delay_mode: DelayMode) -> Self {
        ExecutionContext {
            delay_mode,
            ..Self::default()
        }
    }

    pub fn vars(&self) -> &VariableEnvironment {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableEnvironment {
        &mut self.vars
    }

    /// `$RESULT`: the value returned by the previous verb.
    pub fn last_result(&self) -> &Value {
        self.vars.last_result()
    }

    pub fn set_last_result(&mut self, value: Value) {
        self.vars.set_last_result(value);
    }

    pub fn delay_mode(&self) -> DelayMode {
        self.delay_mode
    }

    pub fn set_delay_mode(&mut self, mode: DelayMode) {
        self.delay_mode = mode;
    }

    /// Drain and return the `echo` output buffer.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}
