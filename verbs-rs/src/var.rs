//! Per-run variable environment.
//!
//! Every assignment is stored twice, under the bare name and under its
//! `$`-prefixed alias, so later lines can reference it either way.  A name
//! given with a leading `$` is normalised the same way.  The most
//! recent verb result is tracked separately and answers to `$RESULT`.

use std::collections::HashMap;

use crate::error::VerbError;
use crate::script::Value;

/// Name under which the last pipeline result is visible to scripts.
pub const RESULT_VAR: &str = "$RESULT";

/// Key/value store for one script run.
#[derive(Debug, Default)]
pub struct VariableEnvironment {
    vars: HashMap<String, Value>,
    last_result: Value,
}

/// `name` with a leading `$`, added only if absent.
fn dollar_alias(name: &str) -> String {
    if name.starts_with('$') {
        name.to_owned()
    } else {
        format!("${name}")
    }
}

impl VariableEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `raw_name` and its `$` alias; returns the value.
    ///
    /// Fails with [`VerbError::InvalidName`] when the trimmed name is empty.
    pub fn assign(&mut self, raw_name: &str, value: Value) -> Result<Value, VerbError> {
        let name = raw_name.trim();
        let bare = name.strip_prefix('$').unwrap_or(name);
        if bare.is_empty() {
            return Err(VerbError::InvalidName(raw_name.to_owned()));
        }
        self.vars.insert(dollar_alias(bare), value.clone());
        self.vars.insert(bare.to_owned(), value.clone());
        Ok(value)
    }

    /// Direct key lookup.  Misses yield [`Value::Undefined`].
    ///
    /// `$RESULT` always answers with the last result, even if a script
    /// assigned a variable named `RESULT`.
    pub fn resolve(&self, name: &str) -> Value {
        if name == RESULT_VAR {
            return self.last_result.clone();
        }
        self.vars.get(name).cloned().unwrap_or_default()
    }

    pub fn last_result(&self) -> &Value {
        &self.last_result
    }

    pub fn set_last_result(&mut self, value: Value) {
        self.last_result = value;
    }

    /// Remove a variable together with its `$` alias.  Returns `true` if
    /// either key existed.
    pub fn unset(&mut self, raw_name: &str) -> bool {
        let name = raw_name.trim();
        let bare = name.strip_prefix('$').unwrap_or(name);
        let had_alias = self.vars.remove(&dollar_alias(bare)).is_some();
        let had_bare = self.vars.remove(bare).is_some();
        had_alias || had_bare
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
