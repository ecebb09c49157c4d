//! Error types shared by every verb.
//!
//! Only structural failures are errors.  Data-shape misses (absent key,
//! out-of-range index, unset variable) are modelled as [`Value::Undefined`]
//! and never reach this type.
//!
//! [`Value::Undefined`]: crate::script::Value::Undefined

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerbError {
    /// Assignment to an empty (or whitespace-only) variable name.
    #[error("invalid variable name {0:?}")]
    InvalidName(String),

    /// A fully-resolved value was invoked as if it were still a function.
    #[error("a value of type {type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("syntax error in expression {expression:?}: {message}")]
    ExpressionSyntax { expression: String, message: String },

    #[error("undefined symbol '{0}' in expression")]
    UndefinedSymbol(String),

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("unknown library function '{0}'")]
    UnknownFunction(String),

    #[error("{verb}: {message}")]
    InvalidArgument { verb: String, message: String },

    /// A non-blocking wait was invoked where no scheduler is available
    /// (e.g. as the callback of `map`).
    #[error("non-blocking wait cannot run inside a synchronous call; invoke it with `call`")]
    NeedsScheduler,
}

impl VerbError {
    pub fn invalid_argument(verb: impl Into<String>, message: impl Into<String>) -> Self {
        VerbError::InvalidArgument {
            verb: verb.into(),
            message: message.into(),
        }
    }
}
