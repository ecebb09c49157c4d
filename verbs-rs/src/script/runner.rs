//! Line-oriented host harness.
//!
//! The [`Runner`] plays the part of the host interpreter: it splits each
//! line into `|`-separated stages, resolves the words of each stage into a
//! verb name, options and positional values, and calls the verb.  After
//! every stage the result is stored as `$RESULT`.
//!
//! ```text
//! ; comments start with ';' or '#'
//! power 2 10 | as big
//! eval --function "a * b" 3 | as triple
//! $triple 7 | echo $RESULT
//! ```

use thiserror::Error;
use tracing::{debug, trace};

use crate::context::ExecutionContext;
use crate::error::VerbError;

use super::value::Value;
use super::verbs::{call_verb, Options};

/// A verb error together with the script line it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    pub line: usize,
    pub source: VerbError,
}

// ── Word splitting ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Word {
    text: String,
    /// Any part of the word was quoted; quoted words are never interpreted.
    quoted: bool,
}

impl Word {
    fn is(&self, s: &str) -> bool {
        !self.quoted && self.text == s
    }
}

/// Split a line on whitespace.
///
/// Double or single quotes group words (backslash escapes the next
/// character inside them).  A word starting with `[` or `{` runs until its
/// bracket closes so JSON literals may contain spaces.  An unterminated
/// quote or bracket extends to the end of the line.
fn split_words(line: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut in_json_str = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        if depth > 0 {
            cur.push(ch);
            if in_json_str {
                match ch {
                    '\\' => cur.extend(chars.next()),
                    '"' => in_json_str = false,
                    _ => {}
                }
            } else {
                match ch {
                    '"' => in_json_str = true,
                    '[' | '{' => depth += 1,
                    ']' | '}' => depth -= 1,
                    _ => {}
                }
            }
            continue;
        }
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), '\\') => cur.extend(chars.next()),
            (Some(_), c) => cur.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                quoted = true;
            }
            (None, '[' | '{') if cur.is_empty() => {
                depth = 1;
                cur.push(ch);
            }
            (None, c) if c.is_whitespace() => {
                if !cur.is_empty() || quoted {
                    words.push(Word { text: std::mem::take(&mut cur), quoted });
                    quoted = false;
                }
            }
            (None, c) => cur.push(c),
        }
    }
    if !cur.is_empty() || quoted {
        words.push(Word { text: cur, quoted });
    }
    words
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Executes scripts against one [`ExecutionContext`].
#[derive(Debug, Default)]
pub struct Runner {
    ctx: ExecutionContext,
}

impl Runner {
    pub fn new(ctx: ExecutionContext) -> Self {
        Runner { ctx }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    pub fn into_context(self) -> ExecutionContext {
        self.ctx
    }

    /// Run every line of `script`, stopping at the first error.
    ///
    /// Returns the final `$RESULT`.
    pub async fn exec_script(&mut self, script: &str) -> Result<Value, ScriptError> {
        for (idx, raw) in script.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            self.exec_line(line)
                .await
                .map_err(|source| ScriptError { line: idx + 1, source })?;
        }
        Ok(self.ctx.last_result().clone())
    }

    /// Run one pipeline.  Returns the value of its last stage.
    pub async fn exec_line(&mut self, line: &str) -> Result<Value, VerbError> {
        let words = split_words(line);
        for stage in words.split(|w| w.is("|")) {
            let Some((verb, rest)) = stage.split_first() else {
                continue;
            };
            let result = self.exec_stage(verb, rest).await?;
            self.ctx.set_last_result(result);
        }
        Ok(self.ctx.last_result().clone())
    }

    async fn exec_stage(&mut self, verb: &Word, rest: &[Word]) -> Result<Value, VerbError> {
        let mut options = Options::new();
        let mut args = Vec::with_capacity(rest.len() + 1);

        // `$f x y` invokes the callable stored in `$f`.
        let name = if !verb.quoted && verb.text.len() > 1 && verb.text.starts_with('$') {
            args.push(self.ctx.vars().resolve(&verb.text));
            "call"
        } else {
            verb.text.as_str()
        };

        for word in rest {
            if let Some(opt) = word.text.strip_prefix("--").filter(|o| !word.quoted && !o.is_empty()) {
                let (key, value) = match opt.split_once('=') {
                    Some((k, v)) => (k, Value::parse_literal(v)),
                    None => (opt, Value::Bool(true)),
                };
                options.set(key, value);
            } else {
                args.push(self.resolve_word(word));
            }
        }
        trace!(verb = name, ?args, "stage");
        let result = call_verb(&mut self.ctx, name, &options, args).await?;
        debug!(verb = name, %result, "stage result");
        Ok(result)
    }

    fn resolve_word(&self, word: &Word) -> Value {
        if word.quoted {
            Value::Str(word.text.clone())
        } else if word.text.len() > 1 && word.text.starts_with('$') {
            self.ctx.vars().resolve(&word.text)
        } else {
            Value::parse_literal(&word.text)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        split_words(line).into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn split_plain_and_quoted() {
        assert_eq!(texts("as  x   5"), vec!["as", "x", "5"]);
        assert_eq!(texts(r#"echo "hello world" 'a b'"#), vec!["echo", "hello world", "a b"]);
        assert_eq!(texts(r#"echo "say \"hi\"""#), vec!["echo", r#"say "hi""#]);
        assert_eq!(texts(r#"echo """#), vec!["echo", ""]);
    }

    #[test]
    fn split_keeps_json_together() {
        assert_eq!(
            texts(r#"prop a {"a": [1, 2], "b": "x } y"}"#),
            vec!["prop", "a", r#"{"a": [1, 2], "b": "x } y"}"#]
        );
        assert_eq!(texts("sum [1, 2, 3] extra"), vec!["sum", "[1, 2, 3]", "extra"]);
    }

    #[test]
    fn quoted_pipe_is_not_a_separator() {
        let words = split_words(r#"echo "|" | echo"#);
        assert!(!words[1].is("|"));
        assert!(words[2].is("|"));
    }

    #[tokio::test]
    async fn result_flows_between_stages_and_lines() {
        let mut r = Runner::default();
        let v = r.exec_script("power 2 10\nas big\nadd $big 1 | as bigger").await.unwrap();
        assert_eq!(v, Value::Int(1025));
        assert_eq!(r.context().vars().resolve("$big"), Value::Int(1024));
    }

    #[tokio::test]
    async fn comments_and_blank_lines_are_skipped() {
        let mut r = Runner::default();
        let v = r.exec_script("; comment\n\n# another\nadd 1 2\n").await.unwrap();
        assert_eq!(v, Value::Int(3));
    }

    #[tokio::test]
    async fn options_and_callable_variables() {
        let mut r = Runner::default();
        r.exec_script(r#"eval --function "a * b" 3 | as triple"#).await.unwrap();
        assert_eq!(r.exec_line("$triple 7").await.unwrap(), Value::Int(21));
        let v = r.exec_line(r#"eval --function=false "9 + 4""#).await.unwrap();
        assert_eq!(v, Value::Int(13));
    }

    #[tokio::test]
    async fn quoted_words_are_not_substituted() {
        let mut r = Runner::default();
        r.exec_line("as x 5").await.unwrap();
        assert_eq!(r.exec_line(r#"echo "$x" $x"#).await.unwrap(), Value::Str("$x 5".into()));
        assert_eq!(r.exec_line(r#"echo "--function""#).await.unwrap(), Value::Str("--function".into()));
    }

    #[tokio::test]
    async fn get_and_unset_take_bare_or_quoted_names() {
        let mut r = Runner::default();
        r.exec_line("as k 3").await.unwrap();
        assert_eq!(r.exec_line("get k").await.unwrap(), Value::Int(3));
        assert_eq!(r.exec_line(r#"get "$k""#).await.unwrap(), Value::Int(3));
        // Unquoted, `$k` is replaced by 3 and `get` looks up a variable named "3".
        assert_eq!(r.exec_line("get $k").await.unwrap(), Value::Undefined);

        r.exec_line(r#"unset "$k""#).await.unwrap();
        assert_eq!(r.exec_line("get k").await.unwrap(), Value::Undefined);
    }

    #[tokio::test]
    async fn placeholder_word() {
        let mut r = Runner::default();
        r.exec_line("subtract __ 3 | as minus3").await.unwrap();
        assert_eq!(r.exec_line("$minus3 10").await.unwrap(), Value::Int(7));
    }

    #[tokio::test]
    async fn error_reports_line_number() {
        let mut r = Runner::default();
        let err = r.exec_script("add 1 2\n\nfrobnicate\nadd 3 4").await.unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.source, VerbError::UnknownVerb("frobnicate".into()));
        assert_eq!(err.to_string(), "line 3: unknown verb 'frobnicate'");
        assert_eq!(r.context().last_result(), &Value::Int(3));
    }
}
