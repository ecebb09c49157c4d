//! The function library: an explicit name → function registry.
//!
//! Every entry is a plain function over already-resolved arguments.  The
//! verb layer never calls these directly; it routes arguments through
//! [`curry::apply`](super::curry::apply) so each function can be partially
//! applied.  Argument order puts the data last (`nth(index, list)`,
//! `prop(key, map)`), which is what makes partial application useful.
//!
//! Arithmetic is permissive: non-numeric operands produce NaN and division
//! by zero produces an infinity.  Only structural misuse (mapping over a
//! number, an invalid regex) is an error.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VerbError;

use super::callable::Callable;
use super::curry::Arity::{Fixed, Variadic};
use super::curry::{LibFn, PartialApplication};
use super::value::Value;

/// Upper bound on the length of a list built by `range`.
const MAX_RANGE_LEN: i64 = 10_000_000;

type Res = Result<Value, VerbError>;

// ── Registry ──────────────────────────────────────────────────────────────────

macro_rules! lib {
    ($name:literal, $arity:expr, $func:path) => {
        LibFn {
            name: $name,
            arity: $arity,
            func: $func,
        }
    };
}

static LIBRARY: &[LibFn] = &[
    // ── Math ─────────────────────────────────────────────────────────────────
    lib!("add", Fixed(2), add),
    lib!("subtract", Fixed(2), subtract),
    lib!("multiply", Fixed(2), multiply),
    lib!("divide", Fixed(2), divide),
    lib!("modulo", Fixed(2), modulo),
    lib!("power", Fixed(2), power),
    lib!("negate", Fixed(1), negate),
    lib!("inc", Fixed(1), inc),
    lib!("dec", Fixed(1), dec),
    lib!("abs", Fixed(1), abs),
    lib!("sqrt", Fixed(1), sqrt),
    lib!("round", Fixed(1), round),
    lib!("floor", Fixed(1), floor),
    lib!("ceil", Fixed(1), ceil),
    lib!("min", Variadic, min),
    lib!("max", Variadic, max),
    lib!("sum", Fixed(1), sum),
    lib!("product", Fixed(1), product),
    lib!("mean", Fixed(1), mean),
    lib!("clamp", Fixed(3), clamp),
    // ── Logic ────────────────────────────────────────────────────────────────
    lib!("not", Fixed(1), not),
    lib!("and", Fixed(2), and),
    lib!("or", Fixed(2), or),
    lib!("equals", Fixed(2), equals),
    lib!("gt", Fixed(2), gt),
    lib!("gte", Fixed(2), gte),
    lib!("lt", Fixed(2), lt),
    lib!("lte", Fixed(2), lte),
    lib!("isNil", Fixed(1), is_nil),
    lib!("defaultTo", Fixed(2), default_to),
    // ── Lists ────────────────────────────────────────────────────────────────
    lib!("head", Fixed(1), head),
    lib!("last", Fixed(1), last),
    lib!("tail", Fixed(1), tail),
    lib!("init", Fixed(1), init),
    lib!("nth", Fixed(2), nth),
    lib!("length", Fixed(1), length),
    lib!("reverse", Fixed(1), reverse),
    lib!("append", Fixed(2), append),
    lib!("prepend", Fixed(2), prepend),
    lib!("concat", Fixed(2), concat),
    lib!("range", Fixed(2), range),
    lib!("take", Fixed(2), take),
    lib!("drop", Fixed(2), drop),
    lib!("includes", Fixed(2), includes),
    lib!("uniq", Fixed(1), uniq),
    lib!("flatten", Fixed(1), flatten),
    lib!("join", Fixed(2), join),
    lib!("sort", Fixed(1), sort),
    lib!("map", Fixed(2), map),
    lib!("filter", Fixed(2), filter),
    lib!("reject", Fixed(2), reject),
    lib!("reduce", Fixed(3), reduce),
    // ── Maps ─────────────────────────────────────────────────────────────────
    lib!("prop", Fixed(2), prop),
    lib!("path", Fixed(2), path),
    lib!("keys", Fixed(1), keys),
    lib!("values", Fixed(1), values),
    lib!("assoc", Fixed(3), assoc),
    lib!("dissoc", Fixed(2), dissoc),
    lib!("has", Fixed(2), has),
    lib!("pick", Fixed(2), pick),
    // ── Strings ──────────────────────────────────────────────────────────────
    lib!("toUpper", Fixed(1), to_upper),
    lib!("toLower", Fixed(1), to_lower),
    lib!("trim", Fixed(1), trim),
    lib!("split", Fixed(2), split),
    lib!("replace", Fixed(3), replace),
    lib!("test", Fixed(2), test),
    lib!("match", Fixed(2), match_all),
    // ── Functions ────────────────────────────────────────────────────────────
    lib!("identity", Fixed(1), identity),
    lib!("always", Fixed(2), always),
];

/// Look up a library function by name.
pub fn lookup(name: &str) -> Option<&'static LibFn> {
    static INDEX: OnceLock<HashMap<&'static str, &'static LibFn>> = OnceLock::new();
    INDEX
        .get_or_init(|| LIBRARY.iter().map(|f| (f.name, f)).collect())
        .get(name)
        .copied()
}

/// Names of every library function, in registry order.
pub fn names() -> impl Iterator<Item = &'static str> {
    LIBRARY.iter().map(|f| f.name)
}

/// Interpret `v` as something invocable: a callable, or the name of a
/// library function.
pub fn as_function(v: &Value) -> Result<Callable, VerbError> {
    match v {
        Value::Callable(c) => Ok(c.clone()),
        Value::Str(name) => lookup(name)
            .map(|f| Callable::Partial(Rc::new(PartialApplication::new(f))))
            .ok_or_else(|| VerbError::UnknownFunction(name.clone())),
        other => Err(VerbError::NotCallable {
            type_name: other.type_name(),
        }),
    }
}

/// Follow `keys` into nested maps and lists.  Any miss yields `Undefined`.
pub fn get_in(root: &Value, keys: &[Value]) -> Value {
    let mut cur = root;
    for key in keys {
        match child(cur, key) {
            Some(next) => cur = next,
            None => return Value::Undefined,
        }
    }
    cur.clone()
}

fn child<'a>(v: &'a Value, key: &Value) -> Option<&'a Value> {
    match v {
        Value::Map(map) => map.get(&key.to_string()),
        Value::List(items) => index(items.len(), key).map(|i| &items[i]),
        _ => None,
    }
}

/// Resolve a possibly negative index against a sequence of length `len`.
fn index(len: usize, key: &Value) -> Option<usize> {
    let i = key.as_int()?;
    let i = if i < 0 { len as i64 + i } else { i };
    (0..len as i64).contains(&i).then_some(i as usize)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn list<'a>(verb: &str, v: &'a Value) -> Result<&'a [Value], VerbError> {
    v.as_list().ok_or_else(|| {
        VerbError::invalid_argument(verb, format!("expected a list, got {}", v.type_name()))
    })
}

fn numbers<'a>(verb: &str, v: &'a Value) -> Result<impl Iterator<Item = f64> + 'a, VerbError> {
    Ok(list(verb, v)?.iter().map(Value::as_float))
}

fn count(v: &Value) -> usize {
    v.as_int().unwrap_or(0).max(0) as usize
}

fn regex(verb: &str, pattern: &Value) -> Result<Regex, VerbError> {
    Regex::new(&pattern.to_string())
        .map_err(|e| VerbError::invalid_argument(verb, format!("invalid pattern: {e}")))
}

fn unary(args: &[Value], f: impl Fn(f64) -> f64) -> Res {
    Ok(Value::number(f(args[0].as_float())))
}

fn binary(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Res {
    Ok(Value::number(f(args[0].as_float(), args[1].as_float())))
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.as_number()?.partial_cmp(&b.as_number()?),
    }
}

/// Total order for `sort`: values group by type, numbers compare with
/// `total_cmp`, strings lexically.  Other values of one type keep
/// their input order.
fn sort_order(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Undefined => 0,
            Value::Null => 1,
            Value::Bool(_) => 2,
            Value::Int(_) | Value::Float(_) => 3,
            Value::Str(_) => 4,
            Value::List(_) => 5,
            Value::Map(_) => 6,
            Value::Callable(_) => 7,
            Value::Placeholder => 8,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (a.as_number().unwrap_or(f64::NAN), b.as_number().unwrap_or(f64::NAN));
            x.total_cmp(&y)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_with(args: &[Value], accept: impl Fn(Ordering) -> bool) -> Res {
    Ok(Value::Bool(compare(&args[0], &args[1]).is_some_and(accept)))
}

// ── Math ──────────────────────────────────────────────────────────────────────

fn add(args: &[Value]) -> Res {
    binary(args, |a, b| a + b)
}

fn subtract(args: &[Value]) -> Res {
    binary(args, |a, b| a - b)
}

fn multiply(args: &[Value]) -> Res {
    binary(args, |a, b| a * b)
}

fn divide(args: &[Value]) -> Res {
    binary(args, |a, b| a / b)
}

fn modulo(args: &[Value]) -> Res {
    binary(args, |a, b| a % b)
}

fn power(args: &[Value]) -> Res {
    binary(args, f64::powf)
}

fn negate(args: &[Value]) -> Res {
    unary(args, |x| -x)
}

fn inc(args: &[Value]) -> Res {
    unary(args, |x| x + 1.0)
}

fn dec(args: &[Value]) -> Res {
    unary(args, |x| x - 1.0)
}

fn abs(args: &[Value]) -> Res {
    unary(args, f64::abs)
}

fn sqrt(args: &[Value]) -> Res {
    unary(args, f64::sqrt)
}

fn round(args: &[Value]) -> Res {
    unary(args, |x| (x + 0.5).floor())
}

fn floor(args: &[Value]) -> Res {
    unary(args, f64::floor)
}

fn ceil(args: &[Value]) -> Res {
    unary(args, f64::ceil)
}

fn min(args: &[Value]) -> Res {
    Ok(Value::number(
        args.iter().map(Value::as_float).fold(f64::INFINITY, f64::min),
    ))
}

fn max(args: &[Value]) -> Res {
    Ok(Value::number(
        args.iter().map(Value::as_float).fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn sum(args: &[Value]) -> Res {
    Ok(Value::number(numbers("sum", &args[0])?.sum()))
}

fn product(args: &[Value]) -> Res {
    Ok(Value::number(numbers("product", &args[0])?.product()))
}

fn mean(args: &[Value]) -> Res {
    let items = list("mean", &args[0])?;
    let total: f64 = items.iter().map(Value::as_float).sum();
    Ok(Value::number(total / items.len() as f64))
}

fn clamp(args: &[Value]) -> Res {
    let (lo, hi, x) = (args[0].as_float(), args[1].as_float(), args[2].as_float());
    if lo > hi {
        return Err(VerbError::invalid_argument(
            "clamp",
            format!("minimum {lo} is greater than maximum {hi}"),
        ));
    }
    Ok(Value::number(x.max(lo).min(hi)))
}

// ── Logic ─────────────────────────────────────────────────────────────────────

fn not(args: &[Value]) -> Res {
    Ok(Value::Bool(!args[0].as_bool()))
}

fn and(args: &[Value]) -> Res {
    Ok(Value::Bool(args[0].as_bool() && args[1].as_bool()))
}

fn or(args: &[Value]) -> Res {
    Ok(Value::Bool(args[0].as_bool() || args[1].as_bool()))
}

fn equals(args: &[Value]) -> Res {
    Ok(Value::Bool(args[0].loose_eq(&args[1])))
}

fn gt(args: &[Value]) -> Res {
    compare_with(args, |o| o == Ordering::Greater)
}

fn gte(args: &[Value]) -> Res {
    compare_with(args, |o| o != Ordering::Less)
}

fn lt(args: &[Value]) -> Res {
    compare_with(args, |o| o == Ordering::Less)
}

fn lte(args: &[Value]) -> Res {
    compare_with(args, |o| o != Ordering::Greater)
}

fn is_nil(args: &[Value]) -> Res {
    Ok(Value::Bool(args[0].is_nil()))
}

fn default_to(args: &[Value]) -> Res {
    let v = &args[1];
    let missing = v.is_nil() || matches!(v, Value::Float(x) if x.is_nan());
    Ok(if missing { args[0].clone() } else { v.clone() })
}

// ── Lists ─────────────────────────────────────────────────────────────────────

fn head(args: &[Value]) -> Res {
    nth_of(&args[0], &Value::Int(0))
}

fn last(args: &[Value]) -> Res {
    nth_of(&args[0], &Value::Int(-1))
}

fn nth(args: &[Value]) -> Res {
    nth_of(&args[1], &args[0])
}

fn nth_of(seq: &Value, i: &Value) -> Res {
    Ok(match seq {
        Value::List(items) => index(items.len(), i)
            .map(|i| items[i].clone())
            .unwrap_or_default(),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let c = index(chars.len(), i).map(|i| chars[i].to_string());
            Value::Str(c.unwrap_or_default())
        }
        _ => Value::Undefined,
    })
}

/// Apply a slice operation to a list or to the characters of a string.
fn slice_with(verb: &str, seq: &Value, f: impl Fn(usize) -> (usize, usize)) -> Res {
    match seq {
        Value::List(items) => {
            let (start, end) = f(items.len());
            Ok(Value::List(items[start..end].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = f(chars.len());
            Ok(Value::Str(chars[start..end].iter().collect()))
        }
        other => Err(VerbError::invalid_argument(
            verb,
            format!("expected a list or string, got {}", other.type_name()),
        )),
    }
}

fn tail(args: &[Value]) -> Res {
    slice_with("tail", &args[0], |len| (len.min(1), len))
}

fn init(args: &[Value]) -> Res {
    slice_with("init", &args[0], |len| (0, len.saturating_sub(1)))
}

fn take(args: &[Value]) -> Res {
    let n = count(&args[0]);
    slice_with("take", &args[1], |len| (0, n.min(len)))
}

fn drop(args: &[Value]) -> Res {
    let n = count(&args[0]);
    slice_with("drop", &args[1], |len| (n.min(len), len))
}

fn length(args: &[Value]) -> Res {
    Ok(match &args[0] {
        Value::List(items) => Value::Int(items.len() as i64),
        Value::Str(s) => Value::Int(s.chars().count() as i64),
        _ => Value::Undefined,
    })
}

fn reverse(args: &[Value]) -> Res {
    match &args[0] {
        Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
        other => Ok(Value::List(list("reverse", other)?.iter().rev().cloned().collect())),
    }
}

fn append(args: &[Value]) -> Res {
    let mut items = list("append", &args[1])?.to_vec();
    items.push(args[0].clone());
    Ok(Value::List(items))
}

fn prepend(args: &[Value]) -> Res {
    let mut items = vec![args[0].clone()];
    items.extend_from_slice(list("prepend", &args[1])?);
    Ok(Value::List(items))
}

fn concat(args: &[Value]) -> Res {
    match (&args[0], &args[1]) {
        (Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (a, b) => Err(VerbError::invalid_argument(
            "concat",
            format!("cannot concatenate {} and {}", a.type_name(), b.type_name()),
        )),
    }
}

fn range(args: &[Value]) -> Res {
    let from = args[0].as_int().unwrap_or(0);
    let to = args[1].as_int().unwrap_or(0);
    if to.saturating_sub(from) > MAX_RANGE_LEN {
        return Err(VerbError::invalid_argument(
            "range",
            format!("range {from}..{to} exceeds {MAX_RANGE_LEN} elements"),
        ));
    }
    Ok(Value::List((from..to).map(Value::Int).collect()))
}

fn includes(args: &[Value]) -> Res {
    Ok(Value::Bool(match &args[1] {
        Value::List(items) => items.iter().any(|x| x.loose_eq(&args[0])),
        Value::Str(s) => s.contains(&args[0].to_string()),
        _ => false,
    }))
}

fn uniq(args: &[Value]) -> Res {
    let mut out: Vec<Value> = Vec::new();
    for item in list("uniq", &args[0])? {
        if !out.iter().any(|seen| seen.loose_eq(item)) {
            out.push(item.clone());
        }
    }
    Ok(Value::List(out))
}

fn flatten(args: &[Value]) -> Res {
    fn walk(items: &[Value], out: &mut Vec<Value>) {
        for item in items {
            match item {
                Value::List(inner) => walk(inner, out),
                other => out.push(other.clone()),
            }
        }
    }
    let mut out = Vec::new();
    walk(list("flatten", &args[0])?, &mut out);
    Ok(Value::List(out))
}

fn join(args: &[Value]) -> Res {
    let sep = args[0].to_string();
    let parts: Vec<String> = list("join", &args[1])?.iter().map(Value::to_string).collect();
    Ok(Value::Str(parts.join(&sep)))
}

fn sort(args: &[Value]) -> Res {
    let mut items = list("sort", &args[0])?.to_vec();
    items.sort_by(sort_order);
    Ok(Value::List(items))
}

fn map(args: &[Value]) -> Res {
    let f = as_function(&args[0])?;
    match &args[1] {
        Value::Map(entries) => {
            let mut out = BTreeMap::new();
            for (k, v) in entries {
                out.insert(k.clone(), f.call(vec![v.clone()])?);
            }
            Ok(Value::Map(out))
        }
        other => {
            let items = list("map", other)?;
            let mapped = items
                .iter()
                .map(|item| f.call(vec![item.clone()]))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(mapped))
        }
    }
}

fn select(verb: &str, args: &[Value], keep: bool) -> Res {
    let pred = as_function(&args[0])?;
    match &args[1] {
        Value::Map(entries) => {
            let mut out = BTreeMap::new();
            for (k, v) in entries {
                if pred.call(vec![v.clone()])?.as_bool() == keep {
                    out.insert(k.clone(), v.clone());
                }
            }
            Ok(Value::Map(out))
        }
        other => {
            let mut out = Vec::new();
            for item in list(verb, other)? {
                if pred.call(vec![item.clone()])?.as_bool() == keep {
                    out.push(item.clone());
                }
            }
            Ok(Value::List(out))
        }
    }
}

fn filter(args: &[Value]) -> Res {
    select("filter", args, true)
}

fn reject(args: &[Value]) -> Res {
    select("reject", args, false)
}

fn reduce(args: &[Value]) -> Res {
    let f = as_function(&args[0])?;
    let mut acc = args[1].clone();
    for item in list("reduce", &args[2])? {
        acc = f.call(vec![acc, item.clone()])?;
    }
    Ok(acc)
}

// ── Maps ──────────────────────────────────────────────────────────────────────

fn map_arg<'a>(verb: &str, v: &'a Value) -> Result<&'a BTreeMap<String, Value>, VerbError> {
    match v {
        Value::Map(m) => Ok(m),
        other => Err(VerbError::invalid_argument(
            verb,
            format!("expected a map, got {}", other.type_name()),
        )),
    }
}

fn prop(args: &[Value]) -> Res {
    Ok(get_in(&args[1], std::slice::from_ref(&args[0])))
}

fn path(args: &[Value]) -> Res {
    Ok(get_in(&args[1], list("path", &args[0])?))
}

fn keys(args: &[Value]) -> Res {
    Ok(Value::List(match &args[0] {
        Value::Map(m) => m.keys().cloned().map(Value::Str).collect(),
        _ => Vec::new(),
    }))
}

fn values(args: &[Value]) -> Res {
    Ok(Value::List(match &args[0] {
        Value::Map(m) => m.values().cloned().collect(),
        _ => Vec::new(),
    }))
}

fn assoc(args: &[Value]) -> Res {
    let mut out = match &args[2] {
        Value::Undefined | Value::Null => BTreeMap::new(),
        other => map_arg("assoc", other)?.clone(),
    };
    out.insert(args[0].to_string(), args[1].clone());
    Ok(Value::Map(out))
}

fn dissoc(args: &[Value]) -> Res {
    let mut out = map_arg("dissoc", &args[1])?.clone();
    out.remove(&args[0].to_string());
    Ok(Value::Map(out))
}

fn has(args: &[Value]) -> Res {
    Ok(Value::Bool(match &args[1] {
        Value::Map(m) => m.contains_key(&args[0].to_string()),
        _ => false,
    }))
}

fn pick(args: &[Value]) -> Res {
    let src = map_arg("pick", &args[1])?;
    let out = list("pick", &args[0])?
        .iter()
        .filter_map(|k| {
            let k = k.to_string();
            src.get(&k).map(|v| (k, v.clone()))
        })
        .collect();
    Ok(Value::Map(out))
}

// ── Strings ───────────────────────────────────────────────────────────────────

fn to_upper(args: &[Value]) -> Res {
    Ok(Value::Str(args[0].to_string().to_uppercase()))
}

fn to_lower(args: &[Value]) -> Res {
    Ok(Value::Str(args[0].to_string().to_lowercase()))
}

fn trim(args: &[Value]) -> Res {
    Ok(Value::Str(args[0].to_string().trim().to_owned()))
}

fn split(args: &[Value]) -> Res {
    let sep = args[0].to_string();
    let s = args[1].to_string();
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep.as_str()).map(Value::from).collect()
    };
    Ok(Value::List(parts))
}

/// Replaces every match of the pattern.
fn replace(args: &[Value]) -> Res {
    let re = regex("replace", &args[0])?;
    let replacement = args[1].to_string();
    let s = args[2].to_string();
    Ok(Value::Str(re.replace_all(&s, replacement.as_str()).into_owned()))
}

fn test(args: &[Value]) -> Res {
    Ok(Value::Bool(regex("test", &args[0])?.is_match(&args[1].to_string())))
}

/// All non-overlapping matches; an empty list when nothing matches.
fn match_all(args: &[Value]) -> Res {
    let re = regex("match", &args[0])?;
    let s = args[1].to_string();
    Ok(Value::List(re.find_iter(&s).map(|m| Value::from(m.as_str())).collect()))
}

// ── Functions ─────────────────────────────────────────────────────────────────

fn identity(args: &[Value]) -> Res {
    Ok(args[0].clone())
}

fn always(args: &[Value]) -> Res {
    Ok(args[0].clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::curry::{apply, Curried};

    fn call(name: &str, args: Vec<Value>) -> Res {
        let f = lookup(name).unwrap_or_else(|| panic!("no library function {name}"));
        apply(f, args).map(Curried::into_value)
    }

    fn ok(name: &str, args: Vec<Value>) -> Value {
        call(name, args).unwrap_or_else(|e| panic!("{name} failed: {e}"))
    }

    fn ints(ns: &[i64]) -> Value {
        Value::List(ns.iter().copied().map(Value::Int).collect())
    }

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    fn json(text: &str) -> Value {
        Value::parse_literal(text)
    }

    #[test]
    fn registry_names_are_unique_and_resolvable() {
        let mut seen = std::collections::HashSet::new();
        for name in names() {
            assert!(seen.insert(name), "duplicate library function {name}");
            assert_eq!(lookup(name).map(|f| f.name), Some(name));
        }
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn math() {
        assert_eq!(ok("power", vec![Value::Int(2), Value::Int(3)]), Value::Int(8));
        assert_eq!(ok("subtract", vec![Value::Int(10), Value::Int(3)]), Value::Int(7));
        assert_eq!(ok("divide", vec![Value::Int(7), Value::Int(2)]), Value::Float(3.5));
        assert_eq!(ok("modulo", vec![Value::Int(-7), Value::Int(3)]), Value::Int(-1));
        assert_eq!(ok("sum", vec![ints(&[1, 2, 3])]), Value::Int(6));
        assert_eq!(ok("mean", vec![ints(&[1, 2])]), Value::Float(1.5));
        assert_eq!(ok("clamp", vec![Value::Int(0), Value::Int(10), Value::Int(42)]), Value::Int(10));
    }

    #[test]
    fn permissive_arithmetic() {
        let v = ok("add", vec![s("a"), Value::Int(1)]);
        assert!(matches!(v, Value::Float(x) if x.is_nan()));
        let v = ok("divide", vec![Value::Int(1), Value::Int(0)]);
        assert!(matches!(v, Value::Float(x) if x == f64::INFINITY));
        assert_eq!(ok("add", vec![s("2"), Value::Int(1)]), Value::Int(3));
    }

    #[test]
    fn variadic_min_max() {
        assert_eq!(ok("max", vec![Value::Int(1), Value::Int(9), Value::Int(4)]), Value::Int(9));
        assert_eq!(ok("min", vec![Value::Int(7), Value::Int(1)]), Value::Int(1));
        let Value::Callable(f) = ok("min", vec![Value::Int(9)]) else {
            panic!("expected callable");
        };
        assert_eq!(f.call(vec![Value::Int(3)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn logic() {
        assert_eq!(ok("equals", vec![Value::Int(1), Value::Float(1.0)]), Value::Bool(true));
        assert_eq!(ok("gt", vec![Value::Int(3), Value::Int(2)]), Value::Bool(true));
        assert_eq!(ok("lte", vec![s("a"), s("b")]), Value::Bool(true));
        assert_eq!(ok("gt", vec![s("a"), Value::Int(1)]), Value::Bool(false));
        assert_eq!(ok("defaultTo", vec![Value::Int(5), Value::Undefined]), Value::Int(5));
        assert_eq!(ok("defaultTo", vec![Value::Int(5), Value::Int(0)]), Value::Int(0));
    }

    #[test]
    fn sequences() {
        assert_eq!(ok("head", vec![ints(&[4, 5])]), Value::Int(4));
        assert_eq!(ok("head", vec![ints(&[])]), Value::Undefined);
        assert_eq!(ok("last", vec![s("abc")]), s("c"));
        assert_eq!(ok("nth", vec![Value::Int(-2), ints(&[1, 2, 3])]), Value::Int(2));
        assert_eq!(ok("nth", vec![Value::Int(9), ints(&[1])]), Value::Undefined);
        assert_eq!(ok("tail", vec![ints(&[1, 2, 3])]), ints(&[2, 3]));
        assert_eq!(ok("tail", vec![ints(&[])]), ints(&[]));
        assert_eq!(ok("take", vec![Value::Int(2), s("hello")]), s("he"));
        assert_eq!(ok("drop", vec![Value::Int(5), ints(&[1, 2])]), ints(&[]));
        assert_eq!(ok("range", vec![Value::Int(1), Value::Int(4)]), ints(&[1, 2, 3]));
        assert_eq!(ok("uniq", vec![json("[1, 1.0, 2, 1]")]), ints(&[1, 2]));
        assert_eq!(ok("flatten", vec![json("[1, [2, [3]]]")]), ints(&[1, 2, 3]));
        assert_eq!(ok("join", vec![s("-"), json(r#"[1, "a"]"#)]), s("1-a"));
        assert_eq!(ok("sort", vec![ints(&[3, 1, 2])]), ints(&[1, 2, 3]));
        assert_eq!(ok("length", vec![Value::Int(3)]), Value::Undefined);
    }

    #[test]
    fn sort_groups_mixed_types() {
        assert_eq!(
            ok("sort", vec![json(r#"["9", 9, "10", 1.5, null, true, "a"]"#)]),
            json(r#"[null, true, 1.5, 9, "10", "9", "a"]"#)
        );

        let sorted = ok("sort", vec![Value::List(vec![Value::Float(f64::NAN), Value::Int(1), Value::Float(-2.0)])]);
        let Value::List(items) = sorted else { panic!("expected a list") };
        assert_eq!(&items[..2], &[Value::Float(-2.0), Value::Int(1)]);
        assert!(matches!(items[2], Value::Float(x) if x.is_nan()));
    }

    #[test]
    fn sort_is_consistent_on_large_mixed_lists() {
        let items: Vec<Value> = (0..600i64)
            .map(|i| match i % 4 {
                0 => Value::Int((i * 7919) % 101),
                1 => Value::Str(((i * 31) % 97).to_string()),
                2 => Value::Float(if i % 10 == 2 { f64::NAN } else { i as f64 / 3.0 }),
                _ => Value::Str(format!("w{}", i % 13)),
            })
            .collect();
        let Value::List(sorted) = ok("sort", vec![Value::List(items)]) else {
            panic!("expected a list")
        };
        assert_eq!(sorted.len(), 600);
        assert!(sorted.windows(2).all(|w| sort_order(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn structural_misuse_is_an_error() {
        assert!(matches!(
            call("append", vec![Value::Int(1), Value::Int(2)]),
            Err(VerbError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("concat", vec![ints(&[1]), s("x")]),
            Err(VerbError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("test", vec![s("("), s("x")]),
            Err(VerbError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn higher_order_with_named_function() {
        assert_eq!(ok("map", vec![s("inc"), ints(&[1, 2])]), ints(&[2, 3]));
        assert_eq!(
            ok("reduce", vec![s("add"), Value::Int(0), ints(&[1, 2, 3])]),
            Value::Int(6)
        );
    }

    #[test]
    fn higher_order_with_partial() {
        let gt2 = ok("lt", vec![Value::Int(2)]); // lt(2, x): 2 < x
        assert_eq!(ok("filter", vec![gt2.clone(), ints(&[1, 2, 3, 4])]), ints(&[3, 4]));
        assert_eq!(ok("reject", vec![gt2, ints(&[1, 2, 3, 4])]), ints(&[1, 2]));
    }

    #[test]
    fn map_over_map_values() {
        let m = ok("map", vec![s("negate"), json(r#"{"a": 1, "b": 2}"#)]);
        assert_eq!(m, json(r#"{"a": -1, "b": -2}"#));
    }

    #[test]
    fn higher_order_rejects_non_callable() {
        assert_eq!(
            call("map", vec![Value::Int(3), ints(&[1])]),
            Err(VerbError::NotCallable { type_name: "integer" })
        );
        assert_eq!(
            call("map", vec![s("nope"), ints(&[1])]),
            Err(VerbError::UnknownFunction("nope".into()))
        );
    }

    #[test]
    fn maps() {
        let obj = json(r#"{"a": 1, "b": 2, "c": {"d": 5}}"#);
        assert_eq!(ok("prop", vec![s("a"), obj.clone()]), Value::Int(1));
        assert_eq!(ok("prop", vec![s("z"), obj.clone()]), Value::Undefined);
        assert_eq!(ok("path", vec![json(r#"["c", "d"]"#), obj.clone()]), Value::Int(5));
        assert_eq!(ok("keys", vec![obj.clone()]), json(r#"["a", "b", "c"]"#));
        assert_eq!(ok("has", vec![s("b"), obj.clone()]), Value::Bool(true));
        assert_eq!(ok("pick", vec![json(r#"["a", "q"]"#), obj.clone()]), json(r#"{"a": 1}"#));
        assert_eq!(ok("assoc", vec![s("x"), Value::Int(9), Value::Null]), json(r#"{"x": 9}"#));
        assert_eq!(ok("dissoc", vec![s("c"), obj]), json(r#"{"a": 1, "b": 2}"#));
    }

    #[test]
    fn strings() {
        assert_eq!(ok("toUpper", vec![s("abc")]), s("ABC"));
        assert_eq!(ok("split", vec![s(","), s("a,b")]), json(r#"["a", "b"]"#));
        assert_eq!(ok("split", vec![s(""), s("ab")]), json(r#"["a", "b"]"#));
        assert_eq!(ok("replace", vec![s("o"), s("0"), s("foo")]), s("f00"));
        assert_eq!(ok("test", vec![s(r"^\d+$"), s("123")]), Value::Bool(true));
        assert_eq!(ok("match", vec![s(r"\d"), s("a1b2")]), json(r#"["1", "2"]"#));
    }

    #[test]
    fn always_curries_over_ignored_argument() {
        let Value::Callable(f) = ok("always", vec![Value::Int(5)]) else {
            panic!("expected callable");
        };
        assert_eq!(f.call(vec![s("anything")]).unwrap(), Value::Int(5));
    }

    #[test]
    fn get_in_misses_are_undefined() {
        let obj = json(r#"{"a": [10, {"b": true}]}"#);
        assert_eq!(get_in(&obj, &[s("a"), Value::Int(1), s("b")]), Value::Bool(true));
        assert_eq!(get_in(&obj, &[s("a"), s("1"), s("b")]), Value::Bool(true));
        assert_eq!(get_in(&obj, &[s("a"), Value::Int(5)]), Value::Undefined);
        assert_eq!(get_in(&obj, &[s("a"), Value::Int(0), s("x")]), Value::Undefined);
        assert_eq!(get_in(&obj, &[]), obj);
    }
}
