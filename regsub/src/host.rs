/*!
Entry points for a dynamically-typed scripting host.

Arguments and results are [`Value`]s. Compiled patterns are shared handles:
a pattern is freed when the last `Value` referring to it is dropped.

| Function | Arguments | Result |
|---|---|---|
| `regex/compile` | pattern text | pattern |
| `regex/match` | pattern, subject | array of strings, with `nil` for groups that did not participate; or `nil` |
| `regex/replace` | pattern, subject, template, optional `:all` | buffer, or `nil` if nothing matched |

Text arguments may be strings or buffers. Like C strings, they end at the
first NUL byte.

## Example
```
use regsub::host::{call, Value};

let re = call("regex/compile", &[Value::from("([a-z]+)")])?;
let out = call(
    "regex/replace",
    &[re, "hello 42 world".into(), "<%1>".into(), Value::keyword("all")],
)?;
assert_eq!(out, Value::Buffer(b"<hello> 42 <world>".to_vec()));
# Ok::<(), regsub::Error>(())
```
*/
use std::{fmt, sync::Arc};

use itertools::Itertools;
use tracing::trace;

use crate::{ascii::until_nul, Error, Pattern};

/// Type name of compiled patterns as seen by the host.
pub const PATTERN_TYPE: &str = "regex/pattern";

#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    /// Immutable bytes.
    String(Box<[u8]>),
    /// Mutable bytes.
    Buffer(Vec<u8>),
    Keyword(Box<str>),
    Array(Vec<Value>),
    Pattern(Arc<Pattern>),
}

impl Value {
    pub fn keyword(name: &str) -> Self {
        Value::Keyword(name.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Buffer(_) => "buffer",
            Value::Keyword(_) => "keyword",
            Value::Array(_) => "array",
            Value::Pattern(_) => PATTERN_TYPE,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Handles compare by identity
            (Value::Pattern(a), Value::Pattern(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "\"{}\"", s.escape_ascii()),
            Value::Buffer(b) => write!(f, "@\"{}\"", b.escape_ascii()),
            Value::Keyword(k) => write!(f, ":{k}"),
            Value::Array(items) => write!(f, "@[{}]", items.iter().format(" ")),
            Value::Pattern(p) => write!(f, "{p}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.as_bytes().into())
    }
}

impl From<&[u8]> for Value {
    fn from(s: &[u8]) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Buffer(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(Arc::new(p))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

/// A string-or-buffer argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Text<'a> {
    String(&'a [u8]),
    Buffer(&'a [u8]),
}

impl<'a> Text<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Text::String(s)),
            Value::Buffer(b) => Some(Text::Buffer(b)),
            _ => None,
        }
    }

    /// The bytes up to the first NUL.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Text::String(s) | Text::Buffer(s) => until_nul(s),
        }
    }
}

/// Accepted number of arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive.
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(m) => n == m,
            Arity::Range(min, max) => (min..=max).contains(&n),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

/// A host-callable function.
#[derive(Debug)]
pub struct Function {
    pub name: &'static str,
    pub arity: Arity,
    pub doc: &'static str,
    pub call: fn(&[Value]) -> Result<Value, Error>,
}

pub static FUNCTIONS: [Function; 3] = [
    Function {
        name: "regex/compile",
        arity: Arity::Exact(1),
        doc: "(regex/compile pattern)\n\n\
              Compile a POSIX extended regular expression.",
        call: compile,
    },
    Function {
        name: "regex/match",
        arity: Arity::Exact(2),
        doc: "(regex/match pattern text)\n\n\
              Match pattern against text, a string or buffer. Returns nil if \
              there is no match, otherwise an array of the whole match and the \
              captured strings, with nil for groups that did not participate.",
        call: r#match,
    },
    Function {
        name: "regex/replace",
        arity: Arity::Range(3, 4),
        doc: "(regex/replace pattern text rep &opt :all)\n\n\
              Replace the first match of pattern in text, or every match if \
              :all is given, with rep. In rep, %0 is the whole match, %1 to %9 \
              the captured strings and %% a literal %. Returns nil if nothing \
              was replaced, otherwise a new buffer.",
        call: replace,
    },
];

pub fn lookup(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|function| function.name == name)
}

/// Call the function named `name`.
pub fn call(name: &str, args: &[Value]) -> Result<Value, Error> {
    let function = lookup(name).ok_or_else(|| Error::UnknownFunction(name.to_owned()))?;
    trace!(function = function.name, args = args.len(), "call");
    (function.call)(args)
}

fn check_arity(name: &'static str, arity: Arity, args: &[Value]) -> Result<(), Error> {
    if arity.accepts(args.len()) {
        Ok(())
    } else {
        Err(Error::InvalidNumberOfArguments {
            name,
            expected: arity,
            got: args.len(),
        })
    }
}

fn text_arg(args: &[Value], position: usize) -> Result<&[u8], Error> {
    args.get(position)
        .and_then(Text::from_value)
        .map(|text| text.as_bytes())
        .ok_or(Error::InvalidArgument {
            position,
            expected: "buffer or string",
        })
}

fn pattern_arg(args: &[Value], position: usize) -> Result<&Pattern, Error> {
    match args.get(position) {
        Some(Value::Pattern(p)) => Ok(&**p),
        _ => Err(Error::InvalidArgument {
            position,
            expected: PATTERN_TYPE,
        }),
    }
}

/// An optional flag: any keyword or `true` sets it.
fn flag_arg(args: &[Value], position: usize) -> Result<bool, Error> {
    match args.get(position) {
        None | Some(Value::Nil) | Some(Value::Boolean(false)) => Ok(false),
        Some(Value::Keyword(_)) | Some(Value::Boolean(true)) => Ok(true),
        Some(_) => Err(Error::InvalidArgument {
            position,
            expected: "keyword",
        }),
    }
}

/// `(regex/compile pattern)`
pub fn compile(args: &[Value]) -> Result<Value, Error> {
    check_arity("regex/compile", Arity::Exact(1), args)?;
    let pattern = text_arg(args, 0)?;
    Ok(Pattern::new(pattern)?.into())
}

/// `(regex/match pattern text)`
pub fn r#match(args: &[Value]) -> Result<Value, Error> {
    check_arity("regex/match", Arity::Exact(2), args)?;
    let pattern = pattern_arg(args, 0)?;
    let subject = text_arg(args, 1)?;
    Ok(match pattern.captures(subject, 0)? {
        Some(caps) => Value::Array(
            caps.groups(subject)
                .into_iter()
                .map(Value::from)
                .collect(),
        ),
        None => Value::Nil,
    })
}

/// `(regex/replace pattern text rep &opt :all)`
pub fn replace(args: &[Value]) -> Result<Value, Error> {
    check_arity("regex/replace", Arity::Range(3, 4), args)?;
    let pattern = pattern_arg(args, 0)?;
    let subject = text_arg(args, 1)?;
    let template = text_arg(args, 2)?;
    let all = flag_arg(args, 3)?;
    Ok(pattern.replace(subject, template).all(all).call()?.into())
}
