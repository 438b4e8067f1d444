//! Typed value handles.
//!
//! A [`Value`] wraps a mutable reference to one configuration field and knows
//! how to render it as text, parse text into it, and report its current
//! contents as a [`Scalar`]. The closed set of built-in field types is a
//! variant each; anything else implements [`FlagValue`] and rides along in
//! [`Value::Custom`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::duration::{format_duration, parse_duration};
use crate::error::ParseError;

/// The handle contract. Implement this for field types outside the built-in
/// set, e.g. an enumerated setting.
pub trait FlagValue {
    /// Canonical text form of the current value.
    fn render(&self) -> String;

    /// Replace the current value with one parsed from `text`.
    ///
    /// On failure the field's contents are unspecified.
    fn parse(&mut self, text: &str) -> Result<(), ParseError>;

    /// The current value, for default detection and usage text.
    fn current(&self) -> Scalar;

    /// Boolean-style values take no argument on the command line.
    fn is_bool_flag(&self) -> bool {
        false
    }
}

/// An untyped snapshot of a field's value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    Float64(f64),
    Text(String),
    #[serde(serialize_with = "serialize_duration")]
    Duration(Duration),
    /// Anything a custom handle cannot express as a primitive.
    Other(String),
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_duration(*d))
}

impl Scalar {
    /// Whether this is the zero value of its type. Zero defaults are left out
    /// of usage text.
    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Bool(b) => !b,
            Scalar::Int(i) => *i == 0,
            Scalar::Int64(i) => *i == 0,
            Scalar::Uint(u) => *u == 0,
            Scalar::Uint64(u) => *u == 0,
            Scalar::Float64(f) => *f == 0.0,
            Scalar::Text(s) => s.is_empty(),
            Scalar::Duration(d) => d.is_zero(),
            Scalar::Other(s) => matches!(s.as_str(), "" | "0" | "false"),
        }
    }

    /// The placeholder shown after a flag name when the usage text does not
    /// name one explicitly. Booleans take no placeholder.
    pub fn type_hint(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "",
            Scalar::Duration(_) => "duration",
            Scalar::Float64(_) => "float",
            Scalar::Int(_) | Scalar::Int64(_) => "int",
            Scalar::Uint(_) | Scalar::Uint64(_) => "uint",
            Scalar::Text(_) => "string",
            Scalar::Other(_) => "value",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Int64(i) => write!(f, "{i}"),
            Scalar::Uint(u) => write!(f, "{u}"),
            Scalar::Uint64(u) => write!(f, "{u}"),
            Scalar::Float64(x) => write!(f, "{x}"),
            Scalar::Text(s) | Scalar::Other(s) => f.write_str(s),
            Scalar::Duration(d) => f.write_str(&format_duration(*d)),
        }
    }
}

/// A handle on one configuration field.
pub enum Value<'a> {
    Bool(&'a mut bool),
    Int(&'a mut isize),
    Int64(&'a mut i64),
    Uint(&'a mut usize),
    Uint64(&'a mut u64),
    Float64(&'a mut f64),
    Text(&'a mut String),
    Duration(&'a mut Duration),
    Custom(&'a mut dyn FlagValue),
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.current()).finish()
    }
}

impl FlagValue for Value<'_> {
    fn render(&self) -> String {
        match self {
            Value::Custom(v) => v.render(),
            other => other.current().to_string(),
        }
    }

    fn parse(&mut self, text: &str) -> Result<(), ParseError> {
        match self {
            Value::Bool(b) => **b = parse_bool(text)?,
            Value::Int(i) => {
                **i = isize::try_from(parse_signed(text, "int")?)
                    .map_err(|e| ParseError::new(text, "int", e))?;
            }
            Value::Int64(i) => **i = parse_signed(text, "int64")?,
            Value::Uint(u) => {
                **u = usize::try_from(parse_unsigned(text, "uint")?)
                    .map_err(|e| ParseError::new(text, "uint", e))?;
            }
            Value::Uint64(u) => **u = parse_unsigned(text, "uint64")?,
            Value::Float64(x) => {
                **x = text
                    .parse()
                    .map_err(|e| ParseError::new(text, "float64", e))?;
            }
            Value::Text(s) => **s = text.to_string(),
            Value::Duration(d) => {
                **d = parse_duration(text).map_err(|e| ParseError::new(text, "duration", e))?;
            }
            Value::Custom(v) => v.parse(text)?,
        }
        Ok(())
    }

    fn current(&self) -> Scalar {
        match self {
            Value::Bool(b) => Scalar::Bool(**b),
            Value::Int(i) => Scalar::Int(**i),
            Value::Int64(i) => Scalar::Int64(**i),
            Value::Uint(u) => Scalar::Uint(**u),
            Value::Uint64(u) => Scalar::Uint64(**u),
            Value::Float64(x) => Scalar::Float64(**x),
            Value::Text(s) => Scalar::Text((**s).clone()),
            Value::Duration(d) => Scalar::Duration(**d),
            Value::Custom(v) => v.current(),
        }
    }

    fn is_bool_flag(&self) -> bool {
        match self {
            Value::Bool(_) => true,
            Value::Custom(v) => v.is_bool_flag(),
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a mut $ty> for Value<'a> {
                fn from(field: &'a mut $ty) -> Self {
                    Value::$variant(field)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    isize => Int,
    i64 => Int64,
    usize => Uint,
    u64 => Uint64,
    f64 => Float64,
    String => Text,
    Duration => Duration,
}

pub fn parse_bool(text: &str) -> Result<bool, ParseError> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ParseError::new(text, "bool", "invalid syntax")),
    }
}

/// Integer literal with an optional sign, a `0x`/`0o`/`0b` or legacy `0`
/// octal prefix, and `_` separators.
pub fn parse_signed(text: &str, target: &'static str) -> Result<i64, ParseError> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_magnitude(text, unsigned, target)?;
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i64::try_from(value).map_err(|_| ParseError::new(text, target, "value out of range"))
}

pub fn parse_unsigned(text: &str, target: &'static str) -> Result<u64, ParseError> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    parse_magnitude(text, unsigned, target)
}

fn parse_magnitude(text: &str, digits: &str, target: &'static str) -> Result<u64, ParseError> {
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };

    if body.starts_with(['+', '-']) {
        return Err(ParseError::new(text, target, "invalid syntax"));
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return Err(ParseError::new(text, target, "invalid syntax"));
    }
    u64::from_str_radix(&cleaned, radix).map_err(|e| ParseError::new(text, target, e))
}
