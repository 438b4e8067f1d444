use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("unhandled flag type {}", describe(.0))]
    UnhandledType(Option<TypeDescription>),

    #[error("invalid value {value:?} for flag -{name}: {source}")]
    InvalidFlagValue {
        name: String,
        value: String,
        source: ParseError,
    },

    #[error("invalid value {value:?} for environment variable {key}: {source}")]
    InvalidEnvValue {
        key: String,
        value: String,
        source: ParseError,
    },

    #[error("flag provided but not defined: -{0}")]
    UnknownFlag(String),

    #[error("flag needs an argument: -{0}")]
    MissingArgument(String),

    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("flag redefined: {0}")]
    Redefined(String),

    #[error("flag: help requested")]
    Help,

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// The runtime type of a field nothing knows how to bind, plus its value at
/// bind time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    pub type_name: &'static str,
    pub value: String,
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name, self.value)
    }
}

fn describe(desc: &Option<TypeDescription>) -> String {
    desc.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Text that could not be coerced into a field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing {text:?} as {target}: {reason}")]
pub struct ParseError {
    pub text: String,
    pub target: &'static str,
    pub reason: String,
}

impl ParseError {
    pub fn new(text: &str, target: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            text: text.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}
