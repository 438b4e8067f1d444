use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::panic::panic_any;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::env::{Environment, ProcessEnv};
use crate::error::FlagError;
use crate::factory::value_from_ref;
use crate::fields::{Entry, Field, Fields};
use crate::types::ErrorHandling;
use crate::value::{FlagValue, Scalar, Value};

/// Exit status used when parsing fails under [`ErrorHandling::ExitOnError`].
pub const EXIT_STATUS: i32 = 2;

/// A registered command-line flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    pub usage: String,
    /// The value at registration time.
    pub default: Scalar,
    pub(crate) value: usize,
}

/// What one bind pass recorded for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub(crate) flag: Option<String>,
    pub(crate) env: Option<String>,
    pub(crate) usage: String,
    pub(crate) value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Bound {
    Field(Binding),
    Section,
}

/// Output of the most recent bind: declaration order for usage text and the
/// environment key table. Later keys overwrite earlier ones.
#[derive(Debug, Default)]
pub(crate) struct BindingSet {
    pub(crate) entries: Vec<Bound>,
    pub(crate) env: IndexMap<String, usize>,
}

/// A set of flags and environment bindings over borrowed configuration
/// fields.
///
/// The lifecycle is construct, [`bind`](Self::bind), parse
/// ([`parse`](Self::parse) and/or [`parse_env`](Self::parse_env), in either
/// order), then drop the set to release the borrowed fields.
pub struct FlagSet<'a> {
    pub(crate) name: String,
    error_handling: ErrorHandling,
    pub(crate) values: Vec<Value<'a>>,
    pub(crate) formal: BTreeMap<String, Flag>,
    actual: BTreeSet<String>,
    pub(crate) bindings: BindingSet,
    args: Vec<String>,
    parsed: bool,
    output: Option<Box<dyn Write + 'a>>,
    pub(crate) struct_usage: Option<String>,
    pub(crate) exit: fn(i32) -> !,
}

impl<'a> FlagSet<'a> {
    pub fn new(name: &str, error_handling: ErrorHandling) -> Self {
        Self {
            name: name.to_string(),
            error_handling,
            values: Vec::new(),
            formal: BTreeMap::new(),
            actual: BTreeSet::new(),
            bindings: BindingSet::default(),
            args: Vec::new(),
            parsed: false,
            output: None,
            struct_usage: None,
            exit: std::process::exit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_handling(&self) -> ErrorHandling {
        self.error_handling
    }

    /// Send usage and error messages to `output` instead of standard error.
    pub fn set_output(&mut self, output: impl Write + 'a) {
        self.output = Some(Box::new(output));
    }

    /// Go back to writing usage and error messages to standard error.
    pub fn reset_output(&mut self) {
        self.output = None;
    }

    pub(crate) fn write_out(&mut self, text: &str) -> io::Result<()> {
        match self.output.as_mut() {
            Some(out) => out.write_all(text.as_bytes()),
            None => io::stderr().write_all(text.as_bytes()),
        }
    }

    /// Register a handle as a flag. Its current value becomes the default.
    pub fn var(
        &mut self,
        value: impl Into<Value<'a>>,
        name: &str,
        usage: &str,
    ) -> Result<(), FlagError> {
        let index = self.push_value(value.into());
        self.register(index, name, usage)
    }

    fn push_value(&mut self, value: Value<'a>) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    fn register(&mut self, index: usize, name: &str, usage: &str) -> Result<(), FlagError> {
        if self.formal.contains_key(name) {
            return Err(FlagError::Redefined(name.to_string()));
        }
        let default = self.values[index].current();
        debug!(flag = name, default = %default, "registered flag");
        self.formal.insert(
            name.to_string(),
            Flag {
                name: name.to_string(),
                usage: usage.to_string(),
                default,
                value: index,
            },
        );
        Ok(())
    }

    /// Register every annotated field in `fields`.
    ///
    /// Fields with neither a flag name nor an environment key are skipped
    /// without looking at their type. The first field that cannot be bound
    /// stops the pass; under [`ErrorHandling::ExitOnError`] and
    /// [`ErrorHandling::PanicOnError`] the error becomes a panic payload
    /// rather than an exit, so it stays visible.
    pub fn bind(&mut self, fields: Fields<'a>) -> Result<(), FlagError> {
        self.bindings = BindingSet::default();
        for entry in fields.entries {
            if let Err(err) = self.bind_entry(entry) {
                return Err(self.escalate_bind(err));
            }
        }
        Ok(())
    }

    fn bind_entry(&mut self, entry: Entry<'a>) -> Result<(), FlagError> {
        let Field {
            target,
            flag,
            env,
            usage,
        } = match entry {
            Entry::Section => {
                self.bindings.entries.push(Bound::Section);
                return Ok(());
            }
            Entry::Field(field) => field,
        };
        if flag.is_none() && env.is_none() {
            return Ok(());
        }
        if let Some(name) = flag.as_deref().filter(|name| self.formal.contains_key(*name)) {
            return Err(FlagError::Redefined(name.to_string()));
        }

        let index = self.push_value(value_from_ref(Some(target))?);

        if let Some(key) = &env {
            if self.bindings.env.insert(key.clone(), index).is_some() {
                warn!(env = %key, "environment variable bound twice; the last binding wins");
            }
            debug!(env = %key, "bound environment variable");
        }
        if let Some(name) = &flag {
            self.register(index, name, &usage)?;
        }

        self.bindings.entries.push(Bound::Field(Binding {
            flag,
            env,
            usage,
            value: index,
        }));
        Ok(())
    }

    fn escalate_bind(&self, err: FlagError) -> FlagError {
        match self.error_handling {
            ErrorHandling::ContinueOnError => err,
            ErrorHandling::ExitOnError | ErrorHandling::PanicOnError => panic_any(err),
        }
    }

    /// [`bind`](Self::bind) followed by [`parse`](Self::parse).
    pub fn bind_and_parse<I, S>(&mut self, fields: Fields<'a>, arguments: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bind(fields)?;
        self.parse(arguments)
    }

    /// Parse command-line arguments, not including the program name.
    ///
    /// Flags look like `-name`, `--name`, `-name=value` or `-name value`; a
    /// boolean flag only takes a value through `=`. Parsing stops at the first
    /// non-flag argument or after `--`; whatever is left is available through
    /// [`args`](Self::args).
    pub fn parse<I, S>(&mut self, arguments: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parsed = true;
        self.args = arguments.into_iter().map(Into::into).collect();
        loop {
            match self.parse_one() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => return Err(self.fail_parse(err)),
            }
        }
        debug!(set = self.actual.len(), remaining = self.args.len(), "parsed flags");
        Ok(())
    }

    /// Parse the arguments this process was started with.
    pub fn parse_process_args(&mut self) -> Result<(), FlagError> {
        self.parse(std::env::args().skip(1))
    }

    fn parse_one(&mut self) -> Result<bool, FlagError> {
        let arg = match self.args.first() {
            Some(arg) if arg.len() >= 2 && arg.starts_with('-') => arg.clone(),
            _ => return Ok(false),
        };

        let dashes = if arg.starts_with("--") {
            if arg.len() == 2 {
                self.args.remove(0);
                return Ok(false);
            }
            2
        } else {
            1
        };
        let body = &arg[dashes..];
        if body.starts_with('-') || body.starts_with('=') {
            return Err(FlagError::BadSyntax(arg.clone()));
        }
        self.args.remove(0);

        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(index) = self.formal.get(name).map(|flag| flag.value) else {
            if name == "help" || name == "h" {
                self.print_usage()?;
                return Err(FlagError::Help);
            }
            return Err(FlagError::UnknownFlag(name.to_string()));
        };

        let value = match inline {
            Some(value) => value.to_string(),
            None if self.values[index].is_bool_flag() => "true".to_string(),
            None if self.args.is_empty() => {
                return Err(FlagError::MissingArgument(name.to_string()));
            }
            None => self.args.remove(0),
        };
        self.set(name, &value)?;
        Ok(true)
    }

    fn fail_parse(&mut self, err: FlagError) -> FlagError {
        if !matches!(err, FlagError::Help) {
            let report = format!("{err}\n{}", self.usage());
            if let Err(io_err) = self.write_out(&report) {
                warn!(error = %io_err, "failed to write parse error");
            }
        }
        self.escalate(err)
    }

    fn escalate(&self, err: FlagError) -> FlagError {
        match self.error_handling {
            ErrorHandling::ContinueOnError => err,
            ErrorHandling::ExitOnError => {
                let status = if matches!(err, FlagError::Help) {
                    0
                } else {
                    EXIT_STATUS
                };
                (self.exit)(status)
            }
            ErrorHandling::PanicOnError => panic_any(err),
        }
    }

    /// Apply bound environment variables from the process environment.
    pub fn parse_env(&mut self) -> Result<(), FlagError> {
        self.parse_env_from(&ProcessEnv)
    }

    /// Apply bound environment variables from `env`.
    ///
    /// Unset variables leave their fields untouched. The first value that
    /// fails to parse stops the pass.
    pub fn parse_env_from(&mut self, env: &impl Environment) -> Result<(), FlagError> {
        let mut failure = None;
        for (key, &index) in &self.bindings.env {
            let Some(text) = env.lookup(key) else {
                continue;
            };
            match self.values[index].parse(&text) {
                Ok(()) => debug!(env = %key, value = %text, "applied environment variable"),
                Err(source) => {
                    failure = Some(FlagError::InvalidEnvValue {
                        key: key.clone(),
                        value: text,
                        source,
                    });
                    break;
                }
            }
        }

        let Some(err) = failure else {
            return Ok(());
        };
        if self.error_handling == ErrorHandling::ExitOnError {
            // Exits straight away with status 2; nothing gets a chance to
            // flush beyond this message.
            if let Err(io_err) = self.write_out(&format!("{err}\n")) {
                warn!(error = %io_err, "failed to write environment error");
            }
        }
        Err(self.escalate(err))
    }

    /// Set a registered flag from text, as if it had been given on the
    /// command line.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), FlagError> {
        let index = self
            .formal
            .get(name)
            .map(|flag| flag.value)
            .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))?;
        self.values[index]
            .parse(value)
            .map_err(|source| FlagError::InvalidFlagValue {
                name: name.to_string(),
                value: value.to_string(),
                source,
            })?;
        self.actual.insert(name.to_string());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.formal.get(name)
    }

    /// The handle behind a registered flag.
    pub fn value(&self, name: &str) -> Option<&Value<'a>> {
        self.formal.get(name).map(|flag| &self.values[flag.value])
    }

    /// Call `f` for every registered flag, in name order.
    pub fn visit_all(&self, mut f: impl FnMut(&Flag, &Value<'a>)) {
        for flag in self.formal.values() {
            f(flag, &self.values[flag.value]);
        }
    }

    /// Call `f` for every flag that has been set, in name order.
    pub fn visit(&self, mut f: impl FnMut(&Flag, &Value<'a>)) {
        for flag in self.formal.values() {
            if self.actual.contains(&flag.name) {
                f(flag, &self.values[flag.value]);
            }
        }
    }

    /// Current value of every registered flag, by name.
    pub fn snapshot(&self) -> BTreeMap<String, Scalar> {
        self.formal
            .values()
            .map(|flag| (flag.name.clone(), self.values[flag.value].current()))
            .collect()
    }

    /// Environment keys bound by the last [`bind`](Self::bind), in binding
    /// order.
    pub fn env_keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.env.keys().map(String::as_str)
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Number of flags that have been set.
    pub fn nflag(&self) -> usize {
        self.actual.len()
    }

    /// Arguments left over after flag parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    pub fn narg(&self) -> usize {
        self.args.len()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    use super::*;
    use crate::env::vars;
    use crate::fixtures::test::{CustomInt, ExitCalled, Level, SharedBuf, fake_exit};

    #[derive(Debug, Default)]
    struct TestConf {
        test_bool: bool,
        test_int: isize,
        test_int64: i64,
        test_uint: usize,
        test_uint64: u64,
        test_string: String,
        test_float64: f64,
        test_duration: Duration,
        test_custom: CustomInt,
        test_short: bool,
        non_flag: isize,
    }

    fn test_fields(conf: &mut TestConf) -> Fields<'_> {
        Fields::new()
            .field(Field::new(&mut conf.test_bool).flag("test_bool").usage("bool value"))
            .field(Field::new(&mut conf.test_int).flag("test_int").usage("int value"))
            .field(Field::new(&mut conf.test_int64).flag("test_int64").usage("int64 value"))
            .field(Field::new(&mut conf.test_uint).flag("test_uint").usage("uint value"))
            .field(Field::new(&mut conf.test_uint64).flag("test_uint64").usage("uint64 value"))
            .section()
            .field(Field::new(&mut conf.test_string).flag("test_string").usage("string value"))
            .field(Field::new(&mut conf.test_float64).flag("test_float64").usage("float64 value"))
            .field(
                Field::new(&mut conf.test_duration)
                    .flag("test_duration")
                    .usage("time.Duration value~"),
            )
            .field(Field::custom(&mut conf.test_custom).flag("test_custom").usage("~custom~ value"))
            .field(Field::new(&mut conf.test_short).flag("x").usage("short flag"))
            .field(Field::new(&mut conf.non_flag))
    }

    #[test]
    fn bind_registers_every_flagged_field() {
        let mut conf = TestConf::default();
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags.bind(test_fields(&mut conf)).unwrap();

        let mut names = Vec::new();
        flags.visit_all(|flag, value| {
            names.push(flag.name.clone());
            assert!(value.current().is_zero(), "bad value for {}", flag.name);
        });
        assert_eq!(names.len(), 10);
        assert_eq!(names.first().map(String::as_str), Some("test_bool"));
        assert_eq!(names.last().map(String::as_str), Some("x"));
    }

    #[test]
    fn parse_sets_fields() {
        let mut conf = TestConf::default();
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags.bind(test_fields(&mut conf)).unwrap();
            flags
                .parse([
                    "-test_bool",
                    "-test_duration=1.0s",
                    "-test_custom=23",
                    "--test_string",
                    "a.out",
                    "-test_int64=-3",
                ])
                .unwrap();
            assert_eq!(flags.nflag(), 5);
        }
        assert!(conf.test_bool);
        assert_eq!(conf.test_duration, Duration::from_secs(1));
        assert_eq!(conf.test_custom, CustomInt(23));
        assert_eq!(conf.test_string, "a.out");
        assert_eq!(conf.test_int64, -3);
        assert!(!conf.test_short);
    }

    #[test]
    fn bool_flag_presence_and_absence() {
        let mut set = false;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut set).flag("test_bool")))
                .unwrap();
            flags.parse(["-test_bool"]).unwrap();
        }
        assert!(set);

        let mut unset = false;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut unset).flag("test_bool")))
                .unwrap();
            flags.parse(Vec::<String>::new()).unwrap();
            assert!(flags.parsed());
        }
        assert!(!unset);
    }

    #[test]
    fn bool_flag_with_explicit_value() {
        let mut compress = true;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut compress).flag("z")))
                .unwrap();
            flags.parse(["-z=false", "file"]).unwrap();
            assert_eq!(flags.args(), ["file".to_string()]);
        }
        assert!(!compress);
    }

    #[test]
    fn parsing_stops_at_positional_and_terminator() {
        let mut verbose = false;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags
            .bind(Fields::new().field(Field::new(&mut verbose).flag("v")))
            .unwrap();
        flags.parse(["-v", "input", "-v"]).unwrap();
        assert_eq!(flags.narg(), 2);
        assert_eq!(flags.arg(0), Some("input"));
        assert_eq!(flags.arg(1), Some("-v"));

        flags.parse(["--", "-v"]).unwrap();
        assert_eq!(flags.args(), ["-v".to_string()]);

        flags.parse(["-", "x"]).unwrap();
        assert_eq!(flags.narg(), 2);
    }

    #[test]
    fn unknown_flag_is_reported() {
        let out = SharedBuf::default();
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags.set_output(out.clone());
        flags
            .bind(Fields::new().field(Field::new(&mut port).flag("port")))
            .unwrap();
        let err = flags.parse(["-nope"]).unwrap_err();
        assert!(matches!(err, FlagError::UnknownFlag(ref name) if name == "nope"));
        let written = out.contents();
        assert!(written.starts_with("flag provided but not defined: -nope\n"));
        assert!(written.contains("Usage of program:"));
    }

    #[test]
    fn missing_argument_and_bad_value() {
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags.set_output(SharedBuf::default());
        flags
            .bind(Fields::new().field(Field::new(&mut port).flag("port")))
            .unwrap();
        assert!(matches!(
            flags.parse(["-port"]).unwrap_err(),
            FlagError::MissingArgument(_)
        ));
        match flags.parse(["-port", "http"]).unwrap_err() {
            FlagError::InvalidFlagValue { name, value, source } => {
                assert_eq!(name, "port");
                assert_eq!(value, "http");
                assert_eq!(source.target, "int64");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            flags.parse(["---port=1"]).unwrap_err(),
            FlagError::BadSyntax(_)
        ));
    }

    #[test]
    fn help_prints_usage() {
        let out = SharedBuf::default();
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags.set_output(out.clone());
        flags
            .bind(Fields::new().field(Field::new(&mut port).flag("port").usage("listen port")))
            .unwrap();
        assert!(matches!(flags.parse(["-help"]).unwrap_err(), FlagError::Help));
        assert_eq!(
            out.contents(),
            "Usage of program:\n  -port int\n    \tlisten port\n"
        );
    }

    #[test]
    fn unsupported_type_fails_bind() {
        #[derive(Debug, Default)]
        struct Conf {
            test_int16: i16,
        }
        let mut conf = Conf::default();
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        let err = flags
            .bind(Fields::new().field(Field::new(&mut conf.test_int16).flag("test_int16")))
            .unwrap_err();
        assert_eq!(err.to_string(), "unhandled flag type i16(0)");
    }

    #[test]
    fn bind_and_parse_short_circuits_on_bind_failure() {
        let mut narrow: u8 = 0;
        let mut wide: u64 = 0;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            let fields = Fields::new()
                .field(Field::new(&mut narrow).flag("narrow"))
                .field(Field::new(&mut wide).flag("wide"));
            let err = flags.bind_and_parse(fields, ["-wide=9"]).unwrap_err();
            assert_eq!(err.to_string(), "unhandled flag type u8(0)");
            assert!(flags.lookup("wide").is_none());
            assert!(!flags.parsed());
        }
        assert_eq!(wide, 0);
    }

    #[test]
    fn unsupported_type_panics_with_error_payload() {
        for policy in [ErrorHandling::PanicOnError, ErrorHandling::ExitOnError] {
            let mut narrow: i16 = 0;
            let mut flags = FlagSet::new("program", policy);
            flags.exit = fake_exit;
            let fields = Fields::new().field(Field::new(&mut narrow).flag("narrow"));
            let payload = catch_unwind(AssertUnwindSafe(|| flags.bind(fields))).unwrap_err();
            let err = payload.downcast::<FlagError>().unwrap();
            assert_eq!(err.to_string(), "unhandled flag type i16(0)");
        }
    }

    #[test]
    fn unflagged_fields_are_not_type_checked() {
        let mut narrow: i16 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags
            .bind(Fields::new().field(Field::new(&mut narrow).usage("not bound")))
            .unwrap();
        assert!(flags.bindings.entries.is_empty());
        assert_eq!(flags.values.len(), 0);
    }

    #[test]
    fn redefinition_is_an_error() {
        let mut a = false;
        let mut b = false;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        let err = flags
            .bind(
                Fields::new()
                    .field(Field::new(&mut a).flag("v"))
                    .field(Field::new(&mut b).flag("v")),
            )
            .unwrap_err();
        assert!(matches!(err, FlagError::Redefined(ref name) if name == "v"));
    }

    #[test]
    fn redefined_flag_leaves_env_unbound() {
        let mut a = String::new();
        let mut b = String::from("kept");
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            let err = flags
                .bind(
                    Fields::new()
                        .field(Field::new(&mut a).flag("v"))
                        .field(Field::new(&mut b).flag("v").env("X")),
                )
                .unwrap_err();
            assert!(matches!(err, FlagError::Redefined(ref name) if name == "v"));
            assert_eq!(flags.env_keys().count(), 0);
            assert_eq!(flags.values.len(), 1);
            flags.parse_env_from(&vars([("X", "changed")])).unwrap();
        }
        assert_eq!(b, "kept");
    }

    #[test]
    fn var_registers_prebuilt_handle() {
        let mut rate = 1.5_f64;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags.var(&mut rate, "rate", "sample rate").unwrap();
            assert_eq!(flags.lookup("rate").unwrap().default, Scalar::Float64(1.5));
            flags.parse(["-rate", "0.25"]).unwrap();
            assert_eq!(flags.value("rate").unwrap().render(), "0.25");
        }
        assert_eq!(rate, 0.25);
    }

    #[test]
    fn env_overrides_field() {
        let mut compress = true;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut compress).flag("z").env("COMPRESS")))
                .unwrap();
            flags
                .parse_env_from(&vars([("COMPRESS", "false")]))
                .unwrap();
        }
        assert!(!compress);
    }

    #[test]
    fn env_absent_leaves_field() {
        let mut compress = true;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut compress).flag("z").env("COMPRESS")))
                .unwrap();
            flags.parse_env_from(&vars([("OTHER", "false")])).unwrap();
        }
        assert!(compress);
    }

    #[test]
    fn env_only_field_has_no_flag() {
        let mut token = String::new();
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut token).flag("-").env("TOKEN")))
                .unwrap();
            assert!(flags.lookup("-").is_none());
            assert_eq!(flags.nflag(), 0);
            assert_eq!(flags.env_keys().collect::<Vec<_>>(), ["TOKEN"]);
            flags.parse_env_from(&vars([("TOKEN", "s3cret")])).unwrap();
        }
        assert_eq!(token, "s3cret");
    }

    #[test]
    fn env_then_flags_lets_flags_win() {
        let mut port: u64 = 80;
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut port).flag("port").env("PORT")))
                .unwrap();
            flags.parse_env_from(&vars([("PORT", "8080")])).unwrap();
            flags.parse(["-port=9090"]).unwrap();
        }
        assert_eq!(port, 9090);
    }

    #[test]
    fn duplicate_env_key_last_binding_wins() {
        let mut first = String::new();
        let mut second = String::new();
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(
                    Fields::new()
                        .field(Field::new(&mut first).env("NAME"))
                        .field(Field::new(&mut second).env("NAME")),
                )
                .unwrap();
            flags.parse_env_from(&vars([("NAME", "x")])).unwrap();
        }
        assert_eq!(first, "");
        assert_eq!(second, "x");
    }

    #[test]
    fn rebinding_starts_a_fresh_binding_set() {
        let mut a = String::new();
        let mut b = String::new();
        {
            let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
            flags
                .bind(Fields::new().field(Field::new(&mut a).flag("a").env("A")))
                .unwrap();
            flags
                .bind(Fields::new().field(Field::new(&mut b).flag("b").env("B")))
                .unwrap();
            assert!(flags.lookup("a").is_some());
            assert_eq!(flags.env_keys().collect::<Vec<_>>(), ["B"]);
            flags
                .parse_env_from(&vars([("A", "1"), ("B", "2")]))
                .unwrap();
        }
        assert_eq!(a, "");
        assert_eq!(b, "2");
    }

    #[test]
    fn env_parse_error_is_returned() {
        let mut level = Level::Info;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags
            .bind(Fields::new().field(Field::custom(&mut level).env("LEVEL")))
            .unwrap();
        match flags.parse_env_from(&vars([("LEVEL", "loud")])).unwrap_err() {
            FlagError::InvalidEnvValue { key, value, .. } => {
                assert_eq!(key, "LEVEL");
                assert_eq!(value, "loud");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_parse_error_exits_with_status_two() {
        let out = SharedBuf::default();
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ExitOnError);
        flags.exit = fake_exit;
        flags.set_output(out.clone());
        flags
            .bind(Fields::new().field(Field::new(&mut port).env("PORT")))
            .unwrap();
        let payload = catch_unwind(AssertUnwindSafe(|| {
            flags.parse_env_from(&vars([("PORT", "eighty")]))
        }))
        .unwrap_err();
        assert_eq!(*payload.downcast::<ExitCalled>().unwrap(), ExitCalled(2));
        assert!(out.contents().contains("PORT"));
    }

    #[test]
    fn env_parse_error_panics_with_error_payload() {
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::PanicOnError);
        flags
            .bind(Fields::new().field(Field::new(&mut port).env("PORT")))
            .unwrap();
        let payload = catch_unwind(AssertUnwindSafe(|| {
            flags.parse_env_from(&vars([("PORT", "eighty")]))
        }))
        .unwrap_err();
        let err = payload.downcast::<FlagError>().unwrap();
        assert!(matches!(*err, FlagError::InvalidEnvValue { .. }));
    }

    #[test]
    fn parse_error_exit_statuses() {
        let mut port: i64 = 0;
        let mut flags = FlagSet::new("program", ErrorHandling::ExitOnError);
        flags.exit = fake_exit;
        flags.set_output(SharedBuf::default());
        flags
            .bind(Fields::new().field(Field::new(&mut port).flag("port")))
            .unwrap();

        let payload = catch_unwind(AssertUnwindSafe(|| flags.parse(["-bogus"]))).unwrap_err();
        assert_eq!(*payload.downcast::<ExitCalled>().unwrap(), ExitCalled(2));

        let payload = catch_unwind(AssertUnwindSafe(|| flags.parse(["-h"]))).unwrap_err();
        assert_eq!(*payload.downcast::<ExitCalled>().unwrap(), ExitCalled(0));
    }

    #[test]
    fn visit_reports_only_set_flags() {
        let mut a = false;
        let mut b = false;
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags
            .bind(
                Fields::new()
                    .field(Field::new(&mut a).flag("a"))
                    .field(Field::new(&mut b).flag("b")),
            )
            .unwrap();
        flags.set("b", "true").unwrap();
        let mut seen = Vec::new();
        flags.visit(|flag, value| seen.push((flag.name.clone(), value.render())));
        assert_eq!(seen, [("b".to_string(), "true".to_string())]);
        assert_eq!(flags.lookup("b").unwrap().default, Scalar::Bool(false));
    }

    #[test]
    fn snapshot_lists_current_values() {
        let mut name = String::from("svc");
        let mut timeout = Duration::from_millis(1_500);
        let mut flags = FlagSet::new("program", ErrorHandling::ContinueOnError);
        flags
            .bind(
                Fields::new()
                    .field(Field::new(&mut name).flag("name"))
                    .field(Field::new(&mut timeout).flag("timeout")),
            )
            .unwrap();
        let snapshot = flags.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json, serde_json::json!({"name": "svc", "timeout": "1.5s"}));
    }
}
