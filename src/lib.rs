//! Bind configuration fields to command-line flags and environment variables.
//!
//! Flagbind takes a list of borrowed configuration fields, each annotated with
//! an optional flag name, an optional environment variable and a usage line,
//! and registers them on a [`FlagSet`]. Parsing the command line or the
//! environment then writes straight into your fields.
//!
//! ```ignore
//! let mut config = Config { port: 8080, verbose: false };
//! let mut flags = FlagSet::new("myapp", ErrorHandling::ExitOnError);
//! flags.bind(
//!     Fields::new()
//!         .field(Field::new(&mut config.port).flag("port").env("MYAPP_PORT").usage("listen ~port~"))
//!         .field(Field::new(&mut config.verbose).flag("v").usage("talk more")),
//! )?;
//! flags.parse_env()?;
//! flags.parse_process_args()?;
//! drop(flags);
//! ```
//!
//! # Fields
//!
//! A [`Field`] wraps a mutable reference to one configuration value. The
//! supported types are `bool`, `isize`, `i64`, `usize`, `u64`, `f64`,
//! `String` and [`std::time::Duration`]; anything else can take part by
//! implementing [`FlagValue`] and going through [`Field::custom`].
//!
//! An empty flag name or env key, or the [`SKIP`] token `"-"`, means "not
//! bound". Fields with neither are ignored, whatever their type. A bound
//! field of an unsupported type fails with
//! [`FlagError::UnhandledType`], naming the type and its current value.
//!
//! [`Fields::section`] marks a break between groups of fields. It has no
//! effect on parsing; declaration-order usage text renders it as a blank
//! line.
//!
//! # Value handles
//!
//! Binding wraps each field in a [`Value`], a typed handle that renders,
//! parses and snapshots the field it points at. [`value_from_ref`] is the
//! factory behind this, exposed for callers that work with field references
//! directly.
//!
//! Parsing accepts what a shell user would type: `1`, `t`, `TRUE` and
//! friends for booleans; `0x`, `0o`, `0b` and leading-zero octal prefixes for
//! integers; `1h30m`, `250ms`, `1.5s` for durations.
//!
//! # Precedence
//!
//! There is no layering logic. Each pass writes into the same fields, so the
//! last pass wins. The usual order is environment first, then command line:
//!
//! ```text
//! Field initializers    whatever the struct held before binding
//!        ↑ overwritten by
//! Environment vars      parse_env()
//!        ↑ overwritten by
//! Command line          parse() / parse_process_args()
//! ```
//!
//! # Usage text
//!
//! [`FlagSet::usage`] produces a `Usage of <name>:` header followed by one
//! entry per flag. By default flags are listed in name order with their
//! registration-time defaults. [`FlagSet::use_struct_usage`] switches to
//! declaration order, capturing the text at the moment it is called.
//!
//! A back-quoted (or `~`-quoted) word in the usage line becomes the value
//! placeholder: `"listen ~port~"` renders as `-port port` followed by
//! `listen port`. See [`unquote_usage`].
//!
//! # Error handling
//!
//! Every fallible operation returns [`FlagError`]. What happens beyond that
//! depends on the set's [`ErrorHandling`]:
//!
//! - **`ContinueOnError`**: the error is returned.
//! - **`ExitOnError`**: parse and environment errors print a message and exit
//!   with [`EXIT_STATUS`] (`-h` exits with 0); bind errors panic, since they
//!   are programming mistakes.
//! - **`PanicOnError`**: the error becomes the panic payload.
//!
//! # Clap adapter
//!
//! With the `clap` Cargo feature (on by default),
//! [`FlagSet::command`] builds a clap `Command` from the registered flags
//! and [`FlagSet::apply_matches`] writes the matched values back. To use
//! flagbind without clap:
//!
//! ```toml
//! flagbind = { version = "...", default-features = false }
//! ```

pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod duration;
mod env;
mod factory;
mod fields;
mod flagset;
mod usage;
mod value;

#[cfg(test)]
mod fixtures;

pub use duration::{format_duration, parse_duration};
pub use env::{Environment, ProcessEnv, vars};
pub use error::{FlagError, ParseError, TypeDescription};
pub use factory::{FieldRef, Reflect, value_from_ref};
pub use fields::{Field, Fields, SKIP};
pub use flagset::{EXIT_STATUS, Flag, FlagSet};
pub use types::{ErrorHandling, UsageOrder};
pub use usage::unquote_usage;
pub use value::{FlagValue, Scalar, Value, parse_bool, parse_signed, parse_unsigned};
