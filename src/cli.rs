//! Clap adapter for flagbind.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Apps that
//! already parse their command line with [clap](https://docs.rs/clap) can
//! still describe configuration through a [`Fields`](crate::Fields) list:
//! [`FlagSet::command()`] turns the bound flags into a [`Command`], and
//! [`FlagSet::apply_matches()`] writes what the user typed back into the
//! configuration fields.
//!
//! Flags become long options (`--name`). Boolean handles become switches;
//! everything else takes a single value whose placeholder is the same type
//! hint the built-in usage text shows.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::error::FlagError;
use crate::flagset::FlagSet;
use crate::usage::unquote_usage;
use crate::value::FlagValue;

impl FlagSet<'_> {
    /// Build a clap [`Command`] with one argument per registered flag.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone());
        if self.formal.contains_key("help") {
            command = command.disable_help_flag(true);
        }

        for flag in self.formal.values() {
            let value = &self.values[flag.value];
            let (hint, usage) = unquote_usage(&flag.usage, &value.current());
            let arg = Arg::new(flag.name.clone())
                .long(flag.name.clone())
                .help(usage);
            let arg = if value.is_bool_flag() {
                arg.action(ArgAction::SetTrue)
            } else {
                let placeholder = if hint.is_empty() { "value".to_string() } else { hint };
                arg.action(ArgAction::Set)
                    .value_name(placeholder.to_uppercase())
            };
            command = command.arg(arg);
        }
        command
    }

    /// Copy every flag given on the command line into its field.
    ///
    /// Arguments clap filled from defaults are ignored, so fields keep
    /// whatever the environment or earlier parsing put there.
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), FlagError> {
        let flags: Vec<(String, bool)> = self
            .formal
            .values()
            .map(|flag| (flag.name.clone(), self.values[flag.value].is_bool_flag()))
            .collect();

        for (name, is_bool) in flags {
            if matches.value_source(&name) != Some(ValueSource::CommandLine) {
                continue;
            }
            let text = if is_bool {
                "true".to_string()
            } else {
                match matches.get_one::<String>(&name) {
                    Some(text) => text.clone(),
                    None => continue,
                }
            };
            self.set(&name, &text)?;
        }
        Ok(())
    }
}
