//! Usage text.
//!
//! Every flag renders the same way regardless of iteration order:
//!
//! ```text
//!   -x	short flag (default true)
//!   -out filename
//!     	output filename (default "a.out")
//! ```
//!
//! Names short enough to leave room (unnamed booleans of one letter) keep their
//! usage on the same line; everything else moves it to an indented line below.

use std::io;

use crate::flagset::{Bound, FlagSet};
use crate::types::UsageOrder;
use crate::value::{FlagValue, Scalar};

/// Split an explicit placeholder out of a usage string.
///
/// The first name wrapped in `~` or `` ` `` is the placeholder; the delimiters
/// are dropped from the text shown. Without one, the placeholder comes from
/// the value's type.
pub fn unquote_usage(usage: &str, value: &Scalar) -> (String, String) {
    let is_quote = |c: char| c == '~' || c == '`';
    if let Some(start) = usage.find(is_quote) {
        let after = &usage[start + 1..];
        if let Some(len) = after.find(is_quote) {
            let name = &after[..len];
            let shown = format!("{}{name}{}", &usage[..start], &after[len + 1..]);
            return (name.to_string(), shown);
        }
    }
    (value.type_hint().to_string(), usage.to_string())
}

fn render_flag(out: &mut String, name: &str, usage: &str, current: &Scalar, default: &Scalar) {
    let (hint, usage) = unquote_usage(usage, current);

    let mut line = format!("  -{name}");
    if !hint.is_empty() {
        line.push(' ');
        line.push_str(&hint);
    }
    if line.chars().count() <= 4 {
        line.push('\t');
    } else {
        line.push_str("\n    \t");
    }
    line.push_str(&usage);

    if !default.is_zero() {
        let shown = match default {
            Scalar::Text(text) => format!(" (default {})", quote(text)),
            other => format!(" (default {other})"),
        };
        line.push_str(&shown);
    }

    out.push_str(&line);
    out.push('\n');
}

/// Double-quote `text` with C-style escapes: `\n`, `\t` and friends, `\xNN` for
/// other ASCII controls, `\uNNNN` for the rest.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl FlagSet<'_> {
    /// Render the flag list.
    ///
    /// [`UsageOrder::Name`] covers every registered flag with the default it
    /// was registered with. [`UsageOrder::Declaration`] follows the last bound
    /// field list, shows current values as defaults, and turns section breaks
    /// into blank lines; fields bound only to the environment are left out.
    pub fn render_usage(&self, order: UsageOrder) -> String {
        let mut out = String::new();
        match order {
            UsageOrder::Name => {
                for flag in self.formal.values() {
                    let current = self.values[flag.value].current();
                    render_flag(&mut out, &flag.name, &flag.usage, &current, &flag.default);
                }
            }
            UsageOrder::Declaration => {
                for bound in &self.bindings.entries {
                    match bound {
                        Bound::Section => out.push('\n'),
                        Bound::Field(binding) => {
                            let Some(name) = &binding.flag else {
                                continue;
                            };
                            let current = self.values[binding.value].current();
                            render_flag(&mut out, name, &binding.usage, &current, &current);
                        }
                    }
                }
            }
        }
        out
    }

    /// Write the flag list in name order.
    pub fn print_defaults(&mut self) -> io::Result<()> {
        let text = self.render_usage(UsageOrder::Name);
        self.write_out(&text)
    }

    /// Write the flag list in declaration order.
    pub fn print_struct(&mut self) -> io::Result<()> {
        let text = self.render_usage(UsageOrder::Declaration);
        self.write_out(&text)
    }

    /// Capture declaration-order usage now and use it for all later usage
    /// output. Call this before parsing so the text shows the initial
    /// defaults rather than parsed values.
    pub fn use_struct_usage(&mut self) {
        self.struct_usage = Some(self.render_usage(UsageOrder::Declaration));
    }

    /// The full usage message: a header naming the program, then the flag
    /// list.
    pub fn usage(&self) -> String {
        let mut text = if self.name.is_empty() {
            "Usage:\n".to_string()
        } else {
            format!("Usage of {}:\n", self.name)
        };
        match &self.struct_usage {
            Some(cached) => text.push_str(cached),
            None => text.push_str(&self.render_usage(UsageOrder::Name)),
        }
        text
    }

    pub fn print_usage(&mut self) -> io::Result<()> {
        let text = self.usage();
        self.write_out(&text)
    }
}
