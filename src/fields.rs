//! The declarative binding list: which fields of a configuration struct map
//! to which flags and environment variables.
//!
//! ```ignore
//! let fields = Fields::new()
//!     .field(Field::new(&mut conf.compress).flag("z").env("COMPRESS").usage("compress output"))
//!     .field(Field::new(&mut conf.output).flag("out").usage("output ~filename~"))
//!     .section()
//!     .field(Field::custom(&mut conf.level).flag("level").usage("log level"));
//! ```
//!
//! Defaults are whatever the fields hold when the list is bound.

use crate::factory::{FieldRef, Reflect};
use crate::value::FlagValue;

/// Annotation value meaning "do not bind this field for this annotation".
pub const SKIP: &str = "-";

/// One configuration field and its annotations.
pub struct Field<'a> {
    pub(crate) target: FieldRef<'a>,
    pub(crate) flag: Option<String>,
    pub(crate) env: Option<String>,
    pub(crate) usage: String,
}

impl<'a> Field<'a> {
    /// A plain field. Its type is checked against the supported set when the
    /// list is bound.
    pub fn new(field: &'a mut dyn Reflect) -> Self {
        Self::from_ref(FieldRef::Typed(field))
    }

    /// A field that implements [`FlagValue`] itself.
    pub fn custom(field: &'a mut dyn FlagValue) -> Self {
        Self::from_ref(FieldRef::Custom(field))
    }

    fn from_ref(target: FieldRef<'a>) -> Self {
        Self {
            target,
            flag: None,
            env: None,
            usage: String::new(),
        }
    }

    /// Command-line flag name, without dashes.
    pub fn flag(mut self, name: &str) -> Self {
        self.flag = annotation(name);
        self
    }

    /// Environment variable key.
    pub fn env(mut self, key: &str) -> Self {
        self.env = annotation(key);
        self
    }

    /// Help text. A name wrapped in `~` or `` ` `` becomes the placeholder
    /// shown after the flag, e.g. `"output ~filename~"`.
    pub fn usage(mut self, text: &str) -> Self {
        self.usage = text.to_string();
        self
    }
}

fn annotation(value: &str) -> Option<String> {
    match value {
        "" | SKIP => None,
        other => Some(other.to_string()),
    }
}

pub(crate) enum Entry<'a> {
    Field(Field<'a>),
    Section,
}

/// An ordered list of [`Field`]s and section breaks.
#[derive(Default)]
pub struct Fields<'a> {
    pub(crate) entries: Vec<Entry<'a>>,
}

impl<'a> Fields<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field<'a>) -> Self {
        self.entries.push(Entry::Field(field));
        self
    }

    /// A section break: a blank line in declaration-order usage text.
    pub fn section(mut self) -> Self {
        self.entries.push(Entry::Section);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<Field<'a>> for Fields<'a> {
    fn from_iter<I: IntoIterator<Item = Field<'a>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Entry::Field).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_token_clears_annotations() {
        let mut port: i64 = 0;
        let field = Field::new(&mut port).flag(SKIP).env(SKIP);
        assert_eq!(field.flag, None);
        assert_eq!(field.env, None);
    }

    #[test]
    fn empty_annotations_are_unbound() {
        let mut port: i64 = 0;
        let field = Field::new(&mut port).flag("").env("");
        assert_eq!(field.flag, None);
        assert_eq!(field.env, None);
    }

    #[test]
    fn annotations_are_kept() {
        let mut port: i64 = 0;
        let field = Field::new(&mut port)
            .flag("port")
            .env("PORT")
            .usage("listen ~port~");
        assert_eq!(field.flag.as_deref(), Some("port"));
        assert_eq!(field.env.as_deref(), Some("PORT"));
        assert_eq!(field.usage, "listen ~port~");
    }

    #[test]
    fn sections_are_entries() {
        let mut a = false;
        let mut b = false;
        let fields = Fields::new()
            .field(Field::new(&mut a).flag("a"))
            .section()
            .field(Field::new(&mut b).flag("b"));
        assert_eq!(fields.len(), 3);
        assert!(matches!(fields.entries[1], Entry::Section));
    }

    #[test]
    fn collects_from_iterator() {
        let mut a = false;
        let mut b = String::new();
        let fields: Fields<'_> = [Field::new(&mut a).flag("a"), Field::new(&mut b).flag("b")]
            .into_iter()
            .collect();
        assert_eq!(fields.len(), 2);
        assert!(!fields.is_empty());
    }
}
