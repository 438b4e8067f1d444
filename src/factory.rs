//! Runtime selection of a [`Value`] handle for a field of unknown type.

use std::any::{Any, type_name};
use std::fmt;
use std::time::Duration;

use crate::error::{FlagError, TypeDescription};
use crate::value::{FlagValue, Value};

/// A field reference whose concrete type is only known at runtime.
///
/// Blanket-implemented for every `'static + Debug` type, so any plain field
/// can be offered to the factory; the `Debug` rendering only shows up in the
/// error for unsupported types.
pub trait Reflect: Any + fmt::Debug {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug> Reflect for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// What a [`Field`](crate::Field) points at.
pub enum FieldRef<'a> {
    /// A plain field, matched against the built-in types.
    Typed(&'a mut dyn Reflect),
    /// A field that already implements the handle contract.
    Custom(&'a mut dyn FlagValue),
}

macro_rules! downcast {
    ($any:ident; $($ty:ty => $variant:ident),* $(,)?) => {
        $(
            if $any.is::<$ty>() {
                return $any
                    .downcast_mut::<$ty>()
                    .map(Value::$variant)
                    .ok_or(FlagError::UnhandledType(None));
            }
        )*
    };
}

/// Build the handle for `target`.
///
/// Built-in types get their matching [`Value`] variant and custom handles pass
/// through unchanged. Everything else, including a missing reference, fails
/// with [`FlagError::UnhandledType`].
pub fn value_from_ref(target: Option<FieldRef<'_>>) -> Result<Value<'_>, FlagError> {
    let field = match target {
        None => return Err(FlagError::UnhandledType(None)),
        Some(FieldRef::Custom(value)) => return Ok(Value::Custom(value)),
        Some(FieldRef::Typed(field)) => field,
    };

    let description = TypeDescription {
        type_name: Reflect::type_name(&*field),
        value: format!("{field:?}"),
    };

    let any = Reflect::as_any_mut(field);
    downcast! {
        any;
        bool => Bool,
        isize => Int,
        i64 => Int64,
        usize => Uint,
        u64 => Uint64,
        f64 => Float64,
        String => Text,
        Duration => Duration,
    }

    Err(FlagError::UnhandledType(Some(description)))
}
