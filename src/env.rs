use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read access to a set of environment variables.
///
/// [`FlagSet::parse_env`](crate::FlagSet::parse_env) reads the process
/// environment; the map implementations let tests and callers pass synthetic
/// data instead.
pub trait Environment {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The process environment. Variables that are unset or not valid unicode
/// are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

/// Build a synthetic environment from key/value pairs.
pub fn vars<'k>(pairs: impl IntoIterator<Item = (&'k str, &'k str)>) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
