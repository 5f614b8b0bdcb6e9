//! Environment variable lookup and `${VAR}` template expansion.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Source of environment variables.
///
/// Production code reads the process environment; tests pass a map.
pub trait EnvSource {
    /// Value of `key`, or `None` when it is not set.
    fn var(&self, key: &str) -> Option<String>;

    /// Whether `key` is set at all (an empty value counts as set).
    fn is_set(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}

/// The live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("placeholder pattern is valid")
});

/// Expand `${NAME}` and `$NAME` placeholders against the process environment.
///
/// Unset variables expand to the empty string. A `$` that does not start a
/// placeholder is left as is.
pub fn expand_env(template: &str) -> String {
    expand_with(template, &ProcessEnv)
}

/// Expand placeholders against an arbitrary [`EnvSource`].
pub fn expand_with<E: EnvSource + ?Sized>(template: &str, env: &E) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env.var(name).unwrap_or_default()
        })
        .into_owned()
}
