//! Static API key registry.

use std::fmt;

use subtle::{Choice, ConstantTimeEq};

/// Multi-key configuration variable (comma-separated).
pub const API_KEYS_VAR: &str = "API_KEYS";

/// Legacy single-key configuration variable.
pub const API_KEY_VAR: &str = "API_KEY";

/// The set of API keys accepted by the gateway.
///
/// Loaded once at startup and never mutated. An empty registry is a valid
/// (if useless) configuration: no credential will ever authenticate.
#[derive(Clone, Default)]
pub struct KeyRegistry {
    keys: Vec<String>,
}

impl KeyRegistry {
    /// Build a registry from raw keys. Entries are trimmed; empty entries
    /// and duplicates are dropped.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.as_ref().trim();
            if !key.is_empty() && !unique.iter().any(|k| k == key) {
                unique.push(key.to_string());
            }
        }
        Self { keys: unique }
    }

    /// Load the registry from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the registry through an arbitrary variable lookup.
    ///
    /// `API_KEYS` wins when present and non-empty; otherwise the legacy
    /// `API_KEY` value, taken verbatim, becomes a single-entry registry.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(multi) = lookup(API_KEYS_VAR).filter(|v| !v.trim().is_empty()) {
            return Self::new(multi.split(','));
        }
        match lookup(API_KEY_VAR) {
            Some(single) if !single.is_empty() => Self { keys: vec![single] },
            _ => Self::default(),
        }
    }

    /// Whether `candidate` is a registered key.
    ///
    /// Every key is compared in constant time and the scan never exits
    /// early, so response timing does not depend on which key matched.
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = candidate.as_bytes();
        let matched = self
            .keys
            .iter()
            .fold(Choice::from(0), |acc, key| acc | key.as_bytes().ct_eq(candidate));
        matched.into()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("keys", &self.keys.len())
            .finish()
    }
}
