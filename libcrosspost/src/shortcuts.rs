//! Username-shortcut registry
//!
//! Destinations register the shortcut keys they expand, mapping each key to a
//! profile-URL template (`$1` stands in for the username). The description
//! pipeline substitutes every registered shortcut, regardless of which
//! destination a task posts to, so cross-site mentions keep working.

use std::collections::HashMap;

/// One shortcut: `:key<name>:` tokens expand to a profile link built from
/// `url` with `$1` replaced by the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameShortcut {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    by_destination: HashMap<String, Vec<UsernameShortcut>>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, destination: &str, key: &str, url: &str) {
        self.by_destination
            .entry(destination.to_string())
            .or_default()
            .push(UsernameShortcut {
                key: key.to_string(),
                url: url.to_string(),
            });
    }

    pub fn for_destination(&self, destination: &str) -> &[UsernameShortcut] {
        self.by_destination
            .get(destination)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every registered shortcut across all destinations.
    pub fn iter_all(&self) -> impl Iterator<Item = &UsernameShortcut> {
        self.by_destination.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.by_destination.is_empty()
    }
}
