//! File-backed key/value store.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use super::env::{EnvLookup, ProcessEnv};
use super::ConfigError;

/// Raw key/value pairs read from a configuration file.
///
/// Keys are lowercased on ingestion and on lookup, so `get("Port")` and
/// `get("PORT")` find the same entry. When a key is missing and environment
/// fallback is enabled (the default), the environment is queried with the
/// key exactly as given.
///
/// ## File format
///
/// ```text
/// # comment
/// port=8080
/// url=postgres://db?sslmode=require
/// ```
///
/// A line is an entry if it contains `=` and does not start with `#`. Only
/// the first `=` separates key and value. Other lines are ignored.
#[derive(Debug, Clone)]
pub struct SourceStore {
    entries: IndexMap<String, String>,
    allow_environment_fallback: bool,
    env: Arc<dyn EnvLookup>,
}

impl Default for SourceStore {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            allow_environment_fallback: true,
            env: Arc::new(ProcessEnv),
        }
    }
}

impl SourceStore {
    /// Creates an empty store backed only by the environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a file.
    ///
    /// A missing file yields an empty store. Any other I/O error is returned
    /// as [`ConfigError::FileLoad`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let store = Self::parse(&contents);
                log::debug!("loaded {} entries from {}", store.len(), path.display());
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist, using environment only", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(ConfigError::FileLoad {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Like [`load`](Self::load), but logs the error and exits the process
    /// with status 1 if the file cannot be read.
    pub fn load_or_exit(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    }

    /// Parses file contents into a store.
    pub fn parse(contents: &str) -> Self {
        contents.lines().filter_map(parse_line).collect()
    }

    /// Replaces the environment used for fallback lookups.
    pub fn with_env(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Enables or disables the environment fallback.
    pub fn set_environment_fallback(&mut self, allow: bool) -> &mut Self {
        self.allow_environment_fallback = allow;
        self
    }

    pub fn environment_fallback(&self) -> bool {
        self.allow_environment_fallback
    }

    /// Looks up a raw value, falling back to the environment if enabled.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.entries.get(&key.to_lowercase()) {
            return Some(value.clone());
        }

        if self.allow_environment_fallback {
            return self.env.lookup(key);
        }

        None
    }

    /// Returns `true` if the file itself defined `key`. The environment is not consulted.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Iterates file entries in the order their keys first appeared.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SourceStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.entries.insert(key.as_ref().to_lowercase(), value.into());
        }
        store
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with('#') {
        return None;
    }
    line.split_once('=')
}
