//! Environment lookup used as the fallback source of a [`SourceStore`](super::SourceStore).

use std::collections::HashMap;

/// A key/value lookup consulted when a key is missing from the file.
///
/// Keys are passed in their original case.
pub trait EnvLookup: Send + Sync + std::fmt::Debug {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        // Non-unicode values are treated as unset.
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
