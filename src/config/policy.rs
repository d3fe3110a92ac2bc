//! Per-field lookup policy.

use super::SourceStore;

/// How a field finds its value.
///
/// The four facets are independent. When the lookup misses, `required`
/// wins over `default`: a required field is never satisfied by its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicy {
    pub ignored: bool,
    pub rename: Option<String>,
    pub default: Option<String>,
    pub required: bool,
}

impl FieldPolicy {
    /// The key used against the store: the rename if present, else `name`.
    pub fn effective_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.rename.as_deref().unwrap_or(name)
    }
}

/// Where a field's raw value came from, or why there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Skipped,
    Found { key: String, raw: String },
    Defaulted { key: String, raw: String },
    MissingRequired { key: String },
    Missing { key: String },
}

/// Resolves the raw value of field `name` under `policy`.
pub fn resolve(name: &str, policy: &FieldPolicy, store: &SourceStore) -> Resolution {
    if policy.ignored {
        return Resolution::Skipped;
    }

    let key = policy.effective_key(name).to_string();
    if let Some(raw) = store.get(&key) {
        return Resolution::Found { key, raw };
    }

    if policy.required {
        return Resolution::MissingRequired { key };
    }

    match &policy.default {
        Some(raw) => Resolution::Defaulted {
            key,
            raw: raw.clone(),
        },
        None => Resolution::Missing { key },
    }
}
