//! Conversion functions for field types without a built-in coercion.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::SourceStore;

/// Converts a raw string into a value of one specific type.
///
/// `key` is the effective lookup key of the field being bound. The active
/// store is passed along so an adapter can read related keys.
pub trait TypeAdapter: Send + Sync {
    fn adapt(&self, key: &str, raw: &str, store: &SourceStore)
        -> Result<Box<dyn Any + Send>, String>;

    /// Name of the produced type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

struct FnAdapter<T, F> {
    func: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, E, F> TypeAdapter for FnAdapter<T, F>
where
    T: Any + Send,
    E: fmt::Display,
    F: Fn(&str, &str, &SourceStore) -> Result<T, E> + Send + Sync,
{
    fn adapt(
        &self,
        key: &str,
        raw: &str,
        store: &SourceStore,
    ) -> Result<Box<dyn Any + Send>, String> {
        (self.func)(key, raw, store)
            .map(|value| Box::new(value) as Box<dyn Any + Send>)
            .map_err(|e| e.to_string())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[derive(Deserialize)]
struct Inline<T> {
    value: T,
}

/// Adapters keyed by the type they produce. At most one adapter per type;
/// registering again replaces the previous one.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<TypeId, Arc<dyn TypeAdapter>>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.adapters.values().map(|a| a.type_name()))
            .finish()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a conversion function for `T`.
    ///
    /// ```
    /// use std::time::Duration;
    /// use flatconf::AdapterRegistry;
    ///
    /// let mut adapters = AdapterRegistry::new();
    /// adapters.register(|_key, raw, _store| {
    ///     raw.trim_end_matches('s')
    ///         .parse::<u64>()
    ///         .map(Duration::from_secs)
    /// });
    /// assert!(adapters.contains::<Duration>());
    /// ```
    pub fn register<T, E, F>(&mut self, func: F) -> &mut Self
    where
        T: Any + Send,
        E: fmt::Display + 'static,
        F: Fn(&str, &str, &SourceStore) -> Result<T, E> + Send + Sync + 'static,
    {
        self.register_adapter(
            TypeId::of::<T>(),
            Arc::new(FnAdapter {
                func,
                _marker: PhantomData,
            }),
        )
    }

    /// Registers an adapter that reads the raw value as a TOML value and
    /// deserializes it into `T`.
    ///
    /// Useful for list or table shaped fields, e.g. `hosts=["a", "b"]`.
    pub fn register_toml<T>(&mut self) -> &mut Self
    where
        T: DeserializeOwned + Any + Send,
    {
        self.register(|_key, raw, _store| {
            toml::from_str::<Inline<T>>(&format!("value = {raw}")).map(|inline| inline.value)
        })
    }

    /// Registers an adapter under an explicit type identifier.
    ///
    /// The adapter must produce values of the type `type_id` identifies;
    /// binding reports a conversion error otherwise.
    pub fn register_adapter(
        &mut self,
        type_id: TypeId,
        adapter: Arc<dyn TypeAdapter>,
    ) -> &mut Self {
        if self.adapters.insert(type_id, adapter).is_some() {
            log::debug!("replaced adapter for {type_id:?}");
        }
        self
    }

    pub fn resolve(&self, type_id: TypeId) -> Option<&Arc<dyn TypeAdapter>> {
        self.adapters.get(&type_id)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.adapters.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

static GLOBAL_ADAPTERS: OnceLock<RwLock<AdapterRegistry>> = OnceLock::new();

/// The process-wide adapter registry.
///
/// Used by a [`Binder`](super::Binder) that was not given its own registry.
/// Register adapters at startup, before binding.
pub fn global_adapters() -> &'static RwLock<AdapterRegistry> {
    GLOBAL_ADAPTERS.get_or_init(|| RwLock::new(AdapterRegistry::new()))
}

/// Registers a conversion function for `T` in the process-wide registry.
pub fn register_global<T, E, F>(func: F)
where
    T: Any + Send,
    E: fmt::Display + 'static,
    F: Fn(&str, &str, &SourceStore) -> Result<T, E> + Send + Sync + 'static,
{
    global_adapters()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(func);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn adapt<T: Any>(registry: &AdapterRegistry, raw: &str) -> Result<T, String> {
        let store = SourceStore::new();
        let adapter = registry.resolve(TypeId::of::<T>()).expect("adapter registered");
        adapter
            .adapt("key", raw, &store)
            .map(|boxed| *boxed.downcast::<T>().unwrap())
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = AdapterRegistry::new();
        registry.register(|_, raw, _| raw.parse::<u64>().map(Duration::from_secs));

        assert_eq!(adapt::<Duration>(&registry, "30").unwrap(), Duration::from_secs(30));
        assert!(registry.resolve(TypeId::of::<String>()).is_none());
    }

    #[test]
    fn test_adapter_failure_is_reported() {
        let mut registry = AdapterRegistry::new();
        registry.register(|_, raw, _| raw.parse::<u64>().map(Duration::from_secs));

        assert!(adapt::<Duration>(&registry, "soon").is_err());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut registry = AdapterRegistry::new();
        registry.register(|_, _, _| Ok::<_, String>(Duration::from_secs(1)));
        registry.register(|_, _, _| Ok::<_, String>(Duration::from_secs(2)));

        assert_eq!(registry.len(), 1);
        assert_eq!(adapt::<Duration>(&registry, "").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_adapter_sees_key_and_store() {
        let mut registry = AdapterRegistry::new();
        registry.register(|key, raw, store| {
            let unit = store.get(&format!("{key}_unit")).unwrap_or_default();
            Ok::<_, String>(format!("{raw}{unit}"))
        });
        let store = SourceStore::parse("timeout_unit=ms");

        let boxed = registry
            .resolve(TypeId::of::<String>())
            .unwrap()
            .adapt("timeout", "250", &store)
            .unwrap();
        let value = *boxed.downcast::<String>().unwrap();

        assert_eq!(value, "250ms");
    }

    #[test]
    fn test_toml_adapter() {
        let mut registry = AdapterRegistry::new();
        registry.register_toml::<Vec<String>>();

        assert_eq!(
            adapt::<Vec<String>>(&registry, r#"["a", "b"]"#).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(adapt::<Vec<String>>(&registry, "[1, 2").is_err());
    }

    #[test]
    fn test_debug_lists_type_names() {
        let mut registry = AdapterRegistry::new();
        registry.register_toml::<Vec<u16>>();

        assert!(format!("{registry:?}").contains("Vec<u16>"));
    }
}
