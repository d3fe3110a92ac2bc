//! Bind flat `key=value` configuration files onto typed structs.
//!
//! A [`SourceStore`] holds the raw values of one file, falling back to the
//! environment for keys the file does not define. A [`Binder`] walks a
//! schema's [`Fields`] in order, coercing each raw value to the field's type
//! and applying its ignore, rename, default and required policy.

pub mod config;

pub use config::{
    global_adapters, register_global, AdapterRegistry, Binder, BindingOutcome, BindingReport,
    Coercion, ConfigError, EnvLookup, Field, FieldPolicy, Fields, ProcessEnv, Schema, SourceStore,
    TypeAdapter,
};
