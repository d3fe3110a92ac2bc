//! Configuration loading and binding.

mod adapter;
mod binder;
mod env;
mod error;
mod policy;
mod schema;
mod store;

pub use adapter::{global_adapters, register_global, AdapterRegistry, TypeAdapter};
pub use binder::{Binder, BindingOutcome, BindingReport};
pub use env::{EnvLookup, ProcessEnv};
pub use error::ConfigError;
pub use policy::{resolve, FieldPolicy, Resolution};
pub use schema::{Coercion, Field, Fields, PrepareAny, Schema};
pub use store::SourceStore;
