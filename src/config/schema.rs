//! Field descriptor tables.

use std::any::{Any, TypeId};
use std::fmt;

use super::policy::FieldPolicy;

/// Turns a type-erased adapter result into a setter for the field, or `None`
/// if the value is not of the field's type.
pub type PrepareAny<S> =
    Box<dyn Fn(Box<dyn Any + Send>) -> Option<Box<dyn FnOnce(&mut S)>> + Send + Sync>;

/// How a raw string becomes a field value, and how that value is stored.
pub enum Coercion<S> {
    Bool(fn(&mut S, bool)),
    Int(fn(&mut S, i32)),
    Long(fn(&mut S, i64)),
    Double(fn(&mut S, f64)),
    Str(fn(&mut S, String)),
    /// Converted by the adapter registered for `type_id`.
    Adapted {
        type_id: TypeId,
        type_name: &'static str,
        prepare: PrepareAny<S>,
    },
}

impl<S> Coercion<S> {
    /// A field of type `T`, converted by whichever adapter is registered for `T`.
    pub fn adapted<T: Any + Send>(set: fn(&mut S, T)) -> Self
    where
        S: 'static,
    {
        Coercion::Adapted {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            prepare: Box::new(
                move |value: Box<dyn Any + Send>| -> Option<Box<dyn FnOnce(&mut S)>> {
                    let value = *value.downcast::<T>().ok()?;
                    Some(Box::new(move |target: &mut S| set(target, value)))
                },
            ),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Coercion::Bool(_) => "bool",
            Coercion::Int(_) => "i32",
            Coercion::Long(_) => "i64",
            Coercion::Double(_) => "f64",
            Coercion::Str(_) => "String",
            Coercion::Adapted { type_name, .. } => *type_name,
        }
    }
}

impl<S> fmt::Debug for Coercion<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One bindable field: its declared name, policy and coercion.
#[derive(Debug)]
pub struct Field<S> {
    name: String,
    policy: FieldPolicy,
    coercion: Coercion<S>,
}

impl<S> Field<S> {
    pub fn new(name: impl Into<String>, coercion: Coercion<S>) -> Self {
        Self {
            name: name.into(),
            policy: FieldPolicy::default(),
            coercion,
        }
    }

    /// Leaves the field untouched during binding.
    pub fn ignored(&mut self) -> &mut Self {
        self.policy.ignored = true;
        self
    }

    /// Looks the field up under `key` instead of its declared name.
    pub fn rename(&mut self, key: impl Into<String>) -> &mut Self {
        self.policy.rename = Some(key.into());
        self
    }

    /// Raw value used when no source provides one. Coerced like any other value.
    pub fn default(&mut self, raw: impl Into<String>) -> &mut Self {
        self.policy.default = Some(raw.into());
        self
    }

    /// Fails binding when no source provides a value.
    pub fn required(&mut self) -> &mut Self {
        self.policy.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn coercion(&self) -> &Coercion<S> {
        &self.coercion
    }
}

/// The ordered field table of a schema `S`.
///
/// ```
/// use flatconf::Fields;
///
/// #[derive(Default)]
/// struct Server {
///     port: i32,
///     name: String,
/// }
///
/// let mut fields = Fields::<Server>::new();
/// fields.int("port", |s, v| s.port = v).required();
/// fields.string("name", |s, v| s.name = v).rename("SERVICE_NAME");
/// assert_eq!(fields.len(), 2);
/// ```
#[derive(Debug)]
pub struct Fields<S> {
    fields: Vec<Field<S>>,
}

impl<S> Default for Fields<S> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<S> Fields<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns it for policy configuration.
    pub fn push(&mut self, field: Field<S>) -> &mut Field<S> {
        self.fields.push(field);
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    pub fn boolean(&mut self, name: impl Into<String>, set: fn(&mut S, bool)) -> &mut Field<S> {
        self.push(Field::new(name, Coercion::Bool(set)))
    }

    pub fn int(&mut self, name: impl Into<String>, set: fn(&mut S, i32)) -> &mut Field<S> {
        self.push(Field::new(name, Coercion::Int(set)))
    }

    pub fn long(&mut self, name: impl Into<String>, set: fn(&mut S, i64)) -> &mut Field<S> {
        self.push(Field::new(name, Coercion::Long(set)))
    }

    pub fn double(&mut self, name: impl Into<String>, set: fn(&mut S, f64)) -> &mut Field<S> {
        self.push(Field::new(name, Coercion::Double(set)))
    }

    pub fn string(&mut self, name: impl Into<String>, set: fn(&mut S, String)) -> &mut Field<S> {
        self.push(Field::new(name, Coercion::Str(set)))
    }

    pub fn adapted<T: Any + Send>(
        &mut self,
        name: impl Into<String>,
        set: fn(&mut S, T),
    ) -> &mut Field<S>
    where
        S: 'static,
    {
        self.push(Field::new(name, Coercion::adapted(set)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<S>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A struct that declares its own field table.
pub trait Schema {
    fn fields(fields: &mut Fields<Self>)
    where
        Self: Sized;

    /// Builds the field table.
    fn field_table() -> Fields<Self>
    where
        Self: Sized,
    {
        let mut fields = Fields::new();
        Self::fields(&mut fields);
        fields
    }
}
