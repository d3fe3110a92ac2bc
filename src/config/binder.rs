use std::sync::PoisonError;

use super::adapter::{global_adapters, AdapterRegistry};
use super::policy::{resolve, Resolution};
use super::schema::{Coercion, Field, Fields, Schema};
use super::{ConfigError, SourceStore};

/// What happened to one field during a binding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /// A source provided the value.
    Bound,
    /// The field's default was used.
    Defaulted,
    /// The field is ignored and was not touched.
    Skipped,
    /// Optional field with no value and no default; left as it was.
    Missing,
}

/// Per-field outcomes of a successful binding pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingReport {
    outcomes: Vec<(String, BindingOutcome)>,
}

impl BindingReport {
    pub fn outcome(&self, field: &str) -> Option<BindingOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, outcome)| *outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BindingOutcome)> {
        self.outcomes.iter().map(|(name, outcome)| (name.as_str(), *outcome))
    }

    /// Fields that were left unset because no value was found.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, outcome)| *outcome == BindingOutcome::Missing)
            .map(|(name, _)| name)
    }
}

type Assignment<'f, S> = Box<dyn FnOnce(&mut S) + 'f>;

/// Binds values from a [`SourceStore`] onto the fields of a schema.
///
/// Fields are resolved and coerced in declaration order. The first failure
/// ends the pass and the target is left untouched: values are only assigned
/// once every field has been converted.
///
/// Built-in coercions:
///
/// - `bool` is `true` iff the value equals `"true"` ignoring ASCII case;
///   anything else is `false`, never an error.
/// - `i32` and `i64` parse the value as-is: an optional sign, then digits.
/// - `f64` trims surrounding whitespace, then parses decimal or exponent
///   notation. `inf` and `NaN` are accepted; type suffixes such as `1.5d` or
///   `1f` and hexadecimal floats are not.
/// - `String` is assigned verbatim.
///
/// Other types are converted by an adapter. Adapters come from the registry given to
/// [`with_adapters`](Self::with_adapters), or from the process-wide registry
/// if none was given.
///
/// ## Example
///
/// ```
/// use flatconf::{Binder, Fields, SourceStore};
///
/// #[derive(Default)]
/// struct Server {
///     port: i32,
///     debug: bool,
/// }
///
/// let store = SourceStore::parse("port=8080");
/// let mut fields = Fields::<Server>::new();
/// fields.int("port", |s, v| s.port = v).required();
/// fields.boolean("debug", |s, v| s.debug = v).default("false");
///
/// let mut server = Server::default();
/// Binder::new(&store).bind(&mut server, &fields)?;
/// assert_eq!(server.port, 8080);
/// # Ok::<(), flatconf::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy)]
#[must_use = "a binder does nothing until .bind() is called"]
pub struct Binder<'a> {
    store: &'a SourceStore,
    adapters: Option<&'a AdapterRegistry>,
}

impl<'a> Binder<'a> {
    pub fn new(store: &'a SourceStore) -> Self {
        Self {
            store,
            adapters: None,
        }
    }

    /// Uses `adapters` instead of the process-wide registry.
    pub fn with_adapters(mut self, adapters: &'a AdapterRegistry) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Binds every field in `fields` onto `target`.
    pub fn bind<S>(
        &self,
        target: &mut S,
        fields: &Fields<S>,
    ) -> Result<BindingReport, ConfigError> {
        match self.adapters {
            Some(adapters) => self.bind_with(target, fields, adapters),
            None => {
                // Not held while adapters run: they may register adapters themselves.
                let adapters = global_adapters()
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                self.bind_with(target, fields, &adapters)
            }
        }
    }

    /// Binds a [`Schema`] using its own field table.
    pub fn bind_schema<S: Schema>(&self, target: &mut S) -> Result<BindingReport, ConfigError> {
        self.bind(target, &S::field_table())
    }

    /// Builds a schema from its default value and binds it.
    pub fn build<S: Schema + Default>(&self) -> Result<S, ConfigError> {
        let mut target = S::default();
        self.bind_schema(&mut target)?;
        Ok(target)
    }

    /// Like [`bind`](Self::bind), but logs the error and exits the process
    /// with status 1 on failure.
    pub fn bind_or_exit<S>(&self, target: &mut S, fields: &Fields<S>) -> BindingReport {
        match self.bind(target, fields) {
            Ok(report) => report,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    }

    fn bind_with<S>(
        &self,
        target: &mut S,
        fields: &Fields<S>,
        adapters: &AdapterRegistry,
    ) -> Result<BindingReport, ConfigError> {
        let mut report = BindingReport::default();
        let mut assignments = Vec::with_capacity(fields.len());

        for field in fields.iter() {
            let (key, raw, outcome) = match resolve(field.name(), field.policy(), self.store) {
                Resolution::Skipped => {
                    report.outcomes.push((field.name().to_string(), BindingOutcome::Skipped));
                    continue;
                }
                Resolution::Missing { key } => {
                    log::warn!(
                        "no value found for field '{}' (key '{key}'), leaving it unset",
                        field.name()
                    );
                    report.outcomes.push((field.name().to_string(), BindingOutcome::Missing));
                    continue;
                }
                Resolution::MissingRequired { key } => {
                    return Err(ConfigError::MissingRequired {
                        field: field.name().to_string(),
                        key,
                    });
                }
                Resolution::Found { key, raw } => (key, raw, BindingOutcome::Bound),
                Resolution::Defaulted { key, raw } => (key, raw, BindingOutcome::Defaulted),
            };

            let assignment = self.coerce(field, &key, &raw, adapters)?;
            assignments.push((field, assignment));
            report.outcomes.push((field.name().to_string(), outcome));
        }

        for (field, assign) in assignments {
            assign(target);
            log::debug!("bound field '{}'", field.name());
        }

        Ok(report)
    }

    fn coerce<'f, S>(
        &self,
        field: &'f Field<S>,
        key: &str,
        raw: &str,
        adapters: &AdapterRegistry,
    ) -> Result<Assignment<'f, S>, ConfigError> {
        let conversion = |reason: String| ConfigError::Conversion {
            field: field.name().to_string(),
            key: key.to_string(),
            value: raw.to_string(),
            reason,
        };

        let assignment: Assignment<'f, S> = match field.coercion() {
            Coercion::Bool(set) => {
                let (set, value) = (*set, raw.eq_ignore_ascii_case("true"));
                Box::new(move |target: &mut S| set(target, value))
            }
            Coercion::Int(set) => {
                let value = raw.parse::<i32>().map_err(|e| conversion(e.to_string()))?;
                let set = *set;
                Box::new(move |target: &mut S| set(target, value))
            }
            Coercion::Long(set) => {
                let value = raw.parse::<i64>().map_err(|e| conversion(e.to_string()))?;
                let set = *set;
                Box::new(move |target: &mut S| set(target, value))
            }
            Coercion::Double(set) => {
                let value = raw.trim().parse::<f64>().map_err(|e| conversion(e.to_string()))?;
                let set = *set;
                Box::new(move |target: &mut S| set(target, value))
            }
            Coercion::Str(set) => {
                let (set, value) = (*set, raw.to_string());
                Box::new(move |target: &mut S| set(target, value))
            }
            Coercion::Adapted {
                type_id,
                type_name,
                prepare,
            } => {
                let adapter = adapters.resolve(*type_id).ok_or_else(|| ConfigError::NoAdapter {
                    field: field.name().to_string(),
                    type_name: *type_name,
                })?;
                let value = adapter.adapt(key, raw, self.store).map_err(conversion)?;
                prepare(value).ok_or_else(|| {
                    conversion(format!("adapter did not produce a {type_name}"))
                })?
            }
        };

        Ok(assignment)
    }
}
