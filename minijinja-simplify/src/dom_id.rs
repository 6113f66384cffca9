use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use minijinja::value::Value;
use minijinja::{Environment, Error};

use crate::error::MissingIdentityError;
use crate::model::{Model, ModelType};

/// The shape of a value as far as identifier derivation is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A persisted entity instance.
    Instance {
        /// The name of the entity's type.
        type_name: String,
        /// The developer supplied natural key, undefined if there is none.
        natural_key: Value,
        /// The automatically assigned identity key, `none` if unsaved.
        identity_key: Value,
    },
    /// A persisted entity type rather than an instance of it.
    Type {
        /// The name of the type.
        type_name: String,
    },
    /// Any other value.
    Other,
}

/// Decides what kind of [`Entity`] a value is.
///
/// This is implemented for all functions and closures that take a
/// [`Value`] reference and return an [`Entity`], which makes it easy to
/// teach [`DomId`] about custom objects:
///
/// ```
/// use minijinja::Value;
/// use minijinja_simplify::dom_id::{DomId, Entity};
///
/// let dom_id = DomId::new(|value: &Value| match value.get_attr("uuid") {
///     Ok(uuid) if !uuid.is_undefined() => Entity::Instance {
///         type_name: "Upload".into(),
///         natural_key: Value::UNDEFINED,
///         identity_key: uuid,
///     },
///     _ => Entity::Other,
/// });
/// ```
pub trait Classify: Send + Sync + 'static {
    /// Classifies a single value.
    fn classify(&self, value: &Value) -> Entity;
}

impl<F> Classify for F
where
    F: Fn(&Value) -> Entity + Send + Sync + 'static,
{
    fn classify(&self, value: &Value) -> Entity {
        (self)(value)
    }
}

/// Recognizes [`Model`] and [`ModelType`] objects.
///
/// Everything else is classified as [`Entity::Other`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClassifier;

impl Classify for DefaultClassifier {
    fn classify(&self, value: &Value) -> Entity {
        if let Some(model) = value.downcast_object_ref::<Model>() {
            Entity::Instance {
                type_name: model.type_name().to_string(),
                natural_key: model.natural_key().clone(),
                identity_key: model.pk().clone(),
            }
        } else if let Some(ty) = value.downcast_object_ref::<ModelType>() {
            Entity::Type {
                type_name: ty.name().to_string(),
            }
        } else {
            Entity::Other
        }
    }
}

/// Derives DOM identifiers with a configurable classifier.
///
/// The free [`dom_id`] function uses this with the [`DefaultClassifier`].
/// To plug in a different notion of what a persisted entity is, create a
/// `DomId` with your own [`Classify`] implementation and
/// [`register`](Self::register) it with the environment.
#[derive(Clone)]
pub struct DomId {
    classifier: Arc<dyn Classify>,
}

impl fmt::Debug for DomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomId").finish_non_exhaustive()
    }
}

impl Default for DomId {
    fn default() -> DomId {
        DomId::new(DefaultClassifier)
    }
}

impl DomId {
    /// Creates a deriver that classifies values with `classifier`.
    pub fn new<C: Classify>(classifier: C) -> DomId {
        DomId {
            classifier: Arc::new(classifier),
        }
    }

    /// Derives the identifier for `value`.
    ///
    /// * entity instances become `{type}_{key}` with the lowercased type
    ///   name and the natural key, falling back to the identity key.  If
    ///   neither is set a [`MissingIdentityError`] is returned.
    /// * entity types become `new_{type}`.
    /// * other values use their `to_key` attribute if it is set and
    ///   their string form otherwise.
    ///
    /// A non-empty `prefix` is prepended and separated by an underscore.
    pub fn derive(&self, value: &Value, prefix: &str) -> Result<String, Error> {
        let identifier = match self.classifier.classify(value) {
            Entity::Instance {
                type_name,
                natural_key,
                identity_key,
            } => {
                let key = if natural_key.is_true() {
                    natural_key
                } else if identity_key.is_true() {
                    identity_key
                } else {
                    return Err(MissingIdentityError::new(value.to_string()).into());
                };
                format!("{}_{}", type_name.to_lowercase(), key)
            }
            Entity::Type { type_name } => format!("new_{}", type_name.to_lowercase()),
            Entity::Other => match value.get_attr("to_key") {
                Ok(key) if key.is_true() => key.to_string(),
                _ => value.to_string(),
            },
        };

        if prefix.is_empty() {
            Ok(identifier)
        } else {
            Ok(format!("{}_{}", prefix, identifier))
        }
    }

    /// Registers this deriver as a template function called `name`.
    pub fn register<'source, N>(self, env: &mut Environment<'source>, name: N)
    where
        N: Into<Cow<'source, str>>,
    {
        env.add_function(name, move |value: Value, prefix: Option<Value>| {
            self.derive(&value, &prefix_to_string(prefix))
        });
    }
}

fn prefix_to_string(prefix: Option<Value>) -> String {
    match prefix {
        Some(prefix) if prefix.is_true() => prefix.to_string(),
        _ => String::new(),
    }
}

/// Generates an identifier for an entity instance, an entity type or any
/// other value.
///
/// This is useful for `id` attributes that need to be stable across
/// renders, for instance as targets for partial page updates.  Entity
/// instances produce `{type}_{key}`, entity types `new_{type}` and all
/// other values their `to_key` attribute or their string form.  The
/// optional prefix is prepended with an underscore.
///
/// ```jinja
/// <div id="{{ dom_id(todo) }}">…</div>
/// <form id="{{ dom_id(todo, "edit") }}">…</form>
/// ```
///
/// The result can be reassigned like any other value:
///
/// ```jinja
/// {% set row_id = dom_id(todo) %}
/// ```
///
/// Which values count as entities is decided by the [`DefaultClassifier`];
/// see [`DomId`] to change that.
pub fn dom_id(value: Value, prefix: Option<Value>) -> Result<String, Error> {
    DomId::default().derive(&value, &prefix_to_string(prefix))
}

#[test]
fn test_prefix_to_string() {
    use similar_asserts::assert_eq;

    assert_eq!(prefix_to_string(None), "");
    assert_eq!(prefix_to_string(Some(Value::from(()))), "");
    assert_eq!(prefix_to_string(Some(Value::UNDEFINED)), "");
    assert_eq!(prefix_to_string(Some(Value::from("edit"))), "edit");
    assert_eq!(prefix_to_string(Some(Value::from(42))), "42");
    assert_eq!(prefix_to_string(Some(Value::from(false))), "");
    assert_eq!(prefix_to_string(Some(Value::from(0))), "");
    assert_eq!(prefix_to_string(Some(Value::from(""))), "");
}
