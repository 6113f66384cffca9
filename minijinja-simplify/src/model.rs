use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use minijinja::value::{Enumerator, Object, ObjectRepr, Value, ValueKind};
use minijinja::{Error, ErrorKind};
use serde::Serialize;

/// A persisted entity instance as seen by templates.
///
/// A model carries the name of its type, an identity key (`pk`), an
/// optional developer supplied natural key (`to_key`) and any number of
/// extra fields.  All of them are exposed as attributes in templates and
/// the [`DefaultClassifier`](crate::dom_id::DefaultClassifier) recognizes
/// it as an [`Entity::Instance`](crate::dom_id::Entity::Instance).
///
/// ```
/// use minijinja::Value;
/// use minijinja_simplify::model::Model;
///
/// let todo = Model::new("TodoItem")
///     .with_pk(1)
///     .with_field("description", "test");
/// let value = Value::from_object(todo);
/// assert_eq!(value.get_attr("pk").unwrap(), Value::from(1));
/// assert_eq!(value.to_string(), "TodoItem object (1)");
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    type_name: String,
    pk: Value,
    natural_key: Value,
    fields: IndexMap<String, Value>,
}

impl Model {
    /// Creates an unsaved model of the given type.
    pub fn new<N: Into<String>>(type_name: N) -> Model {
        Model {
            type_name: type_name.into(),
            pk: Value::from(()),
            natural_key: Value::UNDEFINED,
            fields: IndexMap::new(),
        }
    }

    /// Creates a model from a serializable record.
    ///
    /// The record has to serialize into a map.  Its `pk` field, or failing
    /// that its `id` field, becomes the identity key and its `to_key` field
    /// becomes the natural key.  An `id` field also stays available as a
    /// regular field.
    pub fn from_serialize<N: Into<String>, S: Serialize>(
        type_name: N,
        record: &S,
    ) -> Result<Model, Error> {
        let record = Value::from_serialize(record);
        if record.kind() != ValueKind::Map {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot build a model from a value of type {}", record.kind()),
            ));
        }

        let mut rv = Model::new(type_name);
        for key in record.try_iter()? {
            let value = record.get_item(&key)?;
            match key.as_str() {
                Some("pk") => rv.pk = value,
                Some("id") => {
                    if rv.pk.is_none() {
                        rv.pk = value.clone();
                    }
                    rv.fields.insert("id".to_string(), value);
                }
                Some("to_key") => rv.natural_key = value,
                Some(name) => {
                    rv.fields.insert(name.to_string(), value);
                }
                None => {
                    rv.fields.insert(key.to_string(), value);
                }
            }
        }
        Ok(rv)
    }

    /// Sets the identity key.
    pub fn with_pk<V: Into<Value>>(mut self, pk: V) -> Model {
        self.pk = pk.into();
        self
    }

    /// Sets the natural key (`to_key`).
    pub fn with_natural_key<V: Into<Value>>(mut self, key: V) -> Model {
        self.natural_key = key.into();
        self
    }

    /// Adds an extra field.
    pub fn with_field<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Model {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The name of the model's type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The identity key, `none` while unsaved.
    pub fn pk(&self) -> &Value {
        &self.pk
    }

    /// The natural key, undefined unless one was set.
    pub fn natural_key(&self) -> &Value {
        &self.natural_key
    }
}

impl Object for Model {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "pk" => Some(self.pk.clone()),
            "to_key" if !self.natural_key.is_undefined() => Some(self.natural_key.clone()),
            name => self.fields.get(name).cloned(),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let mut keys = vec![Value::from("pk")];
        if !self.natural_key.is_undefined() {
            keys.push(Value::from("to_key"));
        }
        keys.extend(self.fields.keys().map(|x| Value::from(x.as_str())));
        Enumerator::Values(keys)
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pk.is_none() || self.pk.is_undefined() {
            write!(f, "{} object (None)", self.type_name)
        } else {
            write!(f, "{} object ({})", self.type_name, self.pk)
        }
    }
}

/// A persisted entity type as seen by templates.
///
/// Renders as its name and is classified as an
/// [`Entity::Type`](crate::dom_id::Entity::Type) by the default classifier.
/// This is what a template gets handed when a form for a not yet created
/// record is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelType {
    name: String,
}

impl ModelType {
    /// Creates a new model type with the given name.
    pub fn new<N: Into<String>>(name: N) -> ModelType {
        ModelType { name: name.into() }
    }

    /// The name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Object for ModelType {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
