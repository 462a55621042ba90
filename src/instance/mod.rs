//! Typed runtime instances
//!
//! An [`Instance`] is one in-memory record tied to a declaration by FQN: a
//! resource (identifiable), a concept (no identifier), a transaction, or an
//! event (identifier plus timestamp). Property values are kind-tagged
//! [`Value`]s in insertion order; relationships stay by-reference.

mod relationship;

pub use relationship::Relationship;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// One property value inside an instance
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    /// One of an enum declaration's values
    Enum(String),
    /// An embedded resource or concept instance
    Resource(Box<Instance>),
    /// A by-reference link to an identifiable instance
    Relationship(Relationship),
    Array(Vec<Value>),
}

impl Value {
    /// A short label for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::DateTime(_) => "DateTime",
            Value::Enum(_) => "Enum",
            Value::Resource(_) => "Resource",
            Value::Relationship(_) => "Relationship",
            Value::Array(_) => "Array",
        }
    }
}

/// A typed runtime record tied to a declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class_fqn: String,
    identifier: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    properties: IndexMap<String, Value>,
}

impl Instance {
    /// Create an empty instance of a declaration
    pub fn new(class_fqn: impl Into<String>) -> Self {
        Self {
            class_fqn: class_fqn.into(),
            identifier: None,
            timestamp: None,
            properties: IndexMap::new(),
        }
    }

    /// The declaration's fully qualified name
    pub fn class_fqn(&self) -> &str {
        &self.class_fqn
    }

    /// The identifier, present on identifiable instances
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = Some(identifier.into());
    }

    /// The `$timestamp`, present on transactions and events
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }

    /// A property value by name
    pub fn get_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property value
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Remove a property value
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// All property values in insertion order
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// A `<FQN>#<identifier>` label for error messages
    pub fn label(&self) -> String {
        match &self.identifier {
            Some(id) => format!("{}#{}", self.class_fqn, id),
            None => self.class_fqn.clone(),
        }
    }

    /// Build a relationship pointing at this instance
    ///
    /// Returns `None` when the instance has no identifier.
    pub fn to_relationship(&self) -> Option<Relationship> {
        self.identifier
            .as_deref()
            .map(|id| Relationship::new(self.class_fqn.clone(), id))
    }
}
