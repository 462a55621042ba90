//! Sample instance construction
//!
//! Builds a populated instance from a declaration by walking its properties
//! with a pluggable [`ValueGenerator`]. A stack of the FQNs currently being
//! generated guards against unbounded recursion: a required recursive
//! scalar fails, an optional recursive field is left absent, and a
//! recursive array becomes empty.

mod value_generator;

pub use value_generator::{
    EmptyValueGenerator, GenerateMode, SampleValueGenerator, ValueGenerator,
};

use crate::declaration::Property;
use crate::error::{ConcertoError, Result};
use crate::instance::{Instance, Relationship, Value};
use crate::metamodel::root::SYSTEM_IDENTIFIER;
use crate::model_manager::ModelManager;
use crate::util::PrimitiveType;
use crate::visitor::{Node, Visitor};

/// Pick the first non-abstract declaration assignable to `fqn`, in stable
/// (namespace insertion, then declaration) order
pub(crate) fn pick_concrete(manager: &ModelManager, fqn: &str) -> Result<String> {
    let decl = manager.get_type(fqn)?;
    if !decl.is_abstract() {
        return Ok(decl.fqn());
    }
    decl.get_assignable_class_declarations(manager)?
        .into_iter()
        .find(|d| !d.is_abstract())
        .map(|d| d.fqn())
        .ok_or_else(|| {
            ConcertoError::ModelViolation(format!(
                "No concrete subclass of abstract type {} is available",
                fqn
            ))
        })
}

/// Traversal engine that fills an instance with generated values
pub struct InstanceGenerator<'a> {
    manager: &'a ModelManager,
}

impl<'a> InstanceGenerator<'a> {
    pub fn new(manager: &'a ModelManager) -> Self {
        Self { manager }
    }

    /// Populate an instance's properties in declaration order
    ///
    /// Optional properties are generated only when `include_optional` is
    /// set.
    pub fn populate(
        &self,
        instance: &mut Instance,
        values: &mut dyn ValueGenerator,
        include_optional: bool,
    ) -> Result<()> {
        let mut stack = vec![instance.class_fqn().to_string()];
        self.populate_inner(instance, values, include_optional, &mut stack)
    }

    fn populate_inner(
        &self,
        instance: &mut Instance,
        values: &mut dyn ValueGenerator,
        include_optional: bool,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        let fqn = instance.class_fqn().to_string();
        let decl = self.manager.get_type(&fqn)?;
        for property in decl.get_properties(self.manager)? {
            if property.is_system() {
                continue;
            }
            if property.is_optional() && !include_optional {
                continue;
            }
            if let Some(value) =
                self.generate_property(property, values, include_optional, stack)?
            {
                instance.set_property(property.name(), value);
            }
        }
        Ok(())
    }

    fn generate_property(
        &self,
        property: &Property,
        values: &mut dyn ValueGenerator,
        include_optional: bool,
        stack: &mut Vec<String>,
    ) -> Result<Option<Value>> {
        // defaults carried from the schema win over generated values
        if let Some(default) = property.default_value() {
            if let Some(value) = default_to_value(default, property) {
                return Ok(Some(value));
            }
        }

        if let Some(primitive) = property.primitive_type() {
            if property.is_array() {
                let elements = (0..values.array_size())
                    .map(|_| self.primitive_value(primitive, property, values))
                    .collect();
                return Ok(Some(Value::Array(elements)));
            }
            return Ok(Some(self.primitive_value(primitive, property, values)));
        }

        let type_name = property.resolved_type().ok_or_else(|| {
            ConcertoError::IllegalModel(format!(
                "Property {} has no resolved type",
                property.name()
            ))
        })?;

        if property.is_relationship() {
            let target = pick_concrete(self.manager, type_name)?;
            if property.is_array() {
                let elements = (0..values.array_size())
                    .map(|_| {
                        Value::Relationship(Relationship::new(
                            target.clone(),
                            values.identifier(),
                        ))
                    })
                    .collect();
                return Ok(Some(Value::Array(elements)));
            }
            return Ok(Some(Value::Relationship(Relationship::new(
                target,
                values.identifier(),
            ))));
        }

        let target_decl = self.manager.get_type(type_name)?;
        if target_decl.is_enum() {
            let names: Vec<&str> = target_decl
                .get_properties(self.manager)?
                .iter()
                .map(|p| p.name())
                .collect();
            if names.is_empty() {
                return Err(ConcertoError::ModelViolation(format!(
                    "Enum {} has no values to pick from",
                    type_name
                )));
            }
            let pick = names[values.enum_index(names.len()).min(names.len() - 1)];
            if property.is_array() {
                let elements = (0..values.array_size())
                    .map(|_| Value::Enum(pick.to_string()))
                    .collect();
                return Ok(Some(Value::Array(elements)));
            }
            return Ok(Some(Value::Enum(pick.to_string())));
        }

        // object field; abstract declared types defer to the concrete picker
        let concrete = pick_concrete(self.manager, type_name)?;
        if stack.contains(&concrete) {
            if property.is_array() {
                return Ok(Some(Value::Array(Vec::new())));
            }
            if property.is_optional() {
                return Ok(None);
            }
            return Err(ConcertoError::Recursion(format!(
                "Required field {} recursively references {}",
                property.name(),
                concrete
            )));
        }

        if property.is_array() {
            let mut elements = Vec::new();
            for _ in 0..values.array_size() {
                elements.push(Value::Resource(Box::new(self.build_instance(
                    &concrete,
                    values,
                    include_optional,
                    stack,
                )?)));
            }
            return Ok(Some(Value::Array(elements)));
        }
        Ok(Some(Value::Resource(Box::new(self.build_instance(
            &concrete,
            values,
            include_optional,
            stack,
        )?))))
    }

    fn primitive_value(
        &self,
        primitive: PrimitiveType,
        property: &Property,
        values: &mut dyn ValueGenerator,
    ) -> Value {
        let validator = property.validator();
        match primitive {
            PrimitiveType::String => {
                Value::String(values.string(property.name(), validator))
            }
            PrimitiveType::Boolean => Value::Boolean(values.boolean()),
            PrimitiveType::Integer => Value::Integer(values.integer(validator)),
            PrimitiveType::Long => Value::Long(values.long(validator)),
            PrimitiveType::Double => Value::Double(values.double(validator)),
            PrimitiveType::DateTime => Value::DateTime(values.date_time()),
        }
    }

    fn build_instance(
        &self,
        fqn: &str,
        values: &mut dyn ValueGenerator,
        include_optional: bool,
        stack: &mut Vec<String>,
    ) -> Result<Instance> {
        stack.push(fqn.to_string());
        let decl = self.manager.get_type(fqn)?;
        let mut instance = Instance::new(fqn);
        let result = self.populate_inner(&mut instance, values, include_optional, stack);
        stack.pop();
        result?;

        if decl.is_identifiable() {
            // keep the identifier aligned with an explicit identifier field
            let identifier = match decl.identifier_field() {
                Some(field) if field != SYSTEM_IDENTIFIER => {
                    match instance.get_property(field) {
                        Some(Value::String(id)) => id.clone(),
                        _ => values.identifier(),
                    }
                }
                _ => values.identifier(),
            };
            instance.set_identifier(identifier);
        }
        if decl.kind().has_timestamp() {
            instance.set_timestamp(values.date_time());
        }
        Ok(instance)
    }
}

/// Parameters when driving the generator through the visitor contract: the
/// value strategy plus the traversal state the engine accumulates
pub struct GenerateParameters {
    pub values: Box<dyn ValueGenerator>,
    pub include_optional_fields: bool,
}

impl Visitor for InstanceGenerator<'_> {
    type Parameters = GenerateParameters;
    type Output = Instance;

    fn visit(&mut self, node: Node<'_>, parameters: &mut GenerateParameters) -> Result<Instance> {
        match node {
            Node::ClassDeclaration(decl) => {
                let mut stack = Vec::new();
                self.build_instance(
                    &decl.fqn(),
                    parameters.values.as_mut(),
                    parameters.include_optional_fields,
                    &mut stack,
                )
            }
            _ => Err(ConcertoError::Unsupported(
                "the instance generator visits class declarations".to_string(),
            )),
        }
    }
}

/// Interpret a schema default value as a runtime value, when its shape
/// matches the property's primitive type
fn default_to_value(default: &serde_json::Value, property: &Property) -> Option<Value> {
    if property.is_array() {
        return None;
    }
    match (property.primitive_type()?, default) {
        (PrimitiveType::String, serde_json::Value::String(s)) => {
            Some(Value::String(s.clone()))
        }
        (PrimitiveType::Boolean, serde_json::Value::Bool(b)) => Some(Value::Boolean(*b)),
        (PrimitiveType::Integer, serde_json::Value::Number(n)) => {
            n.as_i64().map(|v| Value::Integer(v as i32))
        }
        (PrimitiveType::Long, serde_json::Value::Number(n)) => n.as_i64().map(Value::Long),
        (PrimitiveType::Double, serde_json::Value::Number(n)) => n.as_f64().map(Value::Double),
        _ => None,
    }
}
