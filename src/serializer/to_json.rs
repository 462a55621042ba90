//! Instance to canonical JSON

use super::{format_date_time, ResolvedOptions};
use crate::declaration::{ClassDeclaration, Property};
use crate::error::{ConcertoError, Result};
use crate::instance::{Instance, Value};
use crate::model_manager::ModelManager;
use crate::util::PrimitiveType;
use serde_json::{json, Map, Value as Json};

/// Renders a non-finite double the way the wire format names it
fn non_finite_name(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

pub(super) struct InstanceWriter<'a> {
    manager: &'a ModelManager,
    options: ResolvedOptions,
}

impl<'a> InstanceWriter<'a> {
    pub(super) fn new(manager: &'a ModelManager, options: ResolvedOptions) -> Self {
        Self { manager, options }
    }

    pub(super) fn write(&self, instance: &Instance) -> Result<Json> {
        self.write_instance(instance, None)
    }

    fn write_instance(&self, instance: &Instance, expected: Option<&str>) -> Result<Json> {
        let decl = self.manager.get_type(instance.class_fqn())?;
        let label = instance.label();

        if let Some(expected) = expected {
            if self.options.validate
                && !self.manager.derives_from(instance.class_fqn(), expected)?
            {
                return Err(ConcertoError::ModelViolation(format!(
                    "The instance \"{}\" of type {} is not assignable to {}.",
                    label,
                    instance.class_fqn(),
                    expected
                )));
            }
        }
        if self.options.validate && decl.is_abstract() {
            return Err(ConcertoError::ModelViolation(format!(
                "The instance \"{}\" is of abstract type {}.",
                label,
                instance.class_fqn()
            )));
        }

        let mut object = Map::new();
        object.insert("$class".to_string(), json!(instance.class_fqn()));

        if decl.is_identifiable() {
            match instance.identifier() {
                Some(id) => {
                    object.insert("$identifier".to_string(), json!(id));
                }
                None if self.options.validate => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" is missing the required field \"$identifier\".",
                        label
                    )));
                }
                None => {}
            }
        }
        if decl.kind().has_timestamp() {
            match instance.timestamp() {
                Some(ts) => {
                    object.insert(
                        "$timestamp".to_string(),
                        json!(format_date_time(ts, self.options.utc_offset)),
                    );
                }
                None if self.options.validate => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" is missing the required field \"$timestamp\".",
                        label
                    )));
                }
                None => {}
            }
        }

        let properties = decl.get_properties(self.manager)?;
        let mut known = Vec::new();
        for property in &properties {
            if property.is_system() {
                continue;
            }
            known.push(property.name());
            match instance.get_property(property.name()) {
                Some(value) => {
                    object.insert(
                        property.name().to_string(),
                        self.write_value(value, property, &label)?,
                    );
                }
                None if !property.is_optional() && self.options.validate => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" is missing the required field \"{}\".",
                        label,
                        property.name()
                    )));
                }
                None => {}
            }
        }
        if self.options.validate {
            for key in instance.properties().keys() {
                if !known.contains(&key.as_str()) {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" has an unexpected property \"{}\".",
                        label, key
                    )));
                }
            }
        }
        Ok(Json::Object(object))
    }

    fn write_value(&self, value: &Value, property: &Property, label: &str) -> Result<Json> {
        if property.is_array() {
            let Value::Array(items) = value else {
                return Err(self.mismatch(label, property, value));
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(self.write_scalar(item, property, label)?);
            }
            return Ok(Json::Array(out));
        }
        self.write_scalar(value, property, label)
    }

    fn write_scalar(&self, value: &Value, property: &Property, label: &str) -> Result<Json> {
        if property.is_relationship() {
            return self.write_relationship(value, property, label);
        }

        if let Some(primitive) = property.primitive_type() {
            return match (primitive, value) {
                (PrimitiveType::String, Value::String(s)) => {
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_string(s, &context)?;
                        }
                    }
                    Ok(json!(s))
                }
                (PrimitiveType::Boolean, Value::Boolean(b)) => Ok(json!(b)),
                (PrimitiveType::Integer, Value::Integer(i)) => {
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_integer(i64::from(*i), &context)?;
                        }
                    }
                    Ok(json!(i))
                }
                (PrimitiveType::Long, Value::Long(l)) => {
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_integer(*l, &context)?;
                        }
                    }
                    Ok(json!(l))
                }
                (PrimitiveType::Double, Value::Double(d)) => {
                    if !d.is_finite() {
                        return Err(ConcertoError::ModelViolation(format!(
                            "The instance \"{}\" has a non-finite value \"{}\" for field \"{}\".",
                            label,
                            non_finite_name(*d),
                            property.name()
                        )));
                    }
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_double(*d, &context)?;
                        }
                    }
                    Ok(json!(d))
                }
                (PrimitiveType::DateTime, Value::DateTime(dt)) => {
                    Ok(json!(format_date_time(*dt, self.options.utc_offset)))
                }
                _ => Err(self.mismatch(label, property, value)),
            };
        }

        let type_name = property.resolved_type().ok_or_else(|| {
            ConcertoError::IllegalModel(format!(
                "Property {} has no resolved type",
                property.name()
            ))
        })?;
        let target = self.manager.get_type(type_name)?;

        if target.is_enum() {
            let name = match value {
                Value::Enum(name) | Value::String(name) => name,
                _ => return Err(self.mismatch(label, property, value)),
            };
            if self.options.validate && !is_enum_value(target, name, self.manager)? {
                return Err(ConcertoError::ModelViolation(format!(
                    "The instance \"{}\" has an invalid value \"{}\" for enum field \"{}\".",
                    label,
                    name,
                    property.name()
                )));
            }
            return Ok(json!(name));
        }

        match value {
            Value::Resource(sub) => self.write_instance(sub, Some(type_name)),
            _ => Err(self.mismatch(label, property, value)),
        }
    }

    fn write_relationship(
        &self,
        value: &Value,
        property: &Property,
        label: &str,
    ) -> Result<Json> {
        let target = property.resolved_type().unwrap_or_default();
        match value {
            Value::Relationship(rel) => {
                if self.options.validate
                    && !self.manager.derives_from(rel.class_fqn(), target)?
                {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" relationship \"{}\" targets {} which is not assignable to {}.",
                        label,
                        property.name(),
                        rel.class_fqn(),
                        target
                    )));
                }
                Ok(json!(rel.to_uri()))
            }
            Value::Resource(sub) => {
                if self.options.convert_resources_to_relationships {
                    let rel = sub.to_relationship().ok_or_else(|| {
                        ConcertoError::ModelViolation(format!(
                            "The instance \"{}\" cannot be converted to a relationship: it has no identifier.",
                            sub.label()
                        ))
                    })?;
                    Ok(json!(rel.to_uri()))
                } else if self.options.permit_resources_for_relationships {
                    self.write_instance(sub, Some(target))
                } else {
                    Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" holds a resource for relationship \"{}\"; expected a relationship.",
                        label,
                        property.name()
                    )))
                }
            }
            _ => Err(self.mismatch(label, property, value)),
        }
    }

    fn mismatch(&self, label: &str, property: &Property, value: &Value) -> ConcertoError {
        ConcertoError::ModelViolation(format!(
            "The instance \"{}\" has an invalid value for field \"{}\": expected {}, found {}.",
            label,
            property.name(),
            property.resolved_type().unwrap_or("a value"),
            value.kind_name()
        ))
    }
}

/// Whether `name` is one of the enum's declared values
pub(super) fn is_enum_value(
    decl: &ClassDeclaration,
    name: &str,
    manager: &ModelManager,
) -> Result<bool> {
    Ok(decl
        .get_properties(manager)?
        .iter()
        .any(|p| p.is_enum_value() && p.name() == name))
}
