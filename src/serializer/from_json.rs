//! Canonical JSON to validated instance

use super::{to_json::is_enum_value, ResolvedOptions};
use crate::declaration::Property;
use crate::error::{ConcertoError, Result};
use crate::instance::{Instance, Relationship, Value};
use crate::metamodel::root::SYSTEM_IDENTIFIER;
use crate::model_manager::ModelManager;
use crate::util::PrimitiveType;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;

pub(super) struct InstanceReader<'a> {
    manager: &'a ModelManager,
    options: ResolvedOptions,
}

impl<'a> InstanceReader<'a> {
    pub(super) fn new(manager: &'a ModelManager, options: ResolvedOptions) -> Self {
        Self { manager, options }
    }

    pub(super) fn read(&self, json: &Json) -> Result<Instance> {
        self.read_instance(json, None)
    }

    fn read_instance(&self, json: &Json, expected: Option<&str>) -> Result<Instance> {
        let object = json.as_object().ok_or_else(|| {
            ConcertoError::ModelViolation("Invalid JSON data: expected an object.".to_string())
        })?;

        // the payload's $class wins; nested objects may omit it and fall
        // back to the declared type
        let class_fqn = match object.get("$class") {
            Some(Json::String(fqn)) => fqn.as_str(),
            Some(_) => {
                return Err(ConcertoError::ModelViolation(
                    "Invalid JSON data: $class must be a string.".to_string(),
                ));
            }
            None => expected.ok_or_else(|| {
                ConcertoError::ModelViolation(
                    "Invalid JSON data: missing $class.".to_string(),
                )
            })?,
        };
        let decl = self.manager.get_type(class_fqn)?;
        if let Some(expected) = expected {
            if self.options.validate && !self.manager.derives_from(class_fqn, expected)? {
                return Err(ConcertoError::ModelViolation(format!(
                    "$class {} is not assignable to {}.",
                    class_fqn, expected
                )));
            }
        }
        if self.options.validate && decl.is_abstract() {
            return Err(ConcertoError::ModelViolation(format!(
                "Cannot deserialize abstract type {}.",
                class_fqn
            )));
        }

        let mut instance = Instance::new(decl.fqn());

        if decl.is_identifiable() {
            let explicit_field = decl
                .identifier_field()
                .filter(|f| *f != SYSTEM_IDENTIFIER);
            let from_system = object.get("$identifier").and_then(Json::as_str);
            let from_field = explicit_field
                .and_then(|f| object.get(f))
                .and_then(Json::as_str);
            match from_system.or(from_field) {
                Some(id) => instance.set_identifier(id),
                None if self.options.validate && explicit_field.is_none() => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" is missing the required field \"$identifier\".",
                        class_fqn
                    )));
                }
                None => {}
            }
        }
        let label = instance.label();

        if decl.kind().has_timestamp() {
            match object.get("$timestamp") {
                Some(Json::String(text)) => {
                    instance.set_timestamp(parse_date_time(text, &label, "$timestamp")?);
                }
                Some(_) => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" has an invalid value for field \"$timestamp\": expected an ISO-8601 string.",
                        label
                    )));
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
            match object.get(property.name()) {
                Some(Json::Null) | None => {
                    if !property.is_optional() && self.options.validate {
                        return Err(ConcertoError::ModelViolation(format!(
                            "The instance \"{}\" is missing the required field \"{}\".",
                            label,
                            property.name()
                        )));
                    }
                }
                Some(value) => {
                    let parsed = self.read_value(value, property, &label)?;
                    instance.set_property(property.name(), parsed);
                }
            }
        }

        if self.options.validate {
            for (key, value) in object {
                if key == "$class" || key == "$identifier" || key == "$timestamp" {
                    continue;
                }
                if value.is_null() {
                    continue;
                }
                if !known.contains(&key.as_str()) {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" has an unexpected property \"{}\".",
                        label, key
                    )));
                }
            }
        }
        Ok(instance)
    }

    fn read_value(&self, json: &Json, property: &Property, label: &str) -> Result<Value> {
        if property.is_array() {
            let Json::Array(items) = json else {
                return Err(self.mismatch(label, property, json));
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(self.read_scalar(item, property, label)?);
            }
            return Ok(Value::Array(out));
        }
        self.read_scalar(json, property, label)
    }

    fn read_scalar(&self, json: &Json, property: &Property, label: &str) -> Result<Value> {
        if property.is_relationship() {
            return self.read_relationship(json, property, label);
        }

        if let Some(primitive) = property.primitive_type() {
            return match primitive {
                PrimitiveType::String => {
                    let text = json.as_str().ok_or_else(|| self.mismatch(label, property, json))?;
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_string(text, &context)?;
                        }
                    }
                    Ok(Value::String(text.to_string()))
                }
                PrimitiveType::Boolean => json
                    .as_bool()
                    .map(Value::Boolean)
                    .ok_or_else(|| self.mismatch(label, property, json)),
                PrimitiveType::Integer => {
                    let number = json
                        .as_i64()
                        .filter(|n| i32::try_from(*n).is_ok())
                        .ok_or_else(|| self.mismatch(label, property, json))?;
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_integer(number, &context)?;
                        }
                    }
                    Ok(Value::Integer(number as i32))
                }
                PrimitiveType::Long => {
                    let number = json
                        .as_i64()
                        .ok_or_else(|| self.mismatch(label, property, json))?;
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_integer(number, &context)?;
                        }
                    }
                    Ok(Value::Long(number))
                }
                PrimitiveType::Double => {
                    let number = json
                        .as_f64()
                        .ok_or_else(|| self.mismatch(label, property, json))?;
                    if self.options.validate {
                        if let Some(validator) = property.validator() {
                            let context = format!("{} field \"{}\"", label, property.name());
                            validator.validate_double(number, &context)?;
                        }
                    }
                    Ok(Value::Double(number))
                }
                PrimitiveType::DateTime => {
                    let text = json.as_str().ok_or_else(|| self.mismatch(label, property, json))?;
                    Ok(Value::DateTime(parse_date_time(
                        text,
                        label,
                        property.name(),
                    )?))
                }
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
            let name = json.as_str().ok_or_else(|| self.mismatch(label, property, json))?;
            if self.options.validate && !is_enum_value(target, name, self.manager)? {
                return Err(ConcertoError::ModelViolation(format!(
                    "The instance \"{}\" has an invalid value \"{}\" for enum field \"{}\".",
                    label,
                    name,
                    property.name()
                )));
            }
            return Ok(Value::Enum(name.to_string()));
        }

        if json.is_object() {
            let sub = self.read_instance(json, Some(type_name))?;
            return Ok(Value::Resource(Box::new(sub)));
        }
        Err(self.mismatch(label, property, json))
    }

    fn read_relationship(
        &self,
        json: &Json,
        property: &Property,
        label: &str,
    ) -> Result<Value> {
        let target = property.resolved_type().unwrap_or_default();
        match json {
            Json::String(uri) => {
                let rel = Relationship::from_uri(uri, Some(target))?;
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
                Ok(Value::Relationship(rel))
            }
            Json::Object(_) if self.options.permit_resources_for_relationships => {
                let sub = self.read_instance(json, Some(target))?;
                Ok(Value::Resource(Box::new(sub)))
            }
            _ => Err(ConcertoError::ModelViolation(format!(
                "The instance \"{}\" has an invalid value for relationship \"{}\": expected a relationship URI.",
                label,
                property.name()
            ))),
        }
    }

    fn mismatch(&self, label: &str, property: &Property, json: &Json) -> ConcertoError {
        ConcertoError::ModelViolation(format!(
            "The instance \"{}\" has an invalid value for field \"{}\": expected {}, found {}.",
            label,
            property.name(),
            property.resolved_type().unwrap_or("a value"),
            json_kind(json)
        ))
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Parse an ISO-8601 timestamp into UTC
fn parse_date_time(text: &str, label: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ConcertoError::ModelViolation(format!(
                "The instance \"{}\" has an invalid DateTime \"{}\" for field \"{}\": {}.",
                label, text, field, e
            ))
        })
}
