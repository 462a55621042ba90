//! Canonical JSON serialization
//!
//! The serializer is a pair of traversal engines over the declaration
//! graph: [`Serializer::to_json`] emits the canonical wire form from an
//! instance, [`Serializer::from_json`] constructs a validated instance from
//! it. Options set per call override the serializer's defaults key by key;
//! a key left unset inherits, a key set to any value (including `false`)
//! overrides.

mod from_json;
mod to_json;

use crate::error::{ConcertoError, Result};
use crate::instance::Instance;
use crate::model_manager::ModelManager;
use crate::visitor::{Node, Visitor};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

/// Per-call serializer options; unset keys inherit from the defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializerOptions {
    /// Validate instances against their declarations (default true)
    pub validate: Option<bool>,
    /// Serialize a resource sitting in a relationship slot as a URI
    pub convert_resources_to_relationships: Option<bool>,
    /// Accept a full resource where a relationship is expected
    pub permit_resources_for_relationships: Option<bool>,
    /// Generate optional fields when deserialization falls back to defaults
    pub include_optional_fields: Option<bool>,
    /// Offset in minutes applied to emitted DateTime values (default 0)
    pub utc_offset: Option<i32>,
}

impl SerializerOptions {
    pub fn validate(mut self, value: bool) -> Self {
        self.validate = Some(value);
        self
    }

    pub fn convert_resources_to_relationships(mut self, value: bool) -> Self {
        self.convert_resources_to_relationships = Some(value);
        self
    }

    pub fn permit_resources_for_relationships(mut self, value: bool) -> Self {
        self.permit_resources_for_relationships = Some(value);
        self
    }

    pub fn include_optional_fields(mut self, value: bool) -> Self {
        self.include_optional_fields = Some(value);
        self
    }

    pub fn utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset = Some(minutes);
        self
    }

    /// Resolve call-site options over defaults; present keys override
    /// regardless of value, missing keys inherit
    fn resolve(call: Option<&SerializerOptions>, defaults: &SerializerOptions) -> ResolvedOptions {
        let pick_bool = |call_v: Option<bool>, default_v: Option<bool>, fallback: bool| {
            call_v.or(default_v).unwrap_or(fallback)
        };
        let empty = SerializerOptions::default();
        let call = call.unwrap_or(&empty);
        ResolvedOptions {
            validate: pick_bool(call.validate, defaults.validate, true),
            convert_resources_to_relationships: pick_bool(
                call.convert_resources_to_relationships,
                defaults.convert_resources_to_relationships,
                false,
            ),
            permit_resources_for_relationships: pick_bool(
                call.permit_resources_for_relationships,
                defaults.permit_resources_for_relationships,
                false,
            ),
            include_optional_fields: pick_bool(
                call.include_optional_fields,
                defaults.include_optional_fields,
                false,
            ),
            utc_offset: call.utc_offset.or(defaults.utc_offset).unwrap_or(0),
        }
    }
}

/// Options with every key decided
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedOptions {
    pub validate: bool,
    pub convert_resources_to_relationships: bool,
    pub permit_resources_for_relationships: bool,
    #[allow(dead_code)]
    pub include_optional_fields: bool,
    pub utc_offset: i32,
}

/// Bidirectional canonical JSON engine over a declaration graph
pub struct Serializer<'a> {
    manager: &'a ModelManager,
    defaults: SerializerOptions,
}

impl<'a> Serializer<'a> {
    pub fn new(manager: &'a ModelManager) -> Self {
        Self {
            manager,
            defaults: SerializerOptions::default(),
        }
    }

    /// Replace the default options applied to every call
    pub fn set_default_options(&mut self, defaults: SerializerOptions) {
        self.defaults = defaults;
    }

    /// Emit the canonical JSON form of an instance
    pub fn to_json(
        &self,
        instance: &Instance,
        options: Option<&SerializerOptions>,
    ) -> Result<serde_json::Value> {
        let resolved = SerializerOptions::resolve(options, &self.defaults);
        to_json::InstanceWriter::new(self.manager, resolved).write(instance)
    }

    /// Construct a validated instance from canonical JSON
    pub fn from_json(
        &self,
        json: &serde_json::Value,
        options: Option<&SerializerOptions>,
    ) -> Result<Instance> {
        let resolved = SerializerOptions::resolve(options, &self.defaults);
        from_json::InstanceReader::new(self.manager, resolved).read(json)
    }
}

/// Parameters when driving the serializer through the visitor contract:
/// the instance to emit and the per-call options
pub struct SerializeParameters {
    pub instance: Instance,
    pub options: Option<SerializerOptions>,
}

impl Visitor for Serializer<'_> {
    type Parameters = SerializeParameters;
    type Output = serde_json::Value;

    fn visit(
        &mut self,
        node: Node<'_>,
        parameters: &mut SerializeParameters,
    ) -> Result<serde_json::Value> {
        match node {
            Node::ClassDeclaration(decl) => {
                if decl.fqn() != parameters.instance.class_fqn() {
                    return Err(ConcertoError::ModelViolation(format!(
                        "The instance \"{}\" is not a {}.",
                        parameters.instance.label(),
                        decl.fqn()
                    )));
                }
                self.to_json(&parameters.instance, parameters.options.as_ref())
            }
            _ => Err(ConcertoError::Unsupported(
                "the serializer visits class declarations".to_string(),
            )),
        }
    }
}

/// Render a DateTime in ISO-8601 at the configured offset, millisecond
/// precision, `Z` for UTC
pub(crate) fn format_date_time(value: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    value
        .with_timezone(&offset)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
