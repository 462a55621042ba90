//! Properties of a class declaration

use super::decorator::Decorator;
use super::validator::Validator;
use crate::error::SourceLocation;
use crate::metamodel::{PropertyAst, PropertyKindAst, ValidatorAst};
use crate::util::{self, PrimitiveType};

/// The kind of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A value field: primitive, concept, or enum typed
    Field,
    /// A by-reference link to an identifiable type
    Relationship,
    /// A value inside an enum declaration
    EnumValue,
}

/// One property of a class declaration
///
/// Holds the type name as written in the schema and, after the owning model
/// has been validated, the resolved form: a primitive name or an FQN.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    kind: PropertyKind,
    declared_type: Option<String>,
    resolved_type: Option<String>,
    is_array: bool,
    is_optional: bool,
    default_value: Option<serde_json::Value>,
    validator_ast: Option<ValidatorAst>,
    validator: Option<Validator>,
    decorators: Vec<Decorator>,
    location: Option<SourceLocation>,
}

impl Property {
    /// Build from the AST node; resolution state starts empty
    pub fn from_ast(ast: &PropertyAst) -> Self {
        let (kind, declared_type) = match &ast.kind {
            PropertyKindAst::Field { type_name } => (PropertyKind::Field, Some(type_name.clone())),
            PropertyKindAst::Relationship { type_name } => {
                (PropertyKind::Relationship, Some(type_name.clone()))
            }
            PropertyKindAst::EnumValue => (PropertyKind::EnumValue, None),
        };
        Self {
            name: ast.name.clone(),
            kind,
            declared_type,
            resolved_type: None,
            is_array: ast.is_array,
            is_optional: ast.is_optional,
            default_value: ast.default_value.clone(),
            validator_ast: ast.validator.clone(),
            validator: None,
            decorators: ast.decorators.iter().map(Decorator::from_ast).collect(),
            location: ast.location.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn is_field(&self) -> bool {
        self.kind == PropertyKind::Field
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == PropertyKind::Relationship
    }

    pub fn is_enum_value(&self) -> bool {
        self.kind == PropertyKind::EnumValue
    }

    /// System properties (`$identifier`, `$timestamp`) are emitted through
    /// dedicated channels rather than as ordinary fields
    pub fn is_system(&self) -> bool {
        self.name.starts_with('$')
    }

    /// The type name as written in the schema, if the kind carries one
    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    /// The resolved type: a primitive name or an FQN. Present after the
    /// owning model file has been validated.
    pub fn resolved_type(&self) -> Option<&str> {
        self.resolved_type.as_deref()
    }

    /// The primitive type of this property, when it resolves to one
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.resolved_type
            .as_deref()
            .and_then(PrimitiveType::from_name)
    }

    /// Whether the resolved type is a primitive
    pub fn is_primitive(&self) -> bool {
        self.primitive_type().is_some()
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    /// Default value carried from the schema, if any
    pub fn default_value(&self) -> Option<&serde_json::Value> {
        self.default_value.as_ref()
    }

    /// The compiled validator, present after validation when one was declared
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// The validator clause as written, if any
    pub fn validator_ast(&self) -> Option<&ValidatorAst> {
        self.validator_ast.as_ref()
    }

    pub fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Record the outcome of name resolution
    pub(crate) fn set_resolved_type(&mut self, resolved: String) {
        self.resolved_type = Some(resolved);
    }

    /// Record the compiled validator
    pub(crate) fn set_validator(&mut self, validator: Validator) {
        self.validator = Some(validator);
    }

    /// Whether the resolved type names a declaration rather than a primitive
    pub fn references_declaration(&self) -> bool {
        matches!(self.resolved_type.as_deref(), Some(t) if util::is_fully_qualified(t))
    }
}
