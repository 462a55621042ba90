//! Declaration-level AST nodes

use crate::error::SourceLocation;
use serde::{Deserialize, Serialize};

/// The kind of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Asset,
    Participant,
    Transaction,
    Event,
    Concept,
    Enum,
}

impl DeclarationKind {
    /// Identifiable kinds carry an identifier field; concepts and enums do not
    pub fn is_identifiable(&self) -> bool {
        matches!(
            self,
            Self::Asset | Self::Participant | Self::Transaction | Self::Event
        )
    }

    /// Transactions and events carry a `$timestamp`
    pub fn has_timestamp(&self) -> bool {
        matches!(self, Self::Transaction | Self::Event)
    }

    /// The fully qualified root type a bare declaration of this kind extends
    pub fn root_type(&self) -> Option<&'static str> {
        match self {
            Self::Asset => Some("concerto.Asset"),
            Self::Participant => Some("concerto.Participant"),
            Self::Transaction => Some("concerto.Transaction"),
            Self::Event => Some("concerto.Event"),
            Self::Concept => Some("concerto.Concept"),
            Self::Enum => None,
        }
    }

    /// The schema keyword for this kind
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Participant => "participant",
            Self::Transaction => "transaction",
            Self::Event => "event",
            Self::Concept => "concept",
            Self::Enum => "enum",
        }
    }
}

/// How a declaration is identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityAst {
    /// `identified`: system identity through the `$identifier` field
    System,
    /// `identified by <field>`: explicit identity through a declared field
    Field(String),
}

/// One declaration inside a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationAst {
    pub kind: DeclarationKind,

    /// Short name, unique within the model
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,

    /// Identity clause, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityAst>,

    /// Supertype as written: a short name or an FQN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyAst>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<DecoratorAst>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl DeclarationAst {
    /// Create a bare declaration of a kind
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            is_abstract: false,
            identity: None,
            super_type: None,
            properties: Vec::new(),
            decorators: Vec::new(),
            location: None,
        }
    }

    /// Mark the declaration abstract
    pub fn abstracted(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Set the identity clause
    pub fn with_identity(mut self, identity: IdentityAst) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the supertype as written
    pub fn with_super_type(mut self, super_type: impl Into<String>) -> Self {
        self.super_type = Some(super_type.into());
        self
    }

    /// Append a property
    pub fn with_property(mut self, property: PropertyAst) -> Self {
        self.properties.push(property);
        self
    }
}

/// The kind of a property, with its declared type where one exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKindAst {
    /// `o <Type> <name>`: a primitive, concept, or enum-typed field
    Field {
        /// Type as written: a primitive name, short name, or FQN
        type_name: String,
    },
    /// `--> <Type> <name>`: a by-reference link to an identifiable type
    Relationship {
        /// Target type as written
        type_name: String,
    },
    /// A value inside an enum declaration; carries no type
    EnumValue,
}

/// One property of a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAst {
    pub name: String,

    pub kind: PropertyKindAst,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorAst>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<DecoratorAst>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl PropertyAst {
    /// A field property (`o <Type> <name>`)
    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKindAst::Field {
                type_name: type_name.into(),
            },
            is_array: false,
            is_optional: false,
            default_value: None,
            validator: None,
            decorators: Vec::new(),
            location: None,
        }
    }

    /// A relationship property (`--> <Type> <name>`)
    pub fn relationship(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKindAst::Relationship {
                type_name: type_name.into(),
            },
            is_array: false,
            is_optional: false,
            default_value: None,
            validator: None,
            decorators: Vec::new(),
            location: None,
        }
    }

    /// An enum value
    pub fn enum_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKindAst::EnumValue,
            is_array: false,
            is_optional: false,
            default_value: None,
            validator: None,
            decorators: Vec::new(),
            location: None,
        }
    }

    /// Mark the property as an array
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Mark the property optional
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Attach a validator
    pub fn with_validator(mut self, validator: ValidatorAst) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// A validator clause as written in the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidatorAst {
    /// `regex=/<pattern>/<flags>`
    Regex {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    /// `range=[<min>,<max>]`; either bound may be open
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lower: Option<serde_json::Number>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper: Option<serde_json::Number>,
    },
    /// `length=[<min>,<max>]`; either bound may be open
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
    },
}

/// A decorator application: `@name(arg, …)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorAst {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<DecoratorArg>,
}

/// One positional decorator argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecoratorArg {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// A reference to a declared type, as written
    TypeReference(String),
}
