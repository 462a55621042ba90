//! Top-level AST nodes: a set of models, one model per namespace

use super::declaration::DeclarationAst;
use serde::{Deserialize, Serialize};

/// The union AST: every model known to a manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Models {
    /// One entry per namespace
    pub models: Vec<Model>,
}

/// One namespace's AST: imports plus declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Dotted namespace path, unique within a manager
    pub namespace: String,

    /// URI the model text was fetched from, when externally sourced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,

    /// Version requirement the runtime must satisfy to load this model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concerto_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclarationAst>,
}

impl Model {
    /// Create an empty model for a namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            source_uri: None,
            concerto_version: None,
            imports: Vec::new(),
            declarations: Vec::new(),
        }
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    /// The namespace the import draws from
    pub namespace: String,

    /// Which names are imported
    pub kind: ImportKind,

    /// Optional external source URI (`from <uri>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Import {
    /// Import specific names from a namespace
    pub fn types(namespace: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: ImportKind::Types(names),
            uri: None,
        }
    }

    /// Import every name from a namespace (`import ns.*`)
    pub fn all(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: ImportKind::All,
            uri: None,
        }
    }

    /// Attach an external source URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Which names an import brings into scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportKind {
    /// `import ns.Name` for each listed name
    Types(Vec<String>),
    /// `import ns.*`
    All,
}
