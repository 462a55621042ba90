//! Visitor contract over the declaration graph
//!
//! One dispatch seam shared by every traversal engine: the serializer, the
//! instance generator, and external code generators all accept a [`Node`]
//! plus an engine-specific parameters object. Nodes are a tagged union, so
//! a single `match` on the variant replaces runtime kind probing; the kind
//! predicates remain for engines that prefer them.

use crate::declaration::{ClassDeclaration, Property};
use crate::error::Result;
use crate::model_file::ModelFile;
use crate::model_manager::ModelManager;

/// Any node a traversal engine can be handed
#[derive(Clone, Copy)]
pub enum Node<'a> {
    ModelManager(&'a ModelManager),
    ModelFile(&'a ModelFile),
    ClassDeclaration(&'a ClassDeclaration),
    Property(&'a Property),
}

impl<'a> Node<'a> {
    pub fn is_model_manager(&self) -> bool {
        matches!(self, Node::ModelManager(_))
    }

    pub fn is_model_file(&self) -> bool {
        matches!(self, Node::ModelFile(_))
    }

    pub fn is_class_declaration(&self) -> bool {
        matches!(self, Node::ClassDeclaration(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Node::ClassDeclaration(d) if d.is_enum())
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Node::Property(p) if p.is_field())
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Node::Property(p) if p.is_relationship())
    }

    pub fn is_enum_value(&self) -> bool {
        matches!(self, Node::Property(p) if p.is_enum_value())
    }
}

/// A traversal engine over the declaration graph
///
/// Engines accumulate results in their `Parameters` object: a file-writer
/// sink for code generators, an output accumulator for the serializer, the
/// generation stack for the instance generator.
pub trait Visitor {
    type Parameters;
    type Output;

    fn visit(&mut self, node: Node<'_>, parameters: &mut Self::Parameters) -> Result<Self::Output>;
}
