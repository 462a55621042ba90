//! Metamodel AST
//!
//! This module defines the abstract syntax tree produced by the external
//! `.cto` text parser and consumed by the model manager. The AST is plain
//! serde data: it carries no resolution state and may reference types by
//! short name. [`crate::model_file::ModelFile`] turns one [`Model`] into a
//! validated declaration graph.

mod declaration;
mod model;
pub mod root;

pub use declaration::{
    DeclarationAst, DeclarationKind, DecoratorArg, DecoratorAst, IdentityAst, PropertyAst,
    PropertyKindAst, ValidatorAst,
};
pub use model::{Import, ImportKind, Model, Models};
