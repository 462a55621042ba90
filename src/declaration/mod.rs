//! Validated declaration graph
//!
//! The linked, in-memory form of the metamodel AST. A
//! [`ClassDeclaration`] is a single kind-tagged record covering assets,
//! participants, transactions, events, concepts, and enums; its
//! [`Property`] list is likewise kind-tagged (field / relationship / enum
//! value). Cross-declaration references stay name-based (FQN strings), so
//! mutually referencing declarations never form pointer cycles; traversals
//! resolve names through the [`crate::model_manager::ModelManager`].

mod decorator;
mod property;
mod validator;

pub use decorator::Decorator;
pub use property::{Property, PropertyKind};
pub use validator::{StringRegexValidator, Validator};

use crate::error::{ConcertoError, Result, SourceLocation};
use crate::metamodel::{DeclarationAst, DeclarationKind, IdentityAst};
use crate::model_manager::ModelManager;
use crate::util;

/// One validated declaration: a typed entity within a namespace
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    kind: DeclarationKind,
    namespace: String,
    name: String,
    is_abstract: bool,
    identity: Option<IdentityAst>,
    super_type_name: Option<String>,
    resolved_super_type: Option<String>,
    identifier_field: Option<String>,
    properties: Vec<Property>,
    decorators: Vec<Decorator>,
    location: Option<SourceLocation>,
}

impl ClassDeclaration {
    /// Build from the AST node; resolution and identifier state start empty
    pub fn from_ast(namespace: &str, ast: &DeclarationAst) -> Self {
        Self {
            kind: ast.kind,
            namespace: namespace.to_string(),
            name: ast.name.clone(),
            is_abstract: ast.is_abstract,
            identity: ast.identity.clone(),
            super_type_name: ast.super_type.clone(),
            resolved_super_type: None,
            identifier_field: None,
            properties: ast.properties.iter().map(Property::from_ast).collect(),
            decorators: ast.decorators.iter().map(Decorator::from_ast).collect(),
            location: ast.location.clone(),
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified name: `<namespace>.<name>`
    pub fn fqn(&self) -> String {
        util::join_fqn(&self.namespace, &self.name)
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DeclarationKind::Enum
    }

    pub fn is_concept(&self) -> bool {
        self.kind == DeclarationKind::Concept
    }

    /// Whether instances of this declaration carry an identifier
    pub fn is_identifiable(&self) -> bool {
        self.kind.is_identifiable()
    }

    /// The identity clause declared on this class itself, if any
    pub fn identity(&self) -> Option<&IdentityAst> {
        self.identity.as_ref()
    }

    /// Whether this class itself declares `identified by <field>`
    pub fn is_explicitly_identified(&self) -> bool {
        matches!(self.identity, Some(IdentityAst::Field(_)))
    }

    /// The supertype as written in the schema, if any
    pub fn super_type_name(&self) -> Option<&str> {
        self.super_type_name.as_deref()
    }

    /// The resolved supertype FQN. Present after validation for every
    /// declaration except the five roots and enums without `extends`.
    pub fn super_type(&self) -> Option<&str> {
        self.resolved_super_type.as_deref()
    }

    /// The identifier field name, own or inherited. Present after
    /// validation on every identifiable declaration.
    pub fn identifier_field(&self) -> Option<&str> {
        self.identifier_field.as_deref()
    }

    /// Properties declared on this class itself, in declaration order
    pub fn get_own_properties(&self) -> &[Property] {
        &self.properties
    }

    /// A property declared on this class itself
    pub fn get_own_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub(crate) fn set_resolved_super_type(&mut self, fqn: Option<String>) {
        self.resolved_super_type = fqn;
    }

    pub(crate) fn set_identifier_field(&mut self, field: Option<String>) {
        self.identifier_field = field;
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }

    /// The ancestor chain, nearest first, excluding this declaration
    pub fn get_all_super_type_declarations<'a>(
        &'a self,
        manager: &'a ModelManager,
    ) -> Result<Vec<&'a ClassDeclaration>> {
        let mut chain = Vec::new();
        let mut seen = vec![self.fqn()];
        let mut current = self.super_type().map(|s| s.to_string());
        while let Some(fqn) = current {
            if seen.contains(&fqn) {
                return Err(ConcertoError::IllegalModel(format!(
                    "Supertype cycle detected at {}",
                    fqn
                )));
            }
            let decl = manager.get_type(&fqn)?;
            seen.push(fqn);
            current = decl.super_type().map(|s| s.to_string());
            chain.push(decl);
        }
        Ok(chain)
    }

    /// Own plus all inherited properties, inherited first, each group in
    /// declaration order
    pub fn get_properties<'a>(
        &'a self,
        manager: &'a ModelManager,
    ) -> Result<Vec<&'a Property>> {
        let mut chain = self.get_all_super_type_declarations(manager)?;
        chain.reverse();
        let mut properties: Vec<&Property> = Vec::new();
        for ancestor in chain {
            properties.extend(ancestor.get_own_properties().iter());
        }
        properties.extend(self.get_own_properties().iter());
        Ok(properties)
    }

    /// A property by name, searching own then inherited
    pub fn get_property<'a>(
        &'a self,
        name: &str,
        manager: &'a ModelManager,
    ) -> Result<Option<&'a Property>> {
        if let Some(found) = self.get_own_property(name) {
            return Ok(Some(found));
        }
        for ancestor in self.get_all_super_type_declarations(manager)? {
            if let Some(found) = ancestor.get_own_property(name) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Follow a dotted path through object-typed fields
    ///
    /// Fails when a midway segment resolves to a primitive or enum, or when
    /// any segment is not a property of the type reached so far.
    pub fn get_nested_property<'a>(
        &'a self,
        path: &str,
        manager: &'a ModelManager,
    ) -> Result<&'a Property> {
        let mut current: &ClassDeclaration = self;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let property = current.get_property(segment, manager)?.ok_or_else(|| {
                ConcertoError::IllegalModel(format!(
                    "Property {} does not exist on {}",
                    segment,
                    current.fqn()
                ))
            })?;
            if i + 1 == segments.len() {
                return Ok(property);
            }
            let type_name = property.resolved_type().ok_or_else(|| {
                ConcertoError::IllegalModel(format!(
                    "Property {} on {} has no type to descend into",
                    segment,
                    current.fqn()
                ))
            })?;
            if property.is_primitive() {
                return Err(ConcertoError::IllegalModel(format!(
                    "Property {} on {} is a primitive; cannot descend into {}",
                    segment,
                    current.fqn(),
                    path
                )));
            }
            let next = manager.get_type(type_name)?;
            if next.is_enum() {
                return Err(ConcertoError::IllegalModel(format!(
                    "Property {} on {} is an enum; cannot descend into {}",
                    segment,
                    current.fqn(),
                    path
                )));
            }
            current = next;
        }
        unreachable!("empty property path")
    }

    /// This declaration plus every declaration in the manager assignable to
    /// it, in stable order: namespace insertion order, then declaration
    /// order within each file
    pub fn get_assignable_class_declarations<'a>(
        &'a self,
        manager: &'a ModelManager,
    ) -> Result<Vec<&'a ClassDeclaration>> {
        let own_fqn = self.fqn();
        let mut assignable = Vec::new();
        for file in manager.get_model_files() {
            for decl in file.get_declarations() {
                if manager.derives_from(&decl.fqn(), &own_fqn)? {
                    assignable.push(decl);
                }
            }
        }
        Ok(assignable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::PropertyAst;

    #[test]
    fn test_from_ast() {
        let ast = DeclarationAst::new(DeclarationKind::Asset, "Vehicle")
            .with_identity(IdentityAst::Field("vin".to_string()))
            .with_property(PropertyAst::field("vin", "String"));
        let decl = ClassDeclaration::from_ast("org.acme", &ast);

        assert_eq!(decl.fqn(), "org.acme.Vehicle");
        assert_eq!(decl.kind(), DeclarationKind::Asset);
        assert!(decl.is_identifiable());
        assert!(decl.is_explicitly_identified());
        assert_eq!(decl.get_own_properties().len(), 1);
        assert!(decl.super_type().is_none());
        assert!(decl.identifier_field().is_none());
    }

    #[test]
    fn test_own_property_lookup() {
        let ast = DeclarationAst::new(DeclarationKind::Concept, "Address")
            .with_property(PropertyAst::field("city", "String"))
            .with_property(PropertyAst::field("country", "String"));
        let decl = ClassDeclaration::from_ast("org.acme", &ast);

        assert!(decl.get_own_property("city").is_some());
        assert!(decl.get_own_property("postcode").is_none());
        assert!(decl.is_concept());
        assert!(!decl.is_explicitly_identified());
    }
}
