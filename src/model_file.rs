//! One namespace's declarations and imports
//!
//! A `ModelFile` is built from a single metamodel [`Model`] node. It owns
//! local short-name resolution: primitives first, then local declarations,
//! then named imports, then wildcard imports in declaration order. Every
//! non-root file implicitly imports the five root type names so a bare
//! `Asset` or `Concept` resolves without an explicit import.

use crate::declaration::{ClassDeclaration, Validator};
use crate::error::{ConcertoError, Result};
use crate::metamodel::root::{ROOT_NAMESPACE, SYSTEM_IDENTIFIER};
use crate::metamodel::{IdentityAst, Import, ImportKind, Model, PropertyKindAst};
use crate::util;
use indexmap::IndexMap;

/// A loaded model file: one namespace, its imports, and its declarations
#[derive(Debug, Clone)]
pub struct ModelFile {
    namespace: String,
    ast: Model,
    file_name: Option<String>,
    external: bool,
    declarations: Vec<ClassDeclaration>,
    imported_types: IndexMap<String, String>,
    wildcard_namespaces: Vec<String>,
}

impl ModelFile {
    /// Build a model file from its AST
    ///
    /// Checks purely local invariants: unique declaration names, unique
    /// property names per declaration, unique named imports. Cross-file
    /// state stays unresolved until the owning manager validates.
    pub fn from_ast(ast: Model, file_name: Option<String>, external: bool) -> Result<Self> {
        let namespace = ast.namespace.clone();
        if namespace.is_empty() {
            return Err(ConcertoError::IllegalModel(
                "Model has no namespace".to_string(),
            ));
        }

        let mut declarations = Vec::with_capacity(ast.declarations.len());
        for decl_ast in &ast.declarations {
            if declarations
                .iter()
                .any(|d: &ClassDeclaration| d.name() == decl_ast.name)
            {
                return Err(ConcertoError::illegal_model(
                    format!(
                        "Duplicate declaration {} in namespace {}",
                        decl_ast.name, namespace
                    ),
                    decl_ast.location.clone(),
                ));
            }
            let mut own_names: Vec<&str> = Vec::new();
            for prop in &decl_ast.properties {
                if own_names.contains(&prop.name.as_str()) {
                    return Err(ConcertoError::illegal_model(
                        format!(
                            "Duplicate property {} on {}.{}",
                            prop.name, namespace, decl_ast.name
                        ),
                        prop.location.clone(),
                    ));
                }
                own_names.push(&prop.name);
            }
            declarations.push(ClassDeclaration::from_ast(&namespace, decl_ast));
        }

        let mut imported_types: IndexMap<String, String> = IndexMap::new();
        let mut wildcard_namespaces = Vec::new();
        for import in &ast.imports {
            match &import.kind {
                ImportKind::Types(names) => {
                    for name in names {
                        let fqn = util::join_fqn(&import.namespace, name);
                        if imported_types.insert(name.clone(), fqn).is_some() {
                            return Err(ConcertoError::IllegalModel(format!(
                                "Duplicate import of {} in namespace {}",
                                name, namespace
                            )));
                        }
                    }
                }
                ImportKind::All => {
                    wildcard_namespaces.push(import.namespace.clone());
                }
            }
        }

        // implicit root-type imports; explicit imports of the same names win
        if namespace != ROOT_NAMESPACE {
            for root_name in crate::metamodel::root::root_type_names() {
                if !imported_types.contains_key(root_name) {
                    imported_types.insert(
                        root_name.to_string(),
                        util::join_fqn(ROOT_NAMESPACE, root_name),
                    );
                }
            }
        }

        Ok(Self {
            namespace,
            ast,
            file_name,
            external,
            declarations,
            imported_types,
            wildcard_namespaces,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The source AST this file was built from
    pub fn ast(&self) -> &Model {
        &self.ast
    }

    /// Whether this file was installed by an external-model download
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// The display file name; external files carry the conventional `@` prefix
    pub fn display_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None if self.external => format!("@{}.cto", self.namespace),
            None => format!("{}.cto", self.namespace),
        }
    }

    /// The version requirement this file pins, if any
    pub fn concerto_version(&self) -> Option<&str> {
        self.ast.concerto_version.as_deref()
    }

    pub fn get_declarations(&self) -> &[ClassDeclaration] {
        &self.declarations
    }

    /// A declaration defined in this namespace
    pub fn get_local_type(&self, name: &str) -> Option<&ClassDeclaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }

    /// The import declarations of this file
    pub fn get_imports(&self) -> &[Import] {
        &self.ast.imports
    }

    /// Resolve a type name used inside this file to a primitive name or FQN
    ///
    /// Order: primitives, local declarations, named imports, wildcard
    /// imports in declaration order. A fully qualified name is accepted when
    /// its namespace is loaded and declares the type.
    pub(crate) fn resolve_type_name(
        &self,
        name: &str,
        files: &IndexMap<String, ModelFile>,
    ) -> Result<String> {
        if util::is_primitive(name) {
            return Ok(name.to_string());
        }
        if util::is_fully_qualified(name) {
            let (ns, short) = (util::get_namespace(name), util::get_short_name(name));
            return match files.get(ns).and_then(|f| f.get_local_type(short)) {
                Some(_) => Ok(name.to_string()),
                None => Err(ConcertoError::IllegalModel(format!(
                    "Undeclared type {} used in namespace {}",
                    name, self.namespace
                ))),
            };
        }
        if self.get_local_type(name).is_some() {
            return Ok(util::join_fqn(&self.namespace, name));
        }
        if let Some(fqn) = self.imported_types.get(name) {
            return Ok(fqn.clone());
        }
        for wildcard in &self.wildcard_namespaces {
            if let Some(file) = files.get(wildcard) {
                if file.get_local_type(name).is_some() {
                    return Ok(util::join_fqn(wildcard, name));
                }
            }
        }
        Err(ConcertoError::IllegalModel(format!(
            "Undeclared type {} used in namespace {}",
            name, self.namespace
        )))
    }

    /// Resolution pass: verify imports and rewrite every type reference
    /// (supertype, field type, relationship target) to its canonical form
    pub(crate) fn resolve(&mut self, files: &IndexMap<String, ModelFile>) -> Result<()> {
        for (short, fqn) in &self.imported_types {
            let ns = util::get_namespace(fqn);
            let target = files.get(ns).ok_or_else(|| {
                ConcertoError::IllegalModel(format!(
                    "Import of {} in namespace {} references unknown namespace {}",
                    fqn, self.namespace, ns
                ))
            })?;
            if target.get_local_type(short).is_none() {
                return Err(ConcertoError::IllegalModel(format!(
                    "Import of {} in namespace {}: type {} not found in {}",
                    fqn, self.namespace, short, ns
                )));
            }
        }
        for wildcard in &self.wildcard_namespaces {
            if !files.contains_key(wildcard) {
                return Err(ConcertoError::IllegalModel(format!(
                    "Wildcard import of {}.* in namespace {} references unknown namespace",
                    wildcard, self.namespace
                )));
            }
        }

        let resolver = self.clone();
        for decl in &mut self.declarations {
            let resolved_super = match decl.super_type_name() {
                Some(written) => {
                    let fqn = resolver.resolve_type_name(written, files)?;
                    if util::is_primitive(&fqn) {
                        return Err(ConcertoError::IllegalModel(format!(
                            "{} cannot extend primitive type {}",
                            decl.fqn(),
                            fqn
                        )));
                    }
                    if fqn == decl.fqn() {
                        return Err(ConcertoError::IllegalModel(format!(
                            "{} cannot extend itself",
                            decl.fqn()
                        )));
                    }
                    Some(fqn)
                }
                None if resolver.namespace == ROOT_NAMESPACE => None,
                None => decl.kind().root_type().map(|s| s.to_string()),
            };
            decl.set_resolved_super_type(resolved_super);

            let decl_fqn = decl.fqn();
            for prop in decl.properties_mut() {
                if let Some(declared) = prop.declared_type().map(|s| s.to_string()) {
                    let resolved =
                        resolver.resolve_type_name(&declared, files).map_err(|_| {
                            ConcertoError::IllegalModel(format!(
                                "Undeclared type {} of property {} on {}",
                                declared,
                                prop.name(),
                                decl_fqn
                            ))
                        })?;
                    prop.set_resolved_type(resolved);
                }
            }
        }
        Ok(())
    }

    /// Semantic validation pass; runs after every file has been resolved
    pub(crate) fn validate(&mut self, files: &IndexMap<String, ModelFile>) -> Result<()> {
        if let Some(requirement) = self.concerto_version() {
            if !util::version_satisfies(requirement, crate::VERSION)? {
                return Err(ConcertoError::IllegalModel(format!(
                    "Model file {} requires version {} but this runtime is {}",
                    self.display_name(),
                    requirement,
                    crate::VERSION
                )));
            }
        }

        for i in 0..self.declarations.len() {
            self.validate_declaration(i, files)?;
        }
        Ok(())
    }

    fn validate_declaration(
        &mut self,
        index: usize,
        files: &IndexMap<String, ModelFile>,
    ) -> Result<()> {
        let decl = &self.declarations[index];
        let fqn = decl.fqn();

        // supertype kind family and cycle detection
        let ancestors = ancestor_chain(decl, files)?;
        if let Some(super_fqn) = decl.super_type() {
            let super_decl = lookup(files, super_fqn).ok_or_else(|| {
                ConcertoError::IllegalModel(format!(
                    "Supertype {} of {} is not defined",
                    super_fqn, fqn
                ))
            })?;
            if super_decl.kind() != decl.kind() {
                return Err(ConcertoError::IllegalModel(format!(
                    "{} ({}) cannot extend {} ({})",
                    fqn,
                    decl.kind().keyword(),
                    super_fqn,
                    super_decl.kind().keyword()
                )));
            }
        }

        // identifier determination
        let identifier = match decl.identity() {
            Some(IdentityAst::Field(field)) => {
                if !decl.kind().is_identifiable() {
                    return Err(ConcertoError::IllegalModel(format!(
                        "{} is a {} and cannot declare an identifier",
                        fqn,
                        decl.kind().keyword()
                    )));
                }
                if let Some(ancestor) = ancestors
                    .iter()
                    .find(|a| a.is_explicitly_identified())
                {
                    return Err(ConcertoError::IllegalModel(format!(
                        "{} cannot redeclare the identifier of {}",
                        fqn,
                        ancestor.fqn()
                    )));
                }
                let field_decl = decl.get_own_property(field).ok_or_else(|| {
                    ConcertoError::IllegalModel(format!(
                        "Identifier field {} is not declared on {}",
                        field, fqn
                    ))
                })?;
                if !field_decl.is_field()
                    || field_decl.is_array()
                    || field_decl.resolved_type() != Some("String")
                {
                    return Err(ConcertoError::IllegalModel(format!(
                        "Identifier field {} on {} must be a non-array String field",
                        field, fqn
                    )));
                }
                Some(field.clone())
            }
            Some(IdentityAst::System) => Some(SYSTEM_IDENTIFIER.to_string()),
            None => ancestors.iter().find_map(|a| match a.identity() {
                Some(IdentityAst::Field(field)) => Some(field.clone()),
                Some(IdentityAst::System) => Some(SYSTEM_IDENTIFIER.to_string()),
                None => None,
            }),
        };
        if identifier.is_none() && decl.kind().is_identifiable() && !decl.is_abstract() {
            return Err(ConcertoError::IllegalModel(format!(
                "{} is an identifiable {} but declares no identifier",
                fqn,
                decl.kind().keyword()
            )));
        }

        // property checks
        let inherited_names: Vec<String> = ancestors
            .iter()
            .flat_map(|a| a.get_own_properties().iter().map(|p| p.name().to_string()))
            .collect();
        let is_enum = decl.is_enum();
        for prop in decl.get_own_properties() {
            if inherited_names.contains(&prop.name().to_string()) {
                return Err(ConcertoError::IllegalModel(format!(
                    "Property {} on {} duplicates an inherited property",
                    prop.name(),
                    fqn
                )));
            }
            if is_enum && !prop.is_enum_value() {
                return Err(ConcertoError::IllegalModel(format!(
                    "Enum {} may only contain enum values, found property {}",
                    fqn,
                    prop.name()
                )));
            }
            if !is_enum && prop.is_enum_value() {
                return Err(ConcertoError::IllegalModel(format!(
                    "Enum value {} is not allowed on {} {}",
                    prop.name(),
                    decl.kind().keyword(),
                    fqn
                )));
            }
            if prop.is_relationship() {
                let target = prop.resolved_type().unwrap_or_default();
                if util::is_primitive(target) {
                    return Err(ConcertoError::IllegalModel(format!(
                        "Relationship {} on {} cannot target primitive {}",
                        prop.name(),
                        fqn,
                        target
                    )));
                }
                let target_decl = lookup(files, target).ok_or_else(|| {
                    ConcertoError::IllegalModel(format!(
                        "Relationship {} on {} targets undeclared type {}",
                        prop.name(),
                        fqn,
                        target
                    ))
                })?;
                if !target_decl.kind().is_identifiable() {
                    return Err(ConcertoError::IllegalModel(format!(
                        "Relationship {} on {} must target an identifiable type, {} is a {}",
                        prop.name(),
                        fqn,
                        target,
                        target_decl.kind().keyword()
                    )));
                }
            }
        }
        if is_enum && decl.identity().is_some() {
            return Err(ConcertoError::IllegalModel(format!(
                "Enum {} cannot declare an identifier",
                fqn
            )));
        }

        // compile validators; needs the resolved primitive type
        let decl = &mut self.declarations[index];
        let decl_fqn = decl.fqn();
        for prop in decl.properties_mut() {
            if let Some(validator_ast) = prop.validator_ast().cloned() {
                let context = format!("{}.{}", decl_fqn, prop.name());
                if !prop.is_field() {
                    return Err(ConcertoError::IllegalModel(format!(
                        "{}: validators apply only to fields",
                        context
                    )));
                }
                let primitive = prop.primitive_type().ok_or_else(|| {
                    ConcertoError::IllegalModel(format!(
                        "{}: validators apply only to primitive-typed fields",
                        context
                    ))
                })?;
                let validator = Validator::from_ast(&validator_ast, primitive, &context)?;
                prop.set_validator(validator);
            }
        }
        self.declarations[index].set_identifier_field(identifier);
        Ok(())
    }

    /// A copy of this file's AST with every type reference rewritten to its
    /// canonical form
    pub(crate) fn resolved_ast(&self, files: &IndexMap<String, ModelFile>) -> Result<Model> {
        let mut ast = self.ast.clone();
        for decl in &mut ast.declarations {
            if let Some(written) = &decl.super_type {
                decl.super_type = Some(self.resolve_type_name(written, files)?);
            }
            for prop in &mut decl.properties {
                match &mut prop.kind {
                    PropertyKindAst::Field { type_name }
                    | PropertyKindAst::Relationship { type_name } => {
                        *type_name = self.resolve_type_name(type_name, files)?;
                    }
                    PropertyKindAst::EnumValue => {}
                }
            }
        }
        Ok(ast)
    }
}

/// Look a declaration up by FQN in a file map
pub(crate) fn lookup<'a>(
    files: &'a IndexMap<String, ModelFile>,
    fqn: &str,
) -> Option<&'a ClassDeclaration> {
    let (ns, short) = (util::get_namespace(fqn), util::get_short_name(fqn));
    files.get(ns).and_then(|f| f.get_local_type(short))
}

/// Walk the resolved supertype chain, nearest ancestor first
pub(crate) fn ancestor_chain<'a>(
    decl: &ClassDeclaration,
    files: &'a IndexMap<String, ModelFile>,
) -> Result<Vec<&'a ClassDeclaration>> {
    let mut chain = Vec::new();
    let mut seen = vec![decl.fqn()];
    let mut current = decl.super_type().map(|s| s.to_string());
    while let Some(fqn) = current {
        if seen.contains(&fqn) {
            return Err(ConcertoError::IllegalModel(format!(
                "Supertype cycle detected involving {}",
                fqn
            )));
        }
        let ancestor = lookup(files, &fqn).ok_or_else(|| {
            ConcertoError::IllegalModel(format!("Supertype {} is not defined", fqn))
        })?;
        seen.push(fqn);
        current = ancestor.super_type().map(|s| s.to_string());
        chain.push(ancestor);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{DeclarationAst, DeclarationKind, PropertyAst};

    fn sample_model() -> Model {
        let mut model = Model::new("org.acme.sample");
        model.declarations.push(
            DeclarationAst::new(DeclarationKind::Asset, "Vehicle")
                .with_identity(IdentityAst::Field("vin".to_string()))
                .with_property(PropertyAst::field("vin", "String")),
        );
        model
    }

    #[test]
    fn test_from_ast_builds_declarations() {
        let file = ModelFile::from_ast(sample_model(), None, false).unwrap();
        assert_eq!(file.namespace(), "org.acme.sample");
        assert!(file.get_local_type("Vehicle").is_some());
        assert!(file.get_local_type("Missing").is_none());
        assert_eq!(file.display_name(), "org.acme.sample.cto");
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut model = sample_model();
        model
            .declarations
            .push(DeclarationAst::new(DeclarationKind::Concept, "Vehicle"));
        let err = ModelFile::from_ast(model, None, false).unwrap_err();
        assert!(err.to_string().contains("Duplicate declaration"));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let mut model = Model::new("org.acme");
        model.declarations.push(
            DeclarationAst::new(DeclarationKind::Concept, "Address")
                .with_property(PropertyAst::field("city", "String"))
                .with_property(PropertyAst::field("city", "String")),
        );
        let err = ModelFile::from_ast(model, None, false).unwrap_err();
        assert!(err.to_string().contains("Duplicate property"));
    }

    #[test]
    fn test_implicit_root_imports() {
        let file = ModelFile::from_ast(sample_model(), None, false).unwrap();
        assert_eq!(
            file.imported_types.get("Asset").map(String::as_str),
            Some("concerto.Asset")
        );
        assert_eq!(
            file.imported_types.get("Concept").map(String::as_str),
            Some("concerto.Concept")
        );
    }

    #[test]
    fn test_external_display_name() {
        let file = ModelFile::from_ast(sample_model(), None, true).unwrap();
        assert_eq!(file.display_name(), "@org.acme.sample.cto");
    }

    #[test]
    fn test_resolve_type_name_precedence() {
        let mut files = IndexMap::new();
        let root = ModelFile::from_ast(crate::metamodel::root::root_model(), None, false).unwrap();
        files.insert(root.namespace().to_string(), root);
        let file = ModelFile::from_ast(sample_model(), None, false).unwrap();
        files.insert(file.namespace().to_string(), file.clone());

        assert_eq!(file.resolve_type_name("String", &files).unwrap(), "String");
        assert_eq!(
            file.resolve_type_name("Vehicle", &files).unwrap(),
            "org.acme.sample.Vehicle"
        );
        assert_eq!(
            file.resolve_type_name("Asset", &files).unwrap(),
            "concerto.Asset"
        );
        assert!(file.resolve_type_name("Unknown", &files).is_err());
    }
}
