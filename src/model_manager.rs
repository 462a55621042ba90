//! Registry of model files and cross-file validation
//!
//! The manager owns one [`ModelFile`] per namespace. Every mutation
//! validates against a copy of the registry and commits only on success, so
//! a failed add, update, or batch leaves the previous state untouched.
//! Construction installs the built-in `concerto` root model.

use crate::declaration::ClassDeclaration;
use crate::error::{ConcertoError, Result};
use crate::metamodel::root::{root_model, ROOT_NAMESPACE};
use crate::metamodel::{Model, Models};
use crate::model_file::ModelFile;
use crate::util;
use indexmap::IndexMap;
use tracing::debug;

/// The registry of all loaded model files
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_files: IndexMap<String, ModelFile>,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelManager {
    /// Create a manager with the root model installed
    pub fn new() -> Self {
        Self {
            model_files: Self::bootstrap(),
        }
    }

    fn bootstrap() -> IndexMap<String, ModelFile> {
        let root = ModelFile::from_ast(root_model(), None, false)
            .expect("root model is well-formed");
        let mut files = IndexMap::new();
        files.insert(root.namespace().to_string(), root);
        Self::validate_files(files).expect("root model validates")
    }

    /// Resolve then semantically validate a candidate registry
    fn validate_files(mut files: IndexMap<String, ModelFile>) -> Result<IndexMap<String, ModelFile>> {
        let snapshot = files.clone();
        for file in files.values_mut() {
            file.resolve(&snapshot)?;
        }
        let snapshot = files.clone();
        for file in files.values_mut() {
            file.validate(&snapshot)?;
        }
        Ok(files)
    }

    fn check_addable(&self, model: &Model, expect_present: bool) -> Result<()> {
        if model.namespace == ROOT_NAMESPACE {
            return Err(ConcertoError::IllegalModel(format!(
                "Namespace {} is reserved",
                ROOT_NAMESPACE
            )));
        }
        let present = self.model_files.contains_key(&model.namespace);
        if expect_present && !present {
            return Err(ConcertoError::TypeNotFound(format!(
                "Model file for namespace {} not found",
                model.namespace
            )));
        }
        if !expect_present && present {
            return Err(ConcertoError::IllegalModel(format!(
                "Namespace {} is already declared",
                model.namespace
            )));
        }
        Ok(())
    }

    /// Add one model; the whole registry is revalidated before commit
    pub fn add_model_file(&mut self, model: Model) -> Result<()> {
        self.add_model_file_with_options(model, None, false)
    }

    /// Add one model with an explicit file name for error reporting, and
    /// optionally without validation (the caller promises a later
    /// [`Self::validate`] or batched commit)
    pub fn add_model_file_with_options(
        &mut self,
        model: Model,
        file_name: Option<String>,
        skip_validation: bool,
    ) -> Result<()> {
        self.check_addable(&model, false)?;
        let namespace = model.namespace.clone();
        let file = ModelFile::from_ast(model, file_name, false)?;
        let mut next = self.model_files.clone();
        next.insert(namespace.clone(), file);
        self.model_files = if skip_validation {
            next
        } else {
            Self::validate_files(next)?
        };
        debug!(namespace = %namespace, "added model file");
        Ok(())
    }

    /// Add a batch of models; all-or-nothing with validation deferred to the
    /// end. On any failure the registry is left exactly as before the call.
    pub fn add_model_files(&mut self, models: Vec<Model>) -> Result<()> {
        let mut next = self.model_files.clone();
        for model in models {
            self.check_addable(&model, false)?;
            if next.contains_key(&model.namespace) {
                return Err(ConcertoError::IllegalModel(format!(
                    "Namespace {} is already declared",
                    model.namespace
                )));
            }
            let namespace = model.namespace.clone();
            let file = ModelFile::from_ast(model, None, false)?;
            next.insert(namespace, file);
        }
        self.model_files = Self::validate_files(next)?;
        debug!(count = self.model_files.len(), "added model file batch");
        Ok(())
    }

    /// Replace an existing namespace's model
    pub fn update_model_file(&mut self, model: Model) -> Result<()> {
        self.check_addable(&model, true)?;
        let namespace = model.namespace.clone();
        let external = self
            .model_files
            .get(&namespace)
            .map(ModelFile::is_external)
            .unwrap_or(false);
        let file = ModelFile::from_ast(model, None, external)?;
        let mut next = self.model_files.clone();
        next.insert(namespace.clone(), file);
        self.model_files = Self::validate_files(next)?;
        debug!(namespace = %namespace, "updated model file");
        Ok(())
    }

    /// Remove one namespace
    pub fn delete_model_file(&mut self, namespace: &str) -> Result<()> {
        if namespace == ROOT_NAMESPACE {
            return Err(ConcertoError::IllegalModel(format!(
                "Namespace {} is reserved",
                ROOT_NAMESPACE
            )));
        }
        if self.model_files.shift_remove(namespace).is_none() {
            return Err(ConcertoError::TypeNotFound(format!(
                "Model file for namespace {} not found",
                namespace
            )));
        }
        debug!(namespace = %namespace, "deleted model file");
        Ok(())
    }

    /// Drop every user model, reinstating only the root
    pub fn clear_model_files(&mut self) {
        self.model_files = Self::bootstrap();
        debug!("cleared model files");
    }

    /// Revalidate the whole registry in place
    pub fn validate(&mut self) -> Result<()> {
        self.model_files = Self::validate_files(self.model_files.clone())?;
        Ok(())
    }

    /// The model file for a namespace
    pub fn get_model_file(&self, namespace: &str) -> Option<&ModelFile> {
        self.model_files.get(namespace)
    }

    /// All model files in insertion order, root first
    pub fn get_model_files(&self) -> impl Iterator<Item = &ModelFile> {
        self.model_files.values()
    }

    /// All loaded namespaces in insertion order
    pub fn get_namespaces(&self) -> Vec<&str> {
        self.model_files.keys().map(String::as_str).collect()
    }

    pub(crate) fn files(&self) -> &IndexMap<String, ModelFile> {
        &self.model_files
    }

    pub(crate) fn install_files(&mut self, files: IndexMap<String, ModelFile>) {
        self.model_files = files;
    }

    pub(crate) fn validate_candidate(
        files: IndexMap<String, ModelFile>,
    ) -> Result<IndexMap<String, ModelFile>> {
        Self::validate_files(files)
    }

    /// The declaration for a fully qualified name
    pub fn get_type(&self, fqn: &str) -> Result<&ClassDeclaration> {
        let (ns, short) = (util::get_namespace(fqn), util::get_short_name(fqn));
        self.model_files
            .get(ns)
            .and_then(|f| f.get_local_type(short))
            .ok_or_else(|| ConcertoError::TypeNotFound(fqn.to_string()))
    }

    /// Resolve a type name in the context of a namespace to its canonical
    /// form: a primitive name or an FQN
    pub fn resolve_type(&self, context_namespace: &str, name: &str) -> Result<String> {
        let file = self.model_files.get(context_namespace).ok_or_else(|| {
            ConcertoError::IllegalModel(format!(
                "Namespace {} is not loaded",
                context_namespace
            ))
        })?;
        file.resolve_type_name(name, &self.model_files)
    }

    /// Whether declaration `a` equals `b` or transitively extends it
    pub fn derives_from(&self, a: &str, b: &str) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        let mut seen = vec![a.to_string()];
        let mut current = self.get_type(a)?.super_type().map(|s| s.to_string());
        while let Some(fqn) = current {
            if fqn == b {
                return Ok(true);
            }
            if seen.contains(&fqn) {
                break;
            }
            seen.push(fqn.clone());
            current = self.get_type(&fqn)?.super_type().map(|s| s.to_string());
        }
        Ok(false)
    }

    /// The union AST of every user model
    ///
    /// With `resolve` set, every type reference inside the AST is rewritten
    /// to its canonical form.
    pub fn get_ast(&self, resolve: bool) -> Result<Models> {
        let mut models = Vec::new();
        for file in self.model_files.values() {
            if file.namespace() == ROOT_NAMESPACE {
                continue;
            }
            models.push(if resolve {
                file.resolved_ast(&self.model_files)?
            } else {
                file.ast().clone()
            });
        }
        Ok(Models { models })
    }

    /// Replace the registry contents from a union AST
    pub fn from_ast(&mut self, ast: Models) -> Result<()> {
        let mut next = Self::bootstrap();
        for model in ast.models {
            if model.namespace == ROOT_NAMESPACE {
                return Err(ConcertoError::IllegalModel(format!(
                    "Namespace {} is reserved",
                    ROOT_NAMESPACE
                )));
            }
            let namespace = model.namespace.clone();
            if next.contains_key(&namespace) {
                return Err(ConcertoError::IllegalModel(format!(
                    "Namespace {} is already declared",
                    namespace
                )));
            }
            next.insert(namespace, ModelFile::from_ast(model, None, false)?);
        }
        self.model_files = Self::validate_files(next)?;
        Ok(())
    }
}
