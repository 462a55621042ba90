//! External collaborators: the text parser and the model downloader
//!
//! The concrete `.cto` parser and the transport that fetches external
//! models live outside this crate. Both are represented here as traits; the
//! manager's text-based operations take them as arguments so callers decide
//! the implementations.

use crate::error::{ConcertoError, Result};
use crate::metamodel::root::ROOT_NAMESPACE;
use crate::metamodel::Model;
use crate::model_file::ModelFile;
use crate::model_manager::ModelManager;
use async_trait::async_trait;
use tracing::info;

/// Parses schema text into a metamodel AST
pub trait SchemaParser {
    /// Parse one model's text; `file_name` feeds error locations
    fn parse(&self, text: &str, file_name: Option<&str>) -> Result<Model>;
}

/// Fetches external model text by URI
///
/// The only suspending operation in the crate. Errors are propagated
/// unchanged and abort the surrounding update.
#[async_trait]
pub trait ModelDownloader: Send + Sync {
    async fn download(&self, uri: &str) -> Result<String>;
}

impl ModelManager {
    /// Parse schema text through the supplied parser and add the result
    pub fn add_model_text(
        &mut self,
        text: &str,
        parser: &dyn SchemaParser,
        file_name: Option<&str>,
    ) -> Result<()> {
        let model = parser.parse(text, file_name)?;
        self.add_model_file_with_options(model, file_name.map(str::to_string), false)
    }

    /// Download, parse, and install every external import, transitively
    ///
    /// Walks all imports carrying a `from <uri>` annotation, fetches each
    /// URI once, and installs the parsed models flagged external. The whole
    /// registry is revalidated before commit; any download, parse, or
    /// validation failure leaves the registry exactly as it was.
    ///
    /// Returns the namespaces that were added or replaced.
    pub async fn update_external_models(
        &mut self,
        downloader: &dyn ModelDownloader,
        parser: &dyn SchemaParser,
    ) -> Result<Vec<String>> {
        let mut next = self.files().clone();
        let mut queue: Vec<String> = Vec::new();
        for file in next.values() {
            for import in file.get_imports() {
                if let Some(uri) = &import.uri {
                    if !queue.contains(uri) {
                        queue.push(uri.clone());
                    }
                }
            }
        }

        let mut updated = Vec::new();
        let mut index = 0;
        while index < queue.len() {
            let uri = queue[index].clone();
            index += 1;

            info!(uri = %uri, "downloading external model");
            let text = downloader.download(&uri).await?;
            let mut model = parser.parse(&text, Some(&uri))?;
            if model.namespace == ROOT_NAMESPACE {
                return Err(ConcertoError::IllegalModel(format!(
                    "External model from {} declares the reserved namespace {}",
                    uri, ROOT_NAMESPACE
                )));
            }
            model.source_uri = Some(uri.clone());
            let file = ModelFile::from_ast(model, None, true)?;

            // external models may themselves import external models
            for import in file.get_imports() {
                if let Some(nested) = &import.uri {
                    if !queue.contains(nested) {
                        queue.push(nested.clone());
                    }
                }
            }
            updated.push(file.namespace().to_string());
            next.insert(file.namespace().to_string(), file);
        }

        let validated = ModelManager::validate_candidate(next)?;
        self.install_files(validated);
        info!(count = updated.len(), "external models installed");
        Ok(updated)
    }
}
