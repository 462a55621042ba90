//! # concerto-core
//!
//! A schema language runtime for business-domain data models. Schemas
//! declare typed entities (assets, participants, transactions, events,
//! concepts, enums) organized into namespaces with imports, inheritance,
//! primitive fields, object fields, and typed relationships. This crate
//! consumes the metamodel AST an external text parser produces, resolves it
//! into a validated declaration graph, and runs three engines against that
//! graph:
//!
//! - the [`factory::Factory`] instantiates typed, validated records
//! - the [`serializer::Serializer`] round-trips records to and from
//!   canonical JSON
//! - the [`generator::InstanceGenerator`] builds sample instances with
//!   recursion guarding
//!
//! # Example
//!
//! ```rust
//! use concerto_core::metamodel::{
//!     DeclarationAst, DeclarationKind, IdentityAst, Model, PropertyAst,
//! };
//! use concerto_core::{Factory, InstantiateOptions, ModelManager, Serializer, Value};
//!
//! # fn main() -> concerto_core::Result<()> {
//! let mut model = Model::new("org.acme.sample");
//! model.declarations.push(
//!     DeclarationAst::new(DeclarationKind::Asset, "SampleAsset")
//!         .with_identity(IdentityAst::Field("assetId".to_string()))
//!         .with_property(PropertyAst::field("assetId", "String"))
//!         .with_property(PropertyAst::field("stringValue", "String")),
//! );
//!
//! let mut manager = ModelManager::new();
//! manager.add_model_file(model)?;
//!
//! let factory = Factory::new(&manager);
//! let mut asset = factory.new_resource(
//!     "org.acme.sample",
//!     "SampleAsset",
//!     "1",
//!     InstantiateOptions::default(),
//! )?;
//! asset.set_property("stringValue", Value::String("the value".to_string()));
//!
//! let serializer = Serializer::new(&manager);
//! let json = serializer.to_json(&asset, None)?;
//! assert_eq!(json["$class"], "org.acme.sample.SampleAsset");
//! assert_eq!(json["$identifier"], "1");
//!
//! let round_tripped = serializer.from_json(&json, None)?;
//! assert_eq!(round_tripped, asset);
//! # Ok(())
//! # }
//! ```

pub mod declaration;
pub mod error;
pub mod external;
pub mod factory;
pub mod generator;
pub mod instance;
pub mod metamodel;
pub mod model_file;
pub mod model_manager;
pub mod serializer;
pub mod util;
pub mod visitor;
pub mod writer;

/// The runtime version checked against model files' version pins
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{ConcertoError, ErrorCategory, Result, SourceLocation};
pub use external::{ModelDownloader, SchemaParser};
pub use factory::{Factory, InstantiateOptions};
pub use generator::{
    EmptyValueGenerator, GenerateMode, InstanceGenerator, SampleValueGenerator, ValueGenerator,
};
pub use instance::{Instance, Relationship, Value};
pub use model_file::ModelFile;
pub use model_manager::ModelManager;
pub use serializer::{Serializer, SerializerOptions};
pub use visitor::{Node, Visitor};
pub use writer::{FileWriter, InMemoryFileWriter};
