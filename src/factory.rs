//! Typed instance construction

use crate::error::{ConcertoError, Result};
use crate::generator::{
    pick_concrete, EmptyValueGenerator, GenerateMode, InstanceGenerator, SampleValueGenerator,
    ValueGenerator,
};
use crate::instance::{Instance, Relationship, Value};
use crate::metamodel::root::SYSTEM_IDENTIFIER;
use crate::model_manager::ModelManager;
use crate::util;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Options controlling instantiation
#[derive(Debug, Clone, Default)]
pub struct InstantiateOptions {
    /// Populate properties with generated values
    pub generate: Option<GenerateMode>,
    /// Generate optional properties too
    pub include_optional_fields: bool,
    /// Leave `$timestamp` unset on transactions and events
    pub disable_timestamp: bool,
}

impl InstantiateOptions {
    /// Populate with sample values
    pub fn sample() -> Self {
        Self {
            generate: Some(GenerateMode::Sample),
            ..Self::default()
        }
    }

    /// Populate with empty values
    pub fn empty() -> Self {
        Self {
            generate: Some(GenerateMode::Empty),
            ..Self::default()
        }
    }

    /// Generate optional properties too
    pub fn with_optional_fields(mut self) -> Self {
        self.include_optional_fields = true;
        self
    }
}

/// Creates fresh typed instances consistent with their declarations
pub struct Factory<'a> {
    manager: &'a ModelManager,
}

impl<'a> Factory<'a> {
    pub fn new(manager: &'a ModelManager) -> Self {
        Self { manager }
    }

    /// Create a resource: an instance of an identifiable declaration
    pub fn new_resource(
        &self,
        namespace: &str,
        name: &str,
        identifier: &str,
        options: InstantiateOptions,
    ) -> Result<Instance> {
        self.instantiate(namespace, name, Some(identifier), options)
    }

    /// Create a concept instance; concepts carry no identifier
    pub fn new_concept(
        &self,
        namespace: &str,
        name: &str,
        options: InstantiateOptions,
    ) -> Result<Instance> {
        self.instantiate(namespace, name, None, options)
    }

    /// Create a transaction; a random identifier is synthesized when none is
    /// supplied, and `$timestamp` is stamped unless suppressed
    pub fn new_transaction(
        &self,
        namespace: &str,
        name: &str,
        identifier: Option<&str>,
        options: InstantiateOptions,
    ) -> Result<Instance> {
        self.instantiate(namespace, name, identifier, options)
    }

    /// Create an event; identifier and timestamp behave as for transactions
    pub fn new_event(
        &self,
        namespace: &str,
        name: &str,
        identifier: Option<&str>,
        options: InstantiateOptions,
    ) -> Result<Instance> {
        self.instantiate(namespace, name, identifier, options)
    }

    /// Create a relationship to an identifiable declaration
    pub fn new_relationship(
        &self,
        namespace: &str,
        name: &str,
        identifier: &str,
    ) -> Result<Relationship> {
        let fqn = util::join_fqn(namespace, name);
        let decl = self.manager.get_type(&fqn)?;
        if !decl.is_identifiable() {
            return Err(ConcertoError::ModelViolation(format!(
                "Cannot create a relationship to {} {}",
                decl.kind().keyword(),
                fqn
            )));
        }
        Ok(Relationship::new(fqn, identifier))
    }

    fn instantiate(
        &self,
        namespace: &str,
        name: &str,
        identifier: Option<&str>,
        options: InstantiateOptions,
    ) -> Result<Instance> {
        let fqn = util::join_fqn(namespace, name);
        let mut decl = self.manager.get_type(&fqn)?;
        if decl.is_enum() {
            return Err(ConcertoError::ModelViolation(format!(
                "Cannot instantiate enum {}",
                fqn
            )));
        }
        if decl.is_abstract() {
            if options.generate.is_none() {
                return Err(ConcertoError::ModelViolation(format!(
                    "Cannot instantiate abstract type {}",
                    fqn
                )));
            }
            let concrete = pick_concrete(self.manager, &fqn)?;
            decl = self.manager.get_type(&concrete)?;
        }

        let mut instance = Instance::new(decl.fqn());
        let mut assigned_identifier = None;
        if decl.is_identifiable() {
            let id = match identifier {
                Some(id) => id.to_string(),
                None if decl.kind().has_timestamp() || options.generate.is_some() => {
                    Uuid::new_v4().to_string()
                }
                None => {
                    return Err(ConcertoError::ModelViolation(format!(
                        "Missing identifier for {}",
                        fqn
                    )));
                }
            };
            instance.set_identifier(&id);
            if let Some(field) = decl.identifier_field() {
                if field != SYSTEM_IDENTIFIER {
                    instance.set_property(field, Value::String(id.clone()));
                }
            }
            assigned_identifier = Some(id);
        }
        if decl.kind().has_timestamp() && !options.disable_timestamp {
            instance.set_timestamp(now_to_millis());
        }

        if let Some(mode) = options.generate {
            let mut values: Box<dyn ValueGenerator> = match mode {
                GenerateMode::Empty => Box::new(EmptyValueGenerator::new()),
                GenerateMode::Sample => Box::new(SampleValueGenerator::new()),
            };
            InstanceGenerator::new(self.manager).populate(
                &mut instance,
                values.as_mut(),
                options.include_optional_fields,
            )?;
            // generation must not displace the caller's identifier
            if let Some(id) = &assigned_identifier {
                if let Some(field) = decl.identifier_field() {
                    if field != SYSTEM_IDENTIFIER {
                        instance.set_property(field, Value::String(id.clone()));
                    }
                }
            }
        }
        Ok(instance)
    }
}

/// The current time truncated to millisecond precision, matching the wire
/// format's resolution
pub(crate) fn now_to_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
