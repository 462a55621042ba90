//! Built-in root model
//!
//! Every manager bootstraps a synthetic `concerto` namespace so user schemas
//! can extend the five root types without a file on disk. The identifiable
//! roots are system-identified through a `$identifier` field; transactions
//! and events additionally carry `$timestamp`.

use super::{DeclarationAst, DeclarationKind, IdentityAst, Model, PropertyAst};
use once_cell::sync::Lazy;

/// The reserved namespace hosting the root types
pub const ROOT_NAMESPACE: &str = "concerto";

/// The system identifier field name
pub const SYSTEM_IDENTIFIER: &str = "$identifier";

/// The system timestamp field name
pub const SYSTEM_TIMESTAMP: &str = "$timestamp";

static ROOT_MODEL: Lazy<Model> = Lazy::new(|| {
    let identified = |kind: DeclarationKind, name: &str| {
        DeclarationAst::new(kind, name)
            .abstracted()
            .with_identity(IdentityAst::System)
            .with_property(PropertyAst::field(SYSTEM_IDENTIFIER, "String"))
    };
    let stamped = |kind: DeclarationKind, name: &str| {
        identified(kind, name).with_property(PropertyAst::field(SYSTEM_TIMESTAMP, "DateTime"))
    };

    let mut model = Model::new(ROOT_NAMESPACE);
    model.declarations = vec![
        DeclarationAst::new(DeclarationKind::Concept, "Concept").abstracted(),
        identified(DeclarationKind::Asset, "Asset"),
        identified(DeclarationKind::Participant, "Participant"),
        stamped(DeclarationKind::Transaction, "Transaction"),
        stamped(DeclarationKind::Event, "Event"),
    ];
    model
});

/// The AST of the built-in root model
pub fn root_model() -> Model {
    ROOT_MODEL.clone()
}

/// The short names the root model exports
pub fn root_type_names() -> [&'static str; 5] {
    ["Concept", "Asset", "Participant", "Transaction", "Event"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_model_shape() {
        let model = root_model();
        assert_eq!(model.namespace, ROOT_NAMESPACE);
        assert_eq!(model.declarations.len(), 5);
        assert!(model.declarations.iter().all(|d| d.is_abstract));
    }

    #[test]
    fn test_identified_roots_carry_identifier_field() {
        let model = root_model();
        for name in ["Asset", "Participant", "Transaction", "Event"] {
            let decl = model
                .declarations
                .iter()
                .find(|d| d.name == name)
                .expect("root declaration present");
            assert_eq!(decl.identity, Some(IdentityAst::System));
            assert!(decl
                .properties
                .iter()
                .any(|p| p.name == SYSTEM_IDENTIFIER));
        }
    }

    #[test]
    fn test_timestamp_only_on_transaction_and_event() {
        let model = root_model();
        for decl in &model.declarations {
            let has_ts = decl.properties.iter().any(|p| p.name == SYSTEM_TIMESTAMP);
            assert_eq!(has_ts, decl.kind.has_timestamp(), "{}", decl.name);
        }
    }

    #[test]
    fn test_concept_has_no_identity() {
        let model = root_model();
        let concept = model
            .declarations
            .iter()
            .find(|d| d.name == "Concept")
            .unwrap();
        assert!(concept.identity.is_none());
        assert!(concept.properties.is_empty());
    }
}
