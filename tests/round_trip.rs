//! End-to-end serialization scenarios over a realistic trading model:
//! canonical JSON emission, validation failures, and the two round-trip
//! laws (instance -> JSON -> instance, JSON -> instance -> JSON).

use concerto_core::metamodel::{
    DeclarationAst, DeclarationKind, IdentityAst, Model, PropertyAst,
};
use concerto_core::{
    Factory, InstantiateOptions, ModelManager, Serializer, SerializerOptions, Value,
};
use serde_json::json;

/// The sample trading namespace: an asset referencing a participant
fn sample_model() -> Model {
    let mut model = Model::new("org.acme.sample");
    model.declarations = vec![
        DeclarationAst::new(DeclarationKind::Asset, "SampleAsset")
            .with_identity(IdentityAst::Field("assetId".to_string()))
            .with_property(PropertyAst::field("assetId", "String"))
            .with_property(PropertyAst::relationship("owner", "SampleParticipant"))
            .with_property(PropertyAst::field("stringValue", "String"))
            .with_property(PropertyAst::field("doubleValue", "Double")),
        DeclarationAst::new(DeclarationKind::Participant, "SampleParticipant")
            .with_identity(IdentityAst::Field("participantId".to_string()))
            .with_property(PropertyAst::field("participantId", "String"))
            .with_property(PropertyAst::field("firstName", "String"))
            .with_property(PropertyAst::field("lastName", "String")),
        DeclarationAst::new(DeclarationKind::Concept, "Address")
            .with_property(PropertyAst::field("city", "String"))
            .with_property(PropertyAst::field("country", "String"))
            .with_property(PropertyAst::field("elevation", "Double")),
    ];
    model
}

fn manager() -> ModelManager {
    let mut manager = ModelManager::new();
    manager.add_model_file(sample_model()).unwrap();
    manager
}

fn sample_asset(manager: &ModelManager) -> concerto_core::Instance {
    let factory = Factory::new(manager);
    let mut asset = factory
        .new_resource("org.acme.sample", "SampleAsset", "1", InstantiateOptions::default())
        .unwrap();
    asset.set_property(
        "owner",
        Value::Relationship(
            factory
                .new_relationship("org.acme.sample", "SampleParticipant", "alice@email.com")
                .unwrap(),
        ),
    );
    asset.set_property("stringValue", Value::String("the value".to_string()));
    asset.set_property("doubleValue", Value::Double(3.14));
    asset
}

#[test]
fn round_trip_asset_to_canonical_json() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let asset = sample_asset(&manager);

    let output = serializer
        .to_json(&asset, Some(&SerializerOptions::default().validate(true)))
        .unwrap();
    assert_eq!(
        output,
        json!({
            "$class": "org.acme.sample.SampleAsset",
            "$identifier": "1",
            "assetId": "1",
            "owner": "resource:org.acme.sample.SampleParticipant#alice@email.com",
            "stringValue": "the value",
            "doubleValue": 3.14
        })
    );

    // first key of the canonical form is $class
    let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "$class");
}

#[test]
fn missing_required_field_fails_with_instance_label() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let factory = Factory::new(&manager);
    let asset = factory
        .new_resource("org.acme.sample", "SampleAsset", "1", InstantiateOptions::default())
        .unwrap();

    let err = serializer.to_json(&asset, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The instance \"org.acme.sample.SampleAsset#1\" is missing the required field \"owner\"."
    );

    let output = serializer
        .to_json(&asset, Some(&SerializerOptions::default().validate(false)))
        .unwrap();
    assert_eq!(
        output,
        json!({
            "$class": "org.acme.sample.SampleAsset",
            "$identifier": "1",
            "assetId": "1"
        })
    );
}

#[test]
fn non_finite_doubles_fail_validation() {
    let manager = manager();
    let serializer = Serializer::new(&manager);

    for (value, name) in [
        (f64::NAN, "NaN"),
        (f64::INFINITY, "Infinity"),
        (f64::NEG_INFINITY, "-Infinity"),
    ] {
        let mut asset = sample_asset(&manager);
        asset.set_property("doubleValue", Value::Double(value));
        let err = serializer.to_json(&asset, None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SampleAsset#1"), "{}", message);
        assert!(message.contains("doubleValue"), "{}", message);
        assert!(message.contains(&format!("\"{}\"", name)), "{}", message);
    }
}

#[test]
fn concept_serializes_without_identifier() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let factory = Factory::new(&manager);

    let mut address = factory
        .new_concept("org.acme.sample", "Address", InstantiateOptions::default())
        .unwrap();
    address.set_property("city", Value::String("Winchester".to_string()));
    address.set_property("country", Value::String("UK".to_string()));
    address.set_property("elevation", Value::Double(3.14));

    let output = serializer.to_json(&address, None).unwrap();
    assert_eq!(
        output,
        json!({
            "$class": "org.acme.sample.Address",
            "city": "Winchester",
            "country": "UK",
            "elevation": 3.14
        })
    );
    assert!(output.get("$identifier").is_none());
}

#[test]
fn unexpected_property_fails_deserialization() {
    let manager = manager();
    let serializer = Serializer::new(&manager);

    let err = serializer
        .from_json(
            &json!({
                "$class": "org.acme.sample.SampleParticipant",
                "participantId": "alphablock",
                "firstName": "Block",
                "lastName": "Norris",
                "WRONG": "blah"
            }),
            None,
        )
        .unwrap_err();
    assert!(err.to_string().contains("\"WRONG\""), "{}", err);

    // a null value reads as an absent key
    let participant = serializer
        .from_json(
            &json!({
                "$class": "org.acme.sample.SampleParticipant",
                "participantId": "alphablock",
                "firstName": "Block",
                "lastName": "Norris",
                "WRONG": null
            }),
            None,
        )
        .unwrap();
    assert_eq!(participant.identifier(), Some("alphablock"));
}

#[test]
fn instance_round_trip_preserves_every_property() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let asset = sample_asset(&manager);

    let json = serializer.to_json(&asset, None).unwrap();
    let back = serializer.from_json(&json, None).unwrap();
    assert_eq!(back, asset);
}

#[test]
fn generated_sample_instance_round_trips() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let factory = Factory::new(&manager);

    let asset = factory
        .new_resource(
            "org.acme.sample",
            "SampleAsset",
            "generated-1",
            InstantiateOptions::sample(),
        )
        .unwrap();
    let json = serializer.to_json(&asset, None).unwrap();
    let back = serializer.from_json(&json, None).unwrap();
    assert_eq!(back, asset);
}

#[test]
fn json_round_trip_is_idempotent() {
    let manager = manager();
    let serializer = Serializer::new(&manager);

    let wire = json!({
        "$class": "org.acme.sample.SampleAsset",
        "$identifier": "1",
        "assetId": "1",
        "owner": "resource:org.acme.sample.SampleParticipant#alice@email.com",
        "stringValue": "the value",
        "doubleValue": 3.14
    });
    let instance = serializer.from_json(&wire, None).unwrap();
    let again = serializer.to_json(&instance, None).unwrap();
    assert_eq!(again, wire);
}

#[test]
fn empty_string_is_a_valid_string_value() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let mut asset = sample_asset(&manager);
    asset.set_property("stringValue", Value::String(String::new()));

    let json = serializer.to_json(&asset, None).unwrap();
    assert_eq!(json["stringValue"], "");
    let back = serializer.from_json(&json, None).unwrap();
    assert_eq!(back.get_property("stringValue"), Some(&Value::String(String::new())));
}

#[test]
fn deserialization_trusts_the_payload_class() {
    let mut manager = ModelManager::new();
    let mut model = sample_model();
    model.declarations.push(
        DeclarationAst::new(DeclarationKind::Asset, "SpecialAsset")
            .with_super_type("SampleAsset")
            .with_property(PropertyAst::field("grade", "String").optional()),
    );
    manager.add_model_file(model).unwrap();
    let serializer = Serializer::new(&manager);

    let wire = json!({
        "$class": "org.acme.sample.SpecialAsset",
        "$identifier": "9",
        "assetId": "9",
        "owner": "resource:org.acme.sample.SampleParticipant#bob@email.com",
        "stringValue": "s",
        "doubleValue": 1.0,
        "grade": "A"
    });
    let instance = serializer.from_json(&wire, None).unwrap();
    assert_eq!(instance.class_fqn(), "org.acme.sample.SpecialAsset");

    // and serialization re-emits the concrete class
    let again = serializer.to_json(&instance, None).unwrap();
    assert_eq!(again["$class"], "org.acme.sample.SpecialAsset");
}

#[test]
fn missing_class_key_is_rejected() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let err = serializer
        .from_json(&json!({"assetId": "1"}), None)
        .unwrap_err();
    assert!(err.to_string().contains("$class"));
}

#[test]
fn unresolvable_class_is_rejected() {
    let manager = manager();
    let serializer = Serializer::new(&manager);
    let err = serializer
        .from_json(&json!({"$class": "org.acme.sample.Nope"}), None)
        .unwrap_err();
    assert!(matches!(err, concerto_core::ConcertoError::TypeNotFound(_)));
}

#[test]
fn resources_for_relationships_honor_options() {
    let manager = manager();
    let factory = Factory::new(&manager);
    let serializer = Serializer::new(&manager);

    let mut owner = factory
        .new_resource(
            "org.acme.sample",
            "SampleParticipant",
            "alice@email.com",
            InstantiateOptions::default(),
        )
        .unwrap();
    owner.set_property("firstName", Value::String("Alice".to_string()));
    owner.set_property("lastName", Value::String("A".to_string()));

    let mut asset = sample_asset(&manager);
    asset.set_property("owner", Value::Resource(Box::new(owner)));

    // a resource in a relationship slot is rejected by default
    assert!(serializer.to_json(&asset, None).is_err());

    // convertResourcesToRelationships collapses it to a URI
    let json = serializer
        .to_json(
            &asset,
            Some(&SerializerOptions::default().convert_resources_to_relationships(true)),
        )
        .unwrap();
    assert_eq!(
        json["owner"],
        "resource:org.acme.sample.SampleParticipant#alice@email.com"
    );

    // permitResourcesForRelationships embeds the full resource both ways
    let options = SerializerOptions::default().permit_resources_for_relationships(true);
    let json = serializer.to_json(&asset, Some(&options)).unwrap();
    assert_eq!(
        json["owner"]["$class"],
        "org.acme.sample.SampleParticipant"
    );
    let back = serializer.from_json(&json, Some(&options)).unwrap();
    assert_eq!(back, asset);
}

#[test]
fn utc_offset_applies_to_timestamps() {
    let mut manager = ModelManager::new();
    let mut model = sample_model();
    model.declarations.push(
        DeclarationAst::new(DeclarationKind::Transaction, "Trade")
            .with_property(PropertyAst::field("note", "String").optional()),
    );
    manager.add_model_file(model).unwrap();
    let factory = Factory::new(&manager);
    let serializer = Serializer::new(&manager);

    let mut trade = factory
        .new_transaction(
            "org.acme.sample",
            "Trade",
            Some("t-1"),
            InstantiateOptions::default(),
        )
        .unwrap();
    trade.set_timestamp(
        chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00.000Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    );

    let json = serializer
        .to_json(&trade, Some(&SerializerOptions::default().utc_offset(120)))
        .unwrap();
    assert_eq!(json["$timestamp"], "2024-05-01T14:00:00.000+02:00");

    // parsing converts back to the same instant
    let back = serializer.from_json(&json, None).unwrap();
    assert_eq!(back.timestamp(), trade.timestamp());
}
