//! Cross-file resolution and registry lifecycle: imports, inheritance
//! queries, atomic batches, and the manager invariants.

use concerto_core::metamodel::{
    DeclarationAst, DeclarationKind, IdentityAst, Import, Model, PropertyAst,
};
use concerto_core::ModelManager;

fn vehicles_model() -> Model {
    let mut model = Model::new("org.acme.vehicles");
    model.declarations = vec![
        DeclarationAst::new(DeclarationKind::Asset, "Vehicle")
            .with_identity(IdentityAst::Field("vin".to_string()))
            .with_property(PropertyAst::field("vin", "String"))
            .with_property(PropertyAst::field("mileage", "Double")),
        DeclarationAst::new(DeclarationKind::Asset, "Car")
            .with_super_type("Vehicle")
            .with_property(PropertyAst::field("doors", "Integer")),
        DeclarationAst::new(DeclarationKind::Asset, "Truck")
            .with_super_type("Vehicle")
            .with_property(PropertyAst::field("payload", "Double")),
    ];
    model
}

fn fleet_model() -> Model {
    let mut model = Model::new("org.acme.fleet");
    model
        .imports
        .push(Import::types("org.acme.vehicles", vec!["Vehicle".to_string()]));
    model.declarations = vec![
        DeclarationAst::new(DeclarationKind::Concept, "Depot")
            .with_property(PropertyAst::field("name", "String"))
            .with_property(PropertyAst::field("flagship", "Vehicle")),
        DeclarationAst::new(DeclarationKind::Concept, "Fleet")
            .with_property(PropertyAst::field("depot", "Depot")),
    ];
    model
}

#[test]
fn manager_lookup_matches_local_lookup_for_every_type() {
    let mut manager = ModelManager::new();
    manager
        .add_model_files(vec![vehicles_model(), fleet_model()])
        .unwrap();

    for file in manager.get_model_files() {
        for decl in file.get_declarations() {
            let fqn = format!("{}.{}", file.namespace(), decl.name());
            let via_manager = manager.get_type(&fqn).unwrap();
            assert_eq!(via_manager, file.get_local_type(decl.name()).unwrap());
        }
    }
}

#[test]
fn derives_from_reflects_the_ancestor_chain() {
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();

    let car = "org.acme.vehicles.Car";
    let vehicle = "org.acme.vehicles.Vehicle";
    let truck = "org.acme.vehicles.Truck";

    assert!(manager.derives_from(car, car).unwrap());
    assert!(manager.derives_from(car, vehicle).unwrap());
    assert!(manager.derives_from(car, "concerto.Asset").unwrap());
    assert!(!manager.derives_from(car, truck).unwrap());
    assert!(!manager.derives_from(vehicle, car).unwrap());
}

#[test]
fn inherited_properties_come_before_own() {
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();

    let car = manager.get_type("org.acme.vehicles.Car").unwrap();
    let names: Vec<&str> = car
        .get_properties(&manager)
        .unwrap()
        .iter()
        .filter(|p| !p.is_system())
        .map(|p| p.name())
        .collect();
    assert_eq!(names, vec!["vin", "mileage", "doors"]);

    // the identifier is inherited from Vehicle's identified-by clause
    assert_eq!(car.identifier_field(), Some("vin"));
}

#[test]
fn nested_property_descends_through_object_fields() {
    let mut manager = ModelManager::new();
    manager
        .add_model_files(vec![vehicles_model(), fleet_model()])
        .unwrap();

    let fleet = manager.get_type("org.acme.fleet.Fleet").unwrap();
    let name = fleet.get_nested_property("depot.name", &manager).unwrap();
    assert_eq!(name.name(), "name");

    let mileage = fleet
        .get_nested_property("depot.flagship.mileage", &manager)
        .unwrap();
    assert_eq!(mileage.resolved_type(), Some("Double"));

    // descending through a primitive fails
    let err = fleet
        .get_nested_property("depot.name.length", &manager)
        .unwrap_err();
    assert!(err.to_string().contains("primitive"));

    let err = fleet
        .get_nested_property("depot.missing", &manager)
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn assignable_declarations_use_stable_order() {
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();

    let vehicle = manager.get_type("org.acme.vehicles.Vehicle").unwrap();
    let names: Vec<String> = vehicle
        .get_assignable_class_declarations(&manager)
        .unwrap()
        .iter()
        .map(|d| d.fqn())
        .collect();
    assert_eq!(
        names,
        vec![
            "org.acme.vehicles.Vehicle",
            "org.acme.vehicles.Car",
            "org.acme.vehicles.Truck"
        ]
    );
}

#[test]
fn add_then_delete_restores_the_namespace_set() {
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();
    let before: Vec<String> = manager
        .get_namespaces()
        .iter()
        .map(|s| s.to_string())
        .collect();

    manager.add_model_file(fleet_model()).unwrap();
    manager.delete_model_file("org.acme.fleet").unwrap();

    let after: Vec<String> = manager
        .get_namespaces()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(after, before);
}

#[test]
fn failed_batch_leaves_the_namespace_set_untouched() {
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();
    let before: Vec<String> = manager
        .get_namespaces()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut broken = Model::new("org.acme.broken");
    broken.declarations.push(
        DeclarationAst::new(DeclarationKind::Concept, "Bad")
            .with_property(PropertyAst::field("ref", "Nowhere")),
    );
    // the second file fails resolution; the first must not survive
    let result = manager.add_model_files(vec![fleet_model(), broken]);
    assert!(result.is_err());

    let after: Vec<String> = manager
        .get_namespaces()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(after, before);
    assert!(manager.get_model_file("org.acme.fleet").is_none());
}

#[test]
fn resolve_type_walks_the_import_table() {
    let mut manager = ModelManager::new();
    manager
        .add_model_files(vec![vehicles_model(), fleet_model()])
        .unwrap();

    assert_eq!(
        manager.resolve_type("org.acme.fleet", "Vehicle").unwrap(),
        "org.acme.vehicles.Vehicle"
    );
    assert_eq!(
        manager.resolve_type("org.acme.fleet", "Depot").unwrap(),
        "org.acme.fleet.Depot"
    );
    assert_eq!(
        manager.resolve_type("org.acme.fleet", "String").unwrap(),
        "String"
    );
    assert_eq!(
        manager.resolve_type("org.acme.fleet", "Asset").unwrap(),
        "concerto.Asset"
    );
    assert!(manager.resolve_type("org.acme.fleet", "Car").is_err());
}

#[test]
fn union_ast_round_trips_through_a_fresh_manager() {
    let mut manager = ModelManager::new();
    manager
        .add_model_files(vec![vehicles_model(), fleet_model()])
        .unwrap();

    let ast = manager.get_ast(false).unwrap();
    assert_eq!(ast.models.len(), 2);

    let mut rebuilt = ModelManager::new();
    rebuilt.from_ast(ast).unwrap();
    assert_eq!(rebuilt.get_namespaces(), manager.get_namespaces());
    assert!(rebuilt.get_type("org.acme.fleet.Depot").is_ok());

    // the resolved AST names every reference canonically
    let resolved = manager.get_ast(true).unwrap();
    let fleet = resolved
        .models
        .iter()
        .find(|m| m.namespace == "org.acme.fleet")
        .unwrap();
    let depot = fleet
        .declarations
        .iter()
        .find(|d| d.name == "Depot")
        .unwrap();
    let flagship = depot
        .properties
        .iter()
        .find(|p| p.name == "flagship")
        .unwrap();
    match &flagship.kind {
        concerto_core::metamodel::PropertyKindAst::Field { type_name } => {
            assert_eq!(type_name, "org.acme.vehicles.Vehicle");
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn dependency_order_matters_for_single_adds_but_not_batches() {
    // adding the dependent file alone fails its import check
    let mut manager = ModelManager::new();
    assert!(manager.add_model_file(fleet_model()).is_err());

    // in dependency order both adds validate
    let mut manager = ModelManager::new();
    manager.add_model_file(vehicles_model()).unwrap();
    manager.add_model_file(fleet_model()).unwrap();

    // a batch validates against the post-batch snapshot either way round
    let mut manager = ModelManager::new();
    manager
        .add_model_files(vec![fleet_model(), vehicles_model()])
        .unwrap();
    assert!(manager.get_type("org.acme.fleet.Fleet").is_ok());
}
