//! Tests for mapping tool blocks to hub element definitions.

use crate::helpers::hub_assertions::*;
use crate::helpers::tool_fixtures::*;
use syster_hub::hub::{
    ElementDefinition, HubSession, Iid, InterfaceEndKind, MemoryHub, ParameterType,
    ParameterTypeKind,
};
use syster_hub::mapping::{
    BlockToElementRule, DstRow, MappedRowStatus, MappingConfig, MappingDirection, MappingEngine,
};
use syster_hub::tool::{Element, ElementId, ElementKind, Project, ValueSpecification};

fn map_blocks(engine: &mut MappingEngine, hub: &mut MemoryHub, project: &mut Project, blocks: &[&str]) {
    let rows: Vec<DstRow> = blocks.iter().map(|b| DstRow::new(*b)).collect();
    let output = engine.transform(&BlockToElementRule, hub, project, rows);
    engine.commit(hub, &output).expect("commit should succeed");
}

fn parameter_type_name(hub: &MemoryHub, parameter_type: Iid) -> String {
    hub.rdl_chain()
        .by_iid::<ParameterType>(parameter_type)
        .map(|t| t.name.clone())
        .unwrap_or_default()
}

fn parameter_of(hub: &MemoryHub, definition: &ElementDefinition, name: &str) -> Iid {
    definition
        .parameters
        .iter()
        .find(|p| parameter_type_name(hub, p.parameter_type) == name)
        .map(|p| p.iid)
        .unwrap_or_else(|| panic!("no parameter '{name}' on '{}'", definition.name))
}

// =============================================================================
// COMPOSITE STRUCTURE
// =============================================================================

fn block_a_with_part_b() -> Project {
    let mut project = model_project();
    add_package(&mut project, "pkg", "Structure", MODEL);
    add_block(&mut project, "a", "Block_A", "pkg");
    add_block(&mut project, "b", "Block_B", "pkg");
    add_value_property(&mut project, "mass", "Mass", "a", ValueSpecification::LiteralInteger(10));
    add_part_property(&mut project, "part_b", "partB", "a", "b");
    project
}

#[test]
fn test_block_with_value_and_part_property() {
    let mut project = block_a_with_part_b();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    let output = engine.transform(&BlockToElementRule, &mut hub, &mut project, vec![DstRow::new("a")]);
    engine.commit(&mut hub, &output).unwrap();

    assert_eq!(output.rows.len(), 2);
    assert!(output.rows.iter().all(|r| r.status == MappedRowStatus::New));
    assert!(output.row(&ElementId::new("a"), MappingDirection::FromDstToHub).is_some());
    assert_eq!(thing_counts(&hub).element_definitions, 2);

    let block_a = definition_named(&hub, "Block_A");
    let block_b = definition_named(&hub, "Block_B");
    assert!(block_b.parameters.is_empty());
    assert_eq!(block_a.parameters.len(), 1);

    let parameter = &block_a.parameters[0];
    let chain = hub.rdl_chain();
    let parameter_type = chain.by_iid::<ParameterType>(parameter.parameter_type).unwrap();
    assert_eq!(parameter_type.name, "Mass");
    assert!(matches!(parameter_type.kind, ParameterTypeKind::QuantityKind { .. }));
    assert_eq!(
        parameter.primary_value_set().and_then(|v| v.manual_value()),
        Some("10")
    );

    assert_eq!(block_a.contained_elements.len(), 1);
    assert_eq!(block_a.contained_elements[0].name, "partB");
    assert_eq!(block_a.contained_elements[0].element_definition, block_b.iid);
}

#[test]
fn test_second_pass_creates_nothing() {
    let mut project = block_a_with_part_b();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["a", "b"]);
    let first = thing_counts(&hub);
    map_blocks(&mut engine, &mut hub, &mut project, &["a", "b"]);

    assert_eq!(thing_counts(&hub), first);
    assert_eq!(engine.identifiers().len(), 2);
}

#[test]
fn test_changed_value_updates_existing_parameter() {
    let mut project = block_a_with_part_b();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_blocks(&mut engine, &mut hub, &mut project, &["a"]);

    project.get_mut(&ElementId::new("mass")).unwrap().default_value =
        Some(ValueSpecification::LiteralInteger(12));
    map_blocks(&mut engine, &mut hub, &mut project, &["a"]);

    let block_a = definition_named(&hub, "Block_A");
    assert_eq!(block_a.parameters.len(), 1);
    assert_eq!(
        block_a.parameters[0]
            .primary_value_set()
            .and_then(|v| v.manual_value()),
        Some("12")
    );
}

#[test]
fn test_blank_string_value_written_as_no_value() {
    let mut project = model_project();
    add_block(&mut project, "a", "Block_A", MODEL);
    add_value_property(&mut project, "note", "note", "a", ValueSpecification::string(""));
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["a"]);

    let block_a = definition_named(&hub, "Block_A");
    assert_eq!(block_a.parameters.len(), 1);
    assert_eq!(
        block_a.parameters[0]
            .primary_value_set()
            .and_then(|v| v.manual_value()),
        Some("-")
    );
}

#[test]
fn test_recursive_part_is_not_descended_twice() {
    let mut project = model_project();
    add_block(&mut project, "a", "Loop_A", MODEL);
    add_block(&mut project, "b", "Loop_B", MODEL);
    add_part_property(&mut project, "a_b", "b", "a", "b");
    add_part_property(&mut project, "b_a", "a", "b", "a");
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["a"]);

    assert_eq!(thing_counts(&hub).element_definitions, 2);
    assert_eq!(definition_named(&hub, "Loop_A").contained_elements.len(), 1);
    assert!(definition_named(&hub, "Loop_B").contained_elements.is_empty());
}

#[test]
fn test_missing_row_is_skipped() {
    let mut project = block_a_with_part_b();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    let output = engine.transform(
        &BlockToElementRule,
        &mut hub,
        &mut project,
        vec![DstRow::new("missing"), DstRow::new("pkg"), DstRow::new("b")],
    );

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].hub.name(), "Block_B");
}

#[test]
fn test_abstract_flag_follows_block() {
    let mut project = model_project();
    project.add_element(
        Element::new("e", ElementKind::Block)
            .with_name("Engine")
            .with_abstract(true)
            .with_owner(MODEL),
    );
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["e"]);
    let engine_definition = definition_named(&hub, "Engine");
    assert_eq!(
        category_names(&hub, &engine_definition.categories),
        vec!["isAbstract".to_string()]
    );

    project.get_mut(&ElementId::new("e")).unwrap().is_abstract = false;
    map_blocks(&mut engine, &mut hub, &mut project, &["e"]);
    assert!(definition_named(&hub, "Engine").categories.is_empty());
}

// =============================================================================
// PORTS
// =============================================================================

fn pump_and_tank() -> Project {
    let mut project = model_project();
    add_interface(&mut project, "fuel", "Fuel");
    add_block(&mut project, "pump", "Pump", MODEL);
    add_block(&mut project, "tank", "Tank", MODEL);
    add_port(
        &mut project,
        Element::new("pump_out", ElementKind::Port).with_provided("fuel"),
        "pump",
    );
    add_port(
        &mut project,
        Element::new("tank_in", ElementKind::Port)
            .with_name("in")
            .with_required("fuel"),
        "tank",
    );
    add_realization(&mut project, "pump_fuel", "pump", "fuel");
    project
}

#[test]
fn test_ports_become_usages_of_port_definition() {
    let mut project = pump_and_tank();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["tank", "pump"]);

    let port_definition = definition_named(&hub, "Port");
    let pump = definition_named(&hub, "Pump");
    let tank = definition_named(&hub, "Tank");

    let pump_port = &pump.contained_elements[0];
    assert_eq!(pump_port.name, "Pump_port1");
    assert_eq!(pump_port.element_definition, port_definition.iid);
    assert_eq!(pump_port.interface_end, InterfaceEndKind::Output);

    let tank_port = &tank.contained_elements[0];
    assert_eq!(tank_port.name, "in");
    assert_eq!(tank_port.interface_end, InterfaceEndKind::Input);

    let relationships = relationships(&hub);
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].name, "Fuel");
    assert_eq!(relationships[0].source, tank_port.iid);
    assert_eq!(relationships[0].target, pump_port.iid);
}

#[test]
fn test_unnamed_port_keeps_its_usage_on_rerun() {
    let mut project = pump_and_tank();
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["tank", "pump"]);
    let first = thing_counts(&hub);
    let port = definition_named(&hub, "Pump").contained_elements[0].iid;

    map_blocks(&mut engine, &mut hub, &mut project, &["tank", "pump"]);

    assert_eq!(thing_counts(&hub), first);
    let pump = definition_named(&hub, "Pump");
    assert_eq!(pump.contained_elements.len(), 1);
    assert_eq!(pump.contained_elements[0].iid, port);
    assert_eq!(pump.contained_elements[0].name, "Pump_port1");
}

#[test]
fn test_self_realization_is_ignored() {
    let mut project = model_project();
    add_interface(&mut project, "iface", "Signal");
    add_block(&mut project, "box", "Box", MODEL);
    add_port(
        &mut project,
        Element::new("box_in", ElementKind::Port)
            .with_name("in")
            .with_required("iface"),
        "box",
    );
    add_realization(&mut project, "box_iface", "box", "iface");
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["box"]);

    assert!(relationships(&hub).is_empty());
}

// =============================================================================
// CONNECTORS
// =============================================================================

#[test]
fn test_binding_connector_yields_one_relationship() {
    let mut project = model_project();
    add_block(&mut project, "circuit", "Circuit", MODEL);
    add_value_property(&mut project, "v1", "Input", "circuit", ValueSpecification::LiteralReal(1.5));
    add_value_property(&mut project, "v2", "Output", "circuit", ValueSpecification::LiteralReal(2.5));
    add_connector(&mut project, "bind", "circuit", ["v1", "v2"]);
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["circuit"]);

    let circuit = definition_named(&hub, "Circuit");
    let relationships = relationships(&hub);
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].source, parameter_of(&hub, circuit, "Input"));
    assert_eq!(relationships[0].target, parameter_of(&hub, circuit, "Output"));
}

#[test]
fn test_connector_property_relates_part_usages() {
    let mut project = model_project();
    add_block(&mut project, "system", "System", MODEL);
    add_block(&mut project, "engine", "Engine", MODEL);
    add_block(&mut project, "wheel", "Wheel", MODEL);
    add_part_property(&mut project, "p_engine", "engine", "system", "engine");
    add_part_property(&mut project, "p_wheel", "wheel", "system", "wheel");
    add_connector(&mut project, "drive", "system", ["p_engine", "p_wheel"]);
    project.add_element(
        Element::new("link", ElementKind::Property)
            .with_name("driveLink")
            .with_stereotype("ConnectorProperty")
            .with_default_value(ValueSpecification::ElementValue(ElementId::new("drive")))
            .with_owner("system"),
    );
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_blocks(&mut engine, &mut hub, &mut project, &["system"]);

    let system = definition_named(&hub, "System");
    let usage = |name: &str| {
        system
            .contained_elements
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.iid)
            .unwrap()
    };
    let relationships = relationships(&hub);
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].name, "driveLink");
    assert_eq!(relationships[0].source, usage("engine"));
    assert_eq!(relationships[0].target, usage("wheel"));
}
