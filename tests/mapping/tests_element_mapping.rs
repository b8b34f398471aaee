//! Tests for mapping hub element definitions back to tool blocks.

use crate::helpers::hub_assertions::*;
use crate::helpers::tool_fixtures::*;
use syster_hub::hub::{
    BinaryRelationship, ElementDefinition, ElementUsage, HubSession, InterfaceEndKind, MemoryHub,
};
use syster_hub::mapping::{
    BlockToElementRule, DstRow, ElementToBlockRule, HubRow, MappedRowStatus, MappingConfig,
    MappingEngine,
};
use syster_hub::tool::stereotypes::UNIT_TAG;
use syster_hub::tool::{Element, ElementId, ElementKind, Project, ValueSpecification};

fn block_named<'p>(project: &'p Project, name: &'p str) -> &'p Element {
    project
        .find_by_name(ElementKind::Block, name)
        .next()
        .unwrap_or_else(|| panic!("no block named '{name}'"))
}

fn owned_named(project: &Project, owner: &ElementId, kind: ElementKind, name: &str) -> Element {
    owned_of_kind(project, owner, kind)
        .into_iter()
        .find(|e| e.name_or_empty() == name)
        .unwrap_or_else(|| panic!("no {kind:?} named '{name}'"))
}

/// Map the tool blocks to the hub, commit, and hand back the hub.
fn hub_from_tool(project: &mut Project, blocks: &[&str]) -> MemoryHub {
    let mut hub = MemoryHub::new();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows: Vec<DstRow> = blocks.iter().map(|b| DstRow::new(*b)).collect();
    let output = engine.transform(&BlockToElementRule, &mut hub, project, rows);
    engine.commit(&mut hub, &output).unwrap();
    hub
}

fn definition_rows(hub: &MemoryHub, names: &[&str]) -> Vec<HubRow> {
    names
        .iter()
        .map(|n| HubRow::new(definition_named(hub, n).iid))
        .collect()
}

#[test]
fn test_real_value_survives_round_trip() {
    let mut source = model_project();
    add_value_type(&mut source, "speed_type", "speed", "m/s");
    add_block(&mut source, "car", "Car", MODEL);
    source.add_element(
        Element::new("speed", ElementKind::Property)
            .with_name("Speed")
            .with_type("speed_type")
            .with_default_value(ValueSpecification::LiteralReal(53.0))
            .with_owner("car"),
    );
    let mut hub = hub_from_tool(&mut source, &["car"]);
    let parameter = &definition_named(&hub, "Car").parameters[0];
    assert_eq!(
        parameter.primary_value_set().and_then(|v| v.manual_value()),
        Some("53.0")
    );

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = definition_rows(&hub, &["Car"]);
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut target, rows);
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].status, MappedRowStatus::New);

    let car = block_named(&target, "Car").id.clone();
    let speed = owned_named(&target, &car, ElementKind::Property, "Speed");
    assert_eq!(speed.default_value, Some(ValueSpecification::LiteralReal(53.0)));
    assert!(speed.has_stereotype_named("ValueProperty"));

    let value_type = target.get(speed.type_ref.as_ref().unwrap()).unwrap();
    assert_eq!(value_type.name_or_empty(), "Speed[m/s]");
    assert_eq!(
        value_type.properties.get(UNIT_TAG).and_then(|u| u.as_str()),
        Some("m/s")
    );

    let output = engine.transform(
        &BlockToElementRule,
        &mut hub,
        &mut target,
        vec![DstRow::new(car.clone())],
    );
    let remapped = output
        .element_definitions
        .iter()
        .find(|d| d.name == "Car")
        .unwrap();
    assert_eq!(
        remapped.parameters[0]
            .primary_value_set()
            .and_then(|v| v.manual_value()),
        Some("53.0")
    );
}

#[test]
fn test_nested_usages_become_part_properties() {
    let mut source = model_project();
    add_block(&mut source, "a", "Block_A", MODEL);
    add_block(&mut source, "b", "Block_B", MODEL);
    add_part_property(&mut source, "a_b", "partB", "a", "b");
    let mut hub = hub_from_tool(&mut source, &["a"]);

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = definition_rows(&hub, &["Block_A"]);
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut target, rows);

    assert_eq!(output.rows.len(), 2);
    let block_a = block_named(&target, "Block_A").id.clone();
    let block_b = block_named(&target, "Block_B").id.clone();
    let part = owned_named(&target, &block_a, ElementKind::Property, "partB");
    assert_eq!(part.type_ref, Some(block_b));
    assert!(part.has_stereotype_named("PartProperty"));
}

#[test]
fn test_existing_block_is_reused() {
    let mut source = model_project();
    add_block(&mut source, "a", "Block_A", MODEL);
    let mut hub = hub_from_tool(&mut source, &["a"]);

    let mut engine = MappingEngine::new(MappingConfig::default());
    let before = source.element_count();
    let rows = definition_rows(&hub, &["Block_A"]);
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut source, rows);

    assert_eq!(output.rows[0].status, MappedRowStatus::Existing);
    assert_eq!(output.rows[0].dst, ElementId::new("a"));
    assert_eq!(source.element_count(), before);
}

#[test]
fn test_hub_no_value_clears_tool_default() {
    let mut source = model_project();
    add_block(&mut source, "a", "Block_A", MODEL);
    add_value_property(&mut source, "mass", "Mass", "a", ValueSpecification::LiteralInteger(10));
    let mut hub = hub_from_tool(&mut source, &["a"]);

    let definition = hub
        .iteration_mut()
        .unwrap()
        .element_definitions
        .values_mut()
        .find(|d| d.name == "Block_A")
        .unwrap();
    definition.parameters[0].set_manual_value("-");

    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = definition_rows(&hub, &["Block_A"]);
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut source, rows);
    assert_eq!(output.rows[0].dst, ElementId::new("a"));

    let mass = owned_named(&source, &ElementId::new("a"), ElementKind::Property, "Mass");
    assert_eq!(mass.id, ElementId::new("mass"));
    assert_eq!(mass.default_value, None);
}

#[test]
fn test_abstract_category_sets_block_flag() {
    let mut source = model_project();
    source.add_element(
        Element::new("e", ElementKind::Block)
            .with_name("Engine")
            .with_abstract(true)
            .with_owner(MODEL),
    );
    let mut hub = hub_from_tool(&mut source, &["e"]);

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = definition_rows(&hub, &["Engine"]);
    engine.transform(&ElementToBlockRule, &mut hub, &mut target, rows);

    assert!(block_named(&target, "Engine").is_abstract);
}

#[test]
fn test_port_relationship_becomes_interface_realization() {
    let mut hub = MemoryHub::new();
    let domain = hub.current_domain().unwrap().iid;
    let port_definition = ElementDefinition::new("Port", "Port", domain);
    let mut pump = ElementDefinition::new("Pump", "Pump", domain);
    let mut tank = ElementDefinition::new("Tank", "Tank", domain);
    let mut out = ElementUsage::new("out", "out", port_definition.iid, pump.iid);
    out.interface_end = InterfaceEndKind::Output;
    let mut inlet = ElementUsage::new("in", "in", port_definition.iid, tank.iid);
    inlet.interface_end = InterfaceEndKind::Input;
    let relationship = BinaryRelationship::new("Fuel", out.iid, inlet.iid, domain);
    pump.contained_elements.push(out);
    tank.contained_elements.push(inlet);

    let iteration = hub.iteration_mut().unwrap();
    for definition in [port_definition, pump.clone(), tank.clone()] {
        iteration.element_definitions.insert(definition.iid, definition);
    }
    iteration.relationships.insert(relationship.iid, relationship);

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = vec![HubRow::new(pump.iid), HubRow::new(tank.iid)];
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut target, rows);

    let pump_block = block_named(&target, "Pump").id.clone();
    let tank_block = block_named(&target, "Tank").id.clone();
    let out_port = owned_named(&target, &pump_block, ElementKind::Port, "out");
    let in_port = owned_named(&target, &tank_block, ElementKind::Port, "in");
    let fuel = target
        .find_by_name(ElementKind::Interface, "Fuel")
        .next()
        .unwrap()
        .id
        .clone();

    assert_eq!(in_port.required_interfaces, vec![fuel.clone()]);
    assert_eq!(out_port.provided_interfaces, vec![fuel.clone()]);
    let realizations: Vec<_> = target
        .relationships_from(&pump_block)
        .filter(|r| r.kind == ElementKind::InterfaceRealization)
        .collect();
    assert_eq!(realizations.len(), 1);
    assert_eq!(realizations[0].target(), Some(&fuel));
    assert_eq!(output.dst_relationships.len(), 1);
}
