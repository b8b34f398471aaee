//! Tests for state-dependent values.

use crate::helpers::hub_assertions::*;
use crate::helpers::tool_fixtures::*;
use rstest::rstest;
use syster_hub::hub::{Iid, MemoryHub};
use syster_hub::mapping::{
    BlockToElementRule, DstRow, ElementToBlockRule, HubRow, MappingConfig, MappingEngine,
};
use syster_hub::tool::{ElementId, ElementKind, Project, ValueSpecification};

/// A pump whose flow depends on a three-region and a two-region state.
fn state_project() -> Project {
    let mut project = model_project();
    add_block(&mut project, "pump", "Pump", MODEL);
    add_value_property(
        &mut project,
        "flow",
        "flow",
        "pump",
        ValueSpecification::LiteralInteger(4),
    );
    add_state(&mut project, "mode", "Mode", &["off", "idle", "run"]);
    add_state(&mut project, "power", "Power", &["low", "high"]);
    add_directed(&mut project, "flow_mode", ElementKind::Dependency, "flow", "mode", None);
    add_directed(&mut project, "flow_power", ElementKind::Dependency, "flow", "power", None);
    project
}

fn map_pump(engine: &mut MappingEngine, hub: &mut MemoryHub, project: &mut Project) {
    let output = engine.transform(&BlockToElementRule, hub, project, vec![DstRow::new("pump")]);
    engine.commit(hub, &output).unwrap();
}

fn actual_state_iids(hub: &MemoryHub) -> Vec<Iid> {
    iteration(hub)
        .actual_finite_state_lists
        .values()
        .flat_map(|l| l.actual_states.iter().map(|s| s.iid))
        .collect()
}

#[test]
fn test_state_dependence_expands_into_actual_states() {
    let mut hub = MemoryHub::new();
    let mut project = state_project();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_pump(&mut engine, &mut hub, &mut project);

    let counts = thing_counts(&hub);
    assert_eq!(counts.possible_lists, 2);
    assert_eq!(counts.actual_lists, 1);

    let actual = iteration(&hub).actual_finite_state_lists.values().next().unwrap();
    assert_eq!(actual.actual_states.len(), 6);
    let mut combinations: Vec<_> = actual
        .actual_states
        .iter()
        .map(|s| s.possible_states.clone())
        .collect();
    combinations.dedup();
    assert_eq!(combinations.len(), 6);

    let parameter = &definition_named(&hub, "Pump").parameters[0];
    assert_eq!(parameter.state_dependence, Some(actual.iid));
    assert_eq!(parameter.value_sets.len(), 6);
    for value_set in &parameter.value_sets {
        assert!(value_set.actual_state.is_some());
        assert_eq!(value_set.manual_value(), Some("4"));
    }
}

#[rstest]
#[case::single_region(&["on"], 1)]
#[case::no_regions(&[], 1)]
#[case::two_regions(&["open", "closed"], 2)]
fn test_possible_states_follow_regions(#[case] regions: &[&str], #[case] expected: usize) {
    let mut hub = MemoryHub::new();
    let mut project = model_project();
    add_block(&mut project, "valve", "Valve", MODEL);
    add_value_property(&mut project, "lift", "lift", "valve", ValueSpecification::LiteralInteger(1));
    add_state(&mut project, "pos", "Position", regions);
    add_directed(&mut project, "lift_pos", ElementKind::Dependency, "lift", "pos", None);
    let mut engine = MappingEngine::new(MappingConfig::default());

    let output = engine.transform(&BlockToElementRule, &mut hub, &mut project, vec![DstRow::new("valve")]);

    assert_eq!(output.possible_finite_state_lists.len(), 1);
    let list = &output.possible_finite_state_lists[0];
    assert_eq!(list.name, "Position");
    assert_eq!(list.possible_states.len(), expected);
    assert_eq!(output.actual_finite_state_lists[0].actual_states.len(), expected);
}

#[test]
fn test_second_pass_keeps_actual_states() {
    let mut hub = MemoryHub::new();
    let mut project = state_project();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_pump(&mut engine, &mut hub, &mut project);
    let before = thing_counts(&hub);
    let iids = actual_state_iids(&hub);

    map_pump(&mut engine, &mut hub, &mut project);

    assert_eq!(thing_counts(&hub), before);
    assert_eq!(actual_state_iids(&hub), iids);
    assert_eq!(definition_named(&hub, "Pump").parameters[0].value_sets.len(), 6);
}

#[test]
fn test_added_region_grows_actual_states() {
    let mut hub = MemoryHub::new();
    let mut project = state_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_pump(&mut engine, &mut hub, &mut project);
    let iids = actual_state_iids(&hub);

    project.add_element(
        syster_hub::tool::Element::new("power_max", ElementKind::Region)
            .with_name("max")
            .with_owner("power"),
    );
    map_pump(&mut engine, &mut hub, &mut project);

    let after = actual_state_iids(&hub);
    assert_eq!(after.len(), 9);
    assert!(iids.iter().all(|iid| after.contains(iid)));
    assert_eq!(definition_named(&hub, "Pump").parameters[0].value_sets.len(), 9);
}

#[test]
fn test_hub_state_dependence_becomes_states_and_regions() {
    let mut hub = MemoryHub::new();
    let mut source = state_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_pump(&mut engine, &mut hub, &mut source);

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let rows = vec![HubRow::new(definition_named(&hub, "Pump").iid)];
    let output = engine.transform(&ElementToBlockRule, &mut hub, &mut target, rows);
    assert_eq!(output.rows.len(), 1);

    let pump = output.rows[0].dst.clone();
    let flow = owned_of_kind(&target, &pump, ElementKind::Property)
        .into_iter()
        .find(|p| p.name_or_empty() == "flow")
        .unwrap();
    let states: Vec<ElementId> = target
        .relationships_from(&flow.id)
        .filter(|r| r.kind == ElementKind::Dependency)
        .filter_map(|r| r.target().cloned())
        .collect();
    assert_eq!(states.len(), 2);

    let mut region_counts: Vec<(String, usize)> = states
        .iter()
        .map(|s| {
            let state = target.get(s).unwrap();
            assert_eq!(state.kind, ElementKind::State);
            (
                state.name_or_empty().to_string(),
                owned_of_kind(&target, s, ElementKind::Region).len(),
            )
        })
        .collect();
    region_counts.sort();
    assert_eq!(
        region_counts,
        vec![("Mode".to_string(), 3), ("Power".to_string(), 2)]
    );
    assert_eq!(target.find_by_kind(ElementKind::StateMachine).count(), 1);
}
