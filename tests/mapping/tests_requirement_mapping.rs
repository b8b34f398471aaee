//! Tests for requirements, their specification and their groups.

use crate::helpers::hub_assertions::*;
use crate::helpers::tool_fixtures::*;
use syster_hub::hub::{MemoryHub, RequirementsSpecification};
use syster_hub::mapping::{
    DstRow, HubRequirementToDstRule, HubRow, MappedRowStatus, MappingConfig, MappingEngine,
    MappingOutput, RequirementToHubRule,
};
use syster_hub::tool::{ElementId, ElementKind, Project};

/// Model / Root / P1 / P2 / Req_1
fn nested_project() -> Project {
    let mut project = model_project();
    add_package(&mut project, "root", "Root", MODEL);
    add_package(&mut project, "p1", "P1", "root");
    add_package(&mut project, "p2", "P2", "p1");
    add_requirement(&mut project, "r1", "Req_1", "p2", "REQ-001", "The pump shall deliver fuel.");
    project
}

fn map_requirements(
    engine: &mut MappingEngine,
    hub: &mut MemoryHub,
    project: &mut Project,
    ids: &[&str],
) -> MappingOutput {
    let rows: Vec<DstRow> = ids.iter().map(|id| DstRow::new(*id)).collect();
    let output = engine.transform(&RequirementToHubRule, hub, project, rows);
    engine.commit(hub, &output).unwrap();
    output
}

fn group_names(specification: &RequirementsSpecification) -> Vec<String> {
    specification
        .all_groups()
        .iter()
        .map(|g| g.name.clone())
        .collect()
}

#[test]
fn test_requirement_lands_in_nested_groups() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    let mut engine = MappingEngine::new(MappingConfig::default());

    let output = map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].status, MappedRowStatus::New);

    let specification = specification_named(&hub, "Root");
    assert_eq!(group_names(specification), vec!["P1", "P2"]);
    assert_eq!(specification.groups.len(), 1);
    assert_eq!(specification.groups[0].groups[0].name, "P2");

    let requirement = &specification.requirements[0];
    assert_eq!(requirement.name, "Req_1");
    assert_eq!(requirement.short_name, "REQ001");
    assert_eq!(requirement.group, Some(specification.groups[0].groups[0].iid));
    assert_eq!(requirement.definitions.len(), 1);
    assert_eq!(requirement.definitions[0].language_code, "en");
    assert_eq!(requirement.definitions[0].content, "The pump shall deliver fuel.");
}

#[test]
fn test_sibling_requirements_share_groups() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    add_requirement(&mut project, "r2", "Req_2", "p2", "REQ-002", "The tank shall hold fuel.");
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);
    map_requirements(&mut engine, &mut hub, &mut project, &["r2"]);

    let counts = thing_counts(&hub);
    assert_eq!(counts.specifications, 1);
    assert_eq!(counts.requirements, 2);
    let specification = specification_named(&hub, "Root");
    assert_eq!(group_names(specification), vec!["P1", "P2"]);
    let groups: Vec<_> = specification.requirements.iter().map(|r| r.group).collect();
    assert_eq!(groups[0], groups[1]);
}

#[test]
fn test_requirement_kind_becomes_category() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    project
        .get_mut(&ElementId::new("r1"))
        .unwrap()
        .stereotypes
        .push("functionalRequirement".into());
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);

    let requirement = &specification_named(&hub, "Root").requirements[0];
    assert_eq!(
        category_names(&hub, &requirement.categories),
        vec!["functionalRequirement".to_string()]
    );
}

#[test]
fn test_second_pass_changes_nothing() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    let mut engine = MappingEngine::new(MappingConfig::default());

    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);
    let before = thing_counts(&hub);
    let requirement = specification_named(&hub, "Root").requirements[0].clone();

    let output = map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);

    assert_eq!(output.rows[0].status, MappedRowStatus::Existing);
    assert_eq!(thing_counts(&hub), before);
    assert_eq!(specification_named(&hub, "Root").requirements[0], requirement);
}

#[test]
fn test_changed_text_replaces_definition() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);

    project
        .get_mut(&ElementId::new("r1"))
        .unwrap()
        .properties
        .insert("Text".into(), "The pump shall deliver 5 l/min.".into());
    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);

    let requirement = &specification_named(&hub, "Root").requirements[0];
    assert_eq!(requirement.definitions.len(), 1);
    assert_eq!(requirement.definitions[0].content, "The pump shall deliver 5 l/min.");
}

#[test]
fn test_non_requirement_row_skipped() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    let mut engine = MappingEngine::new(MappingConfig::default());

    let output = map_requirements(&mut engine, &mut hub, &mut project, &["p1", "missing", "r1"]);

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].dst, ElementId::new("r1"));
}

#[test]
fn test_hub_requirement_recreates_packages() {
    let mut hub = MemoryHub::new();
    let mut source = nested_project();
    source
        .get_mut(&ElementId::new("r1"))
        .unwrap()
        .stereotypes
        .push("performanceRequirement".into());
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_requirements(&mut engine, &mut hub, &mut source, &["r1"]);
    let iid = specification_named(&hub, "Root").requirements[0].iid;

    let mut target = model_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    let output = engine.transform(
        &HubRequirementToDstRule,
        &mut hub,
        &mut target,
        vec![HubRow::new(iid)],
    );
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].status, MappedRowStatus::New);

    let root = owned_of_kind(&target, &ElementId::new(MODEL), ElementKind::Package);
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name_or_empty(), "Root");
    let p1 = owned_of_kind(&target, &root[0].id, ElementKind::Package);
    assert_eq!(p1[0].name_or_empty(), "P1");
    let p2 = owned_of_kind(&target, &p1[0].id, ElementKind::Package);
    assert_eq!(p2[0].name_or_empty(), "P2");

    let requirements = owned_of_kind(&target, &p2[0].id, ElementKind::Requirement);
    assert_eq!(requirements.len(), 1);
    let requirement = &requirements[0];
    assert_eq!(requirement.name_or_empty(), "Req_1");
    assert!(requirement.has_stereotype_named("Requirement"));
    assert!(requirement.has_stereotype_named("performanceRequirement"));
    assert_eq!(
        requirement.properties.get("Id").and_then(|v| v.as_str()),
        Some("REQ001")
    );
    assert_eq!(
        requirement.properties.get("Text").and_then(|v| v.as_str()),
        Some("The pump shall deliver fuel.")
    );

    let before = target.element_count();
    let again = engine.transform(
        &HubRequirementToDstRule,
        &mut hub,
        &mut target,
        vec![HubRow::new(iid)],
    );
    assert_eq!(again.rows[0].status, MappedRowStatus::Existing);
    assert_eq!(target.element_count(), before);
}

#[test]
fn test_hub_requirement_moves_existing_element() {
    let mut hub = MemoryHub::new();
    let mut project = nested_project();
    let mut engine = MappingEngine::new(MappingConfig::default());
    map_requirements(&mut engine, &mut hub, &mut project, &["r1"]);
    let iid = specification_named(&hub, "Root").requirements[0].iid;

    let loose = add_package(&mut project, "loose", "Loose", MODEL);
    let r1 = ElementId::new("r1");
    project.get_mut(&ElementId::new("p2")).unwrap().owned_elements.retain(|e| e != &r1);
    project.get_mut(&r1).unwrap().owner = Some(loose.clone());
    project.get_mut(&loose).unwrap().owned_elements.push(r1.clone());

    let output = engine.transform(
        &HubRequirementToDstRule,
        &mut hub,
        &mut project,
        vec![HubRow::new(iid)],
    );

    assert_eq!(output.rows[0].dst, r1);
    assert_eq!(project.get(&r1).unwrap().owner, Some(ElementId::new("p2")));
    assert_eq!(project.find_by_kind(ElementKind::Requirement).count(), 1);
}
