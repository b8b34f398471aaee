//! Lookups and counts over a hub session.

use syster_hub::hub::{
    BinaryRelationship, Category, ElementDefinition, HubSession, Iteration, MemoryHub,
    RequirementsSpecification,
};

pub fn iteration(hub: &MemoryHub) -> &Iteration {
    hub.open_iteration().expect("fixture hub has an open iteration")
}

/// The persisted definition with this name.
pub fn definition_named<'h>(hub: &'h MemoryHub, name: &str) -> &'h ElementDefinition {
    iteration(hub)
        .element_definitions
        .values()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no element definition named '{name}'"))
}

pub fn specification_named<'h>(hub: &'h MemoryHub, name: &str) -> &'h RequirementsSpecification {
    iteration(hub)
        .requirements_specifications
        .values()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no requirements specification named '{name}'"))
}

pub fn relationships(hub: &MemoryHub) -> Vec<&BinaryRelationship> {
    iteration(hub).relationships.values().collect()
}

/// Names of the categories a thing carries.
pub fn category_names(hub: &MemoryHub, categories: &[syster_hub::Iid]) -> Vec<String> {
    let chain = hub.rdl_chain();
    categories
        .iter()
        .filter_map(|iid| chain.by_iid::<Category>(*iid))
        .map(|c| c.name.clone())
        .collect()
}

/// Counts of every kind of top-level hub thing, for idempotence checks.
#[derive(Debug, PartialEq, Eq)]
pub struct ThingCounts {
    pub element_definitions: usize,
    pub usages: usize,
    pub parameters: usize,
    pub specifications: usize,
    pub requirements: usize,
    pub relationships: usize,
    pub possible_lists: usize,
    pub actual_lists: usize,
}

pub fn thing_counts(hub: &MemoryHub) -> ThingCounts {
    let iteration = iteration(hub);
    let definitions = iteration.element_definitions.values();
    ThingCounts {
        element_definitions: iteration.element_definitions.len(),
        usages: definitions.clone().map(|d| d.contained_elements.len()).sum(),
        parameters: definitions.map(|d| d.parameters.len()).sum(),
        specifications: iteration.requirements_specifications.len(),
        requirements: iteration
            .requirements_specifications
            .values()
            .map(|s| s.requirements.len())
            .sum(),
        relationships: iteration.relationships.len(),
        possible_lists: iteration.possible_finite_state_lists.len(),
        actual_lists: iteration.actual_finite_state_lists.len(),
    }
}
