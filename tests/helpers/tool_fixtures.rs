//! Builders for small tool projects.

use syster_hub::tool::stereotypes::UNIT_TAG;
use syster_hub::tool::{
    ConnectorEnd, Element, ElementId, ElementKind, Project, PropertyValue, ValueSpecification,
};

/// Identifier of the model every fixture project is rooted in.
pub const MODEL: &str = "model";

/// A project holding only the root model.
pub fn model_project() -> Project {
    let mut project = Project::new();
    project.add_element(Element::new(MODEL, ElementKind::Model).with_name("Model"));
    project
}

pub fn add_package(project: &mut Project, id: &str, name: &str, owner: &str) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Package)
            .with_name(name)
            .with_owner(owner),
    )
}

pub fn add_block(project: &mut Project, id: &str, name: &str, owner: &str) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Block)
            .with_name(name)
            .with_stereotype("Block")
            .with_owner(owner),
    )
}

/// A value type carrying a unit tag.
pub fn add_value_type(project: &mut Project, id: &str, name: &str, unit: &str) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::DataType)
            .with_name(name)
            .with_stereotype("ValueType")
            .with_property(UNIT_TAG, PropertyValue::from(unit))
            .with_owner(MODEL),
    )
}

pub fn add_value_property(
    project: &mut Project,
    id: &str,
    name: &str,
    owner: &str,
    value: ValueSpecification,
) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Property)
            .with_name(name)
            .with_stereotype("ValueProperty")
            .with_default_value(value)
            .with_owner(owner),
    )
}

pub fn add_part_property(
    project: &mut Project,
    id: &str,
    name: &str,
    owner: &str,
    part_type: &str,
) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Property)
            .with_name(name)
            .with_stereotype("PartProperty")
            .with_type(part_type)
            .with_owner(owner),
    )
}

pub fn add_port(project: &mut Project, port: Element, owner: &str) -> ElementId {
    project.add_element(port.with_owner(owner))
}

pub fn add_interface(project: &mut Project, id: &str, name: &str) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Interface)
            .with_name(name)
            .with_owner(MODEL),
    )
}

/// A realization of `interface` by `block`.
pub fn add_realization(project: &mut Project, id: &str, block: &str, interface: &str) -> ElementId {
    project.add_element(
        Element::new_relationship(id, ElementKind::InterfaceRealization, block, interface)
            .with_owner(block),
    )
}

/// A connector between two roles, owned by `owner`.
pub fn add_connector(project: &mut Project, id: &str, owner: &str, ends: [&str; 2]) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Connector)
            .with_name(id)
            .with_end(ConnectorEnd::new(format!("{id}_end0"), ends[0]))
            .with_end(ConnectorEnd::new(format!("{id}_end1"), ends[1]))
            .with_owner(owner),
    )
}

pub fn add_requirement(
    project: &mut Project,
    id: &str,
    name: &str,
    owner: &str,
    requirement_id: &str,
    text: &str,
) -> ElementId {
    project.add_element(
        Element::new(id, ElementKind::Requirement)
            .with_name(name)
            .with_stereotype("Requirement")
            .with_property("Id", PropertyValue::from(requirement_id))
            .with_property("Text", PropertyValue::from(text))
            .with_owner(owner),
    )
}

/// A state inside a state machine, with one region per name.
pub fn add_state(project: &mut Project, id: &str, name: &str, regions: &[&str]) -> ElementId {
    let machine = ElementId::new("machine");
    if project.get(&machine).is_none() {
        project.add_element(
            Element::new("machine", ElementKind::StateMachine)
                .with_name("StateMachine")
                .with_owner(MODEL),
        );
        project.add_element(
            Element::new("machine_region", ElementKind::Region)
                .with_name("Region")
                .with_owner("machine"),
        );
    }
    let state = project.add_element(
        Element::new(id, ElementKind::State)
            .with_name(name)
            .with_owner("machine_region"),
    );
    for region in regions {
        project.add_element(
            Element::new(format!("{id}_{region}"), ElementKind::Region)
                .with_name(*region)
                .with_owner(id),
        );
    }
    state
}

/// A directed relationship with an optional stereotype.
pub fn add_directed(
    project: &mut Project,
    id: &str,
    kind: ElementKind,
    source: &str,
    target: &str,
    stereotype: Option<&str>,
) -> ElementId {
    let mut element = Element::new_relationship(id, kind, source, target).with_owner(MODEL);
    if let Some(stereotype) = stereotype {
        element = element.with_stereotype(stereotype);
    }
    project.add_element(element)
}

/// The elements of a kind owned by `owner`.
pub fn owned_of_kind(project: &Project, owner: &ElementId, kind: ElementKind) -> Vec<Element> {
    project.owned_of_kind(owner, kind).cloned().collect()
}
