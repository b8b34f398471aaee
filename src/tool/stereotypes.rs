//! Stereotype and capability queries over tool elements.
//!
//! The modeling tool decides what a property "is" (part, value, connector
//! property) from the stereotypes applied to it and the kind of its type.
//! These are pure functions over [`Element`] and [`Project`].

use super::model::{Element, ElementKind, Project, PropertyValue, ValueSpecification};

/// Tagged-value key holding a value type's unit.
pub const UNIT_TAG: &str = "unit";

/// SysML stereotypes the mapping rules care about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stereotype {
    Block,
    PartProperty,
    ValueProperty,
    ConnectorProperty,
    ValueType,
    Requirement,
    FunctionalRequirement,
    InterfaceRequirement,
    PerformanceRequirement,
    PhysicalRequirement,
    DesignConstraint,
    Trace,
    Satisfy,
    Verify,
    Refine,
    DeriveReqt,
    Copy,
    Allocate,
}

impl Stereotype {
    /// The stereotype name as applied in the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::PartProperty => "PartProperty",
            Self::ValueProperty => "ValueProperty",
            Self::ConnectorProperty => "ConnectorProperty",
            Self::ValueType => "ValueType",
            Self::Requirement => "Requirement",
            Self::FunctionalRequirement => "functionalRequirement",
            Self::InterfaceRequirement => "interfaceRequirement",
            Self::PerformanceRequirement => "performanceRequirement",
            Self::PhysicalRequirement => "physicalRequirement",
            Self::DesignConstraint => "designConstraint",
            Self::Trace => "Trace",
            Self::Satisfy => "Satisfy",
            Self::Verify => "Verify",
            Self::Refine => "Refine",
            Self::DeriveReqt => "DeriveReqt",
            Self::Copy => "Copy",
            Self::Allocate => "Allocate",
        }
    }
}

impl std::fmt::Display for Stereotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the stereotype is applied to the element.
pub fn does_it_have_the_stereotype(element: &Element, stereotype: Stereotype) -> bool {
    element.has_stereotype_named(stereotype.name())
}

/// A property typed by a block, i.e. a composition.
pub fn is_part_property(project: &Project, property: &Element) -> bool {
    if property.kind != ElementKind::Property {
        return false;
    }
    if does_it_have_the_stereotype(property, Stereotype::PartProperty) {
        return true;
    }
    property
        .type_ref
        .as_ref()
        .and_then(|t| project.get(t))
        .is_some_and(|t| t.kind == ElementKind::Block)
}

/// A property holding a value: stereotyped as such, typed by a data type,
/// or carrying a literal default value.
pub fn is_value_property(project: &Project, property: &Element) -> bool {
    if property.kind != ElementKind::Property || is_part_property(project, property) {
        return false;
    }
    if does_it_have_the_stereotype(property, Stereotype::ValueProperty) {
        return true;
    }
    let typed_by_data_type = property
        .type_ref
        .as_ref()
        .and_then(|t| project.get(t))
        .is_some_and(|t| t.kind == ElementKind::DataType);

    typed_by_data_type
        || matches!(
            property.default_value,
            Some(
                ValueSpecification::LiteralInteger(_)
                    | ValueSpecification::LiteralUnlimitedNatural(_)
                    | ValueSpecification::LiteralReal(_)
                    | ValueSpecification::LiteralBoolean(_)
                    | ValueSpecification::LiteralString(_)
            )
        )
}

/// A connector property: stereotyped `ConnectorProperty` and holding an
/// element cross-reference as its default value.
pub fn is_connector_property(property: &Element) -> bool {
    property.kind == ElementKind::Property
        && does_it_have_the_stereotype(property, Stereotype::ConnectorProperty)
        && property
            .default_value
            .as_ref()
            .and_then(ValueSpecification::referenced_element)
            .is_some()
}

/// The unit name carried by a property's value type, if any.
pub fn unit_representation(project: &Project, property: &Element) -> Option<String> {
    let value_type = property.type_ref.as_ref().and_then(|t| project.get(t))?;
    value_type
        .properties
        .get(UNIT_TAG)
        .and_then(PropertyValue::as_str)
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
}

/// Render a property's type as `"Type[Unit]"`, or `"Type"` without a unit.
pub fn type_representation(project: &Project, property: &Element) -> Option<String> {
    let value_type = property.type_ref.as_ref().and_then(|t| project.get(t))?;
    let type_name = value_type.name.as_deref()?;
    Some(match unit_representation(project, property) {
        Some(unit) => format!("{type_name}[{unit}]"),
        None => type_name.to_string(),
    })
}

/// Split a `"Type[Unit]"` representation back into its parts.
pub fn split_type_representation(representation: &str) -> (&str, Option<&str>) {
    match representation.split_once('[') {
        Some((type_name, rest)) => match rest.strip_suffix(']') {
            Some(unit) if !unit.is_empty() => (type_name, Some(unit)),
            _ => (representation, None),
        },
        None => (representation, None),
    }
}
