//! Blocks to element definitions.
//!
//! ## Phases
//!
//! ```text
//! phase 1, per row (recursing into part properties):
//!   find-or-create definition ─▶ boolean categories ─▶ properties ─▶ ports
//!                                                      │
//!                       binding connectors, deferred connector properties
//! phase 2, once every block is mapped:
//!   port / interface realizations ─▶ connector properties ─▶ bindings
//! ```
//!
//! A definition is found in the in-pass working set, then through the
//! external identifier map, then in the iteration by short name or name, and
//! is only created when all three miss.

use tracing::{debug, error, trace, warn};

use crate::base::{is_blank, names_match, short_name};
use crate::hub::things::add_category;
use crate::hub::{
    BinaryRelationship, Category, ClassKind, ElementDefinition, ElementUsage, Iid,
    InterfaceEndKind, Parameter, ParameterValueSet,
};
use crate::tool::stereotypes::{is_connector_property, is_part_property, is_value_property};
use crate::tool::{Element, ElementId, ElementKind, ValueSpecification};

use super::category::resolve_or_create_category;
use super::context::{MappingContext, PendingBinding};
use super::engine::{MappingRule, skip_row_local};
use super::error::MappingError;
use super::rows::{DstRow, MappedElementRow, MappedRowStatus, MappedThing, MappingDirection};
use super::state::map_state_dependencies;
use super::values::{extract_literal_value, hub_value, resolve_or_create_parameter_type};

/// Category names standing for the boolean flags of a block.
pub const BLOCK_FLAG_CATEGORIES: [&str; 4] = ["isAbstract", "isLeaf", "isActive", "isEncapsulated"];

/// The flags of a block, paired with their category names.
pub fn block_flags(block: &Element) -> [(&'static str, bool); 4] {
    [
        (BLOCK_FLAG_CATEGORIES[0], block.is_abstract),
        (BLOCK_FLAG_CATEGORIES[1], block.is_leaf),
        (BLOCK_FLAG_CATEGORIES[2], block.is_active),
        (BLOCK_FLAG_CATEGORIES[3], block.is_encapsulated),
    ]
}

/// Maps tool blocks to hub element definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockToElementRule;

impl MappingRule for BlockToElementRule {
    type Input = Vec<DstRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        ctx.ensure_ready()?;

        for row in &input {
            let result = map_block(ctx, &row.dst, row.hub).map(|_| ());
            skip_row_local(row.dst.as_str(), result)?;
        }

        resolve_port_realizations(ctx)?;
        resolve_connector_properties(ctx)?;
        flush_bindings(ctx)?;

        Ok(ctx
            .block_rows
            .iter()
            .filter_map(|(block, iid)| {
                let definition = ctx.element_definition(*iid)?.clone();
                Some(MappedElementRow {
                    hub: MappedThing::ElementDefinition(definition),
                    dst: block.clone(),
                    direction: MappingDirection::FromDstToHub,
                    status: if ctx.is_created(*iid) {
                        MappedRowStatus::New
                    } else {
                        MappedRowStatus::Existing
                    },
                })
            })
            .collect())
    }
}

// ============================================================================
// PHASE 1
// ============================================================================

/// Map one block, and every block it is composed of.
pub fn map_block(
    ctx: &mut MappingContext<'_>,
    block_id: &ElementId,
    hint: Option<Iid>,
) -> Result<Iid, MappingError> {
    if let Some(iid) = ctx.block_rows.get(block_id) {
        return Ok(*iid);
    }
    let block = ctx
        .project()
        .get(block_id)
        .cloned()
        .ok_or_else(|| MappingError::MissingToolElement(block_id.clone()))?;
    if block.kind != ElementKind::Block {
        return Err(MappingError::invalid(format!(
            "'{}' is a {}, not a block",
            block.name_or_empty(),
            block.kind.metaclass()
        )));
    }

    let iid = find_or_create_definition(ctx, &block, hint)?;
    ctx.block_rows.insert(block_id.clone(), iid);
    ctx.block_stack.push(block_id.clone());

    map_block_flags(ctx, iid, &block);

    let properties: Vec<Element> = ctx
        .project()
        .owned_of_kind(block_id, ElementKind::Property)
        .cloned()
        .collect();
    for property in &properties {
        map_property(ctx, iid, property)?;
    }

    let ports: Vec<Element> = ctx
        .project()
        .owned_of_kind(block_id, ElementKind::Port)
        .cloned()
        .collect();
    for port in &ports {
        map_port(ctx, iid, &block, port)?;
    }

    ctx.block_stack.pop();
    Ok(iid)
}

fn find_or_create_definition(
    ctx: &mut MappingContext<'_>,
    block: &Element,
    hint: Option<Iid>,
) -> Result<Iid, MappingError> {
    let name = block.name_or_empty().to_string();
    let short = short_name(&name);

    if let Some(hint) = hint {
        if ctx.element_definition(hint).is_some() {
            return Ok(hint);
        }
        warn!(block = %name, hint = %hint, "suggested counterpart not found");
    }

    let in_pass = ctx
        .element_definitions
        .values()
        .find(|d| names_match(&d.name, &d.short_name, &name, &short))
        .map(|d| d.iid);
    if let Some(iid) = in_pass {
        trace!(block = %name, "definition found in pass");
        return Ok(iid);
    }

    let recorded = ctx
        .identifiers
        .get_internal(&block.id)
        .filter(|iid| ctx.element_definition(*iid).is_some());
    if let Some(iid) = recorded {
        debug!(block = %name, "definition found through identifier map");
        let renamed = ctx
            .element_definition(iid)
            .is_some_and(|d| d.name != name);
        if renamed {
            if let Some(definition) = ctx.checkout_definition(iid) {
                definition.name = name;
                definition.short_name = short;
            }
        }
        return Ok(iid);
    }

    let persisted = ctx
        .iteration()?
        .element_definition_named(&name, &short)
        .map(|d| d.iid);
    if let Some(iid) = persisted {
        debug!(block = %name, "definition found in iteration");
        return Ok(iid);
    }

    let domain = ctx.domain()?;
    debug!(block = %name, "creating element definition");
    Ok(ctx.add_definition(ElementDefinition::new(name, short, domain)))
}

fn map_block_flags(ctx: &mut MappingContext<'_>, iid: Iid, block: &Element) {
    for (name, set) in block_flags(block) {
        if set {
            let Some(category) = resolve_or_create_category(
                ctx,
                name,
                &[ClassKind::ElementDefinition, ClassKind::ElementUsage],
            ) else {
                continue;
            };
            let present = ctx
                .element_definition(iid)
                .is_some_and(|d| d.categories.contains(&category.iid));
            if !present {
                if let Some(definition) = ctx.checkout_definition(iid) {
                    add_category(&mut definition.categories, category.iid);
                }
            }
        } else {
            let category = ctx.chain().by_name::<Category>(name, name).map(|c| c.iid);
            let Some(category) = category else {
                continue;
            };
            let present = ctx
                .element_definition(iid)
                .is_some_and(|d| d.categories.contains(&category));
            if present {
                if let Some(definition) = ctx.checkout_definition(iid) {
                    definition.categories.retain(|c| *c != category);
                }
            }
        }
    }
}

fn map_property(
    ctx: &mut MappingContext<'_>,
    definition: Iid,
    property: &Element,
) -> Result<(), MappingError> {
    if is_connector_property(property) {
        ctx.deferred_connector_properties.push(property.id.clone());
        Ok(())
    } else if is_part_property(ctx.project(), property) {
        map_part_property(ctx, definition, property)
    } else if is_value_property(ctx.project(), property) {
        map_value_property(ctx, definition, property)
    } else {
        warn!(
            property = property.name_or_empty(),
            "property is neither a part, a value nor a connector property; skipped"
        );
        Ok(())
    }
}

fn map_part_property(
    ctx: &mut MappingContext<'_>,
    definition: Iid,
    property: &Element,
) -> Result<(), MappingError> {
    let name = property.name_or_empty();
    let part_type = property
        .type_ref
        .clone()
        .filter(|t| ctx.project().get(t).is_some_and(|e| e.kind == ElementKind::Block));
    let Some(part_type) = part_type else {
        error!(property = name, "part property is not typed by a block; skipped");
        return Ok(());
    };
    if ctx.block_stack.contains(&part_type) {
        warn!(property = name, "part property recurses into an enclosing block; skipped");
        return Ok(());
    }

    let nested = match map_block(ctx, &part_type, None) {
        Ok(nested) => nested,
        Err(err) if err.is_row_local() => {
            error!(property = name, error = %err, "part type could not be mapped; skipped");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let usage = upsert_usage(ctx, definition, property, name, nested, InterfaceEndKind::None)
        .ok_or(MappingError::MissingHubThing(definition))?;
    ctx.usages_by_tool.insert(property.id.clone(), usage);
    Ok(())
}

/// Find a usage by tool marker, then by name, updating it; else create it.
fn upsert_usage(
    ctx: &mut MappingContext<'_>,
    definition: Iid,
    tool_element: &Element,
    name: &str,
    element_definition: Iid,
    interface_end: InterfaceEndKind,
) -> Option<Iid> {
    let short = short_name(name);
    let tool_id = tool_element.id.as_str();
    let owner = ctx.checkout_definition(definition)?;

    let index = owner
        .contained_elements
        .iter()
        .position(|u| u.tool_marker() == Some(tool_id))
        .or_else(|| {
            owner
                .contained_elements
                .iter()
                .position(|u| names_match(&u.name, &u.short_name, name, &short))
        });
    let usage = match index {
        Some(index) => &mut owner.contained_elements[index],
        None => {
            owner
                .contained_elements
                .push(ElementUsage::new(name, short.clone(), element_definition, definition));
            owner.contained_elements.last_mut()?
        }
    };
    usage.name = name.to_string();
    usage.short_name = short;
    usage.element_definition = element_definition;
    usage.interface_end = interface_end;
    usage.set_tool_marker(tool_id);
    Some(usage.iid)
}

fn map_value_property(
    ctx: &mut MappingContext<'_>,
    definition: Iid,
    property: &Element,
) -> Result<(), MappingError> {
    let name = property.name_or_empty();
    let Some(value) = extract_literal_value(property) else {
        debug!(property = name, "no value extracted; parameter skipped");
        return Ok(());
    };
    let value = hub_value(Some(value.as_str()), ctx.config);
    let owner = ctx
        .element_definition(definition)
        .cloned()
        .ok_or(MappingError::MissingHubThing(definition))?;
    let Some((parameter_type, scale)) = resolve_or_create_parameter_type(ctx, &owner, property)
    else {
        return Ok(());
    };

    let actual_list = map_state_dependencies(ctx, property)?;
    let actual_states: Vec<Iid> = actual_list
        .and_then(|l| ctx.actual_list(l))
        .map(|l| l.actual_states.iter().map(|s| s.iid).collect())
        .unwrap_or_default();

    let owner = ctx
        .checkout_definition(definition)
        .ok_or(MappingError::MissingHubThing(definition))?;
    let index = owner
        .parameters
        .iter()
        .position(|p| p.parameter_type == parameter_type.iid);
    let parameter = match index {
        Some(index) => &mut owner.parameters[index],
        None => {
            owner.parameters.push(Parameter::new(
                parameter_type.iid,
                scale.as_ref().map(|s| s.iid),
                definition,
            ));
            let last = owner.parameters.len() - 1;
            &mut owner.parameters[last]
        }
    };
    if let Some(scale) = &scale {
        parameter.scale = Some(scale.iid);
    }
    parameter.state_dependence = actual_list;
    align_value_sets(parameter, &actual_states, &value);
    let parameter_iid = parameter.iid;
    trace!(property = name, value = %value, "parameter mapped");

    collect_binding_connectors(ctx, property, parameter_iid);
    Ok(())
}

/// Give a parameter one value set per actual state, or a single
/// state-independent one.
///
/// Value sets of states that survive keep their values; new ones receive
/// `value`.
pub fn align_value_sets(parameter: &mut Parameter, actual_states: &[Iid], value: &str) {
    if actual_states.is_empty() {
        parameter.value_sets.retain(|v| v.actual_state.is_none());
        parameter.set_manual_value(value);
        return;
    }
    let previous = std::mem::take(&mut parameter.value_sets);
    parameter.value_sets = actual_states
        .iter()
        .map(|state| {
            previous
                .iter()
                .find(|v| v.actual_state == Some(*state))
                .cloned()
                .unwrap_or_else(|| ParameterValueSet::manual(value, Some(*state)))
        })
        .collect();
}

/// Note each binding connector attached to a value property. The first end
/// seen sets the source, the second the target.
fn collect_binding_connectors(ctx: &mut MappingContext<'_>, property: &Element, parameter: Iid) {
    let connectors: Vec<(ElementId, String)> = ctx
        .project()
        .connectors_of(&property.id)
        .map(|c| (c.id.clone(), c.name_or_empty().to_string()))
        .collect();
    for (connector, name) in connectors {
        match ctx.bindings.get_mut(&connector) {
            Some(binding) => {
                if binding.source != parameter && binding.target.is_none() {
                    binding.target = Some(parameter);
                }
            }
            None => {
                ctx.bindings.insert(
                    connector,
                    PendingBinding {
                        name,
                        source: parameter,
                        target: None,
                    },
                );
            }
        }
    }
}

/// Direction of service from the interfaces a port provides and requires.
pub fn interface_end(port: &Element) -> InterfaceEndKind {
    match (
        port.provided_interfaces.is_empty(),
        port.required_interfaces.is_empty(),
    ) {
        (false, true) => InterfaceEndKind::Output,
        (true, false) => InterfaceEndKind::Input,
        _ => InterfaceEndKind::Undirected,
    }
}

/// `<owner>_port<N>`, with N one past the port usages already present and
/// bumped until no usage carries the name.
pub fn fallback_port_name(definition: &ElementDefinition, owner_name: &str, port_definition: Iid) -> String {
    let mut index = definition
        .contained_elements
        .iter()
        .filter(|u| u.element_definition == port_definition)
        .count()
        + 1;
    loop {
        let candidate = format!("{owner_name}_port{index}");
        let taken = definition
            .contained_elements
            .iter()
            .any(|u| u.name.eq_ignore_ascii_case(&candidate));
        if !taken {
            return candidate;
        }
        index += 1;
    }
}

fn map_port(
    ctx: &mut MappingContext<'_>,
    definition: Iid,
    block: &Element,
    port: &Element,
) -> Result<(), MappingError> {
    let port_definition = ensure_port_definition(ctx)?;
    let owner = ctx
        .element_definition(definition)
        .ok_or(MappingError::MissingHubThing(definition))?;

    let name = if is_blank(port.name.as_deref()) {
        owner
            .contained_elements
            .iter()
            .find(|u| u.tool_marker() == Some(port.id.as_str()))
            .map(|u| u.name.clone())
            .unwrap_or_else(|| fallback_port_name(owner, block.name_or_empty(), port_definition))
    } else {
        port.name_or_empty().to_string()
    };

    let usage = upsert_usage(ctx, definition, port, &name, port_definition, interface_end(port))
        .ok_or(MappingError::MissingHubThing(definition))?;
    ctx.port_usages.insert(port.id.clone(), (definition, usage));
    ctx.usages_by_tool.insert(port.id.clone(), usage);
    Ok(())
}

/// The shared definition typing every port usage.
fn ensure_port_definition(ctx: &mut MappingContext<'_>) -> Result<Iid, MappingError> {
    if let Some(iid) = ctx.port_definition {
        return Ok(iid);
    }
    let name = ctx.config.port_definition_name.clone();
    let short = short_name(&name);
    let iid = match ctx.find_definition_named(&name, &short) {
        Some(iid) => iid,
        None => {
            let domain = ctx.domain()?;
            debug!(name = %name, "creating port definition");
            ctx.add_definition(ElementDefinition::new(name, short, domain))
        }
    };
    ctx.port_definition = Some(iid);
    Ok(iid)
}

// ============================================================================
// PHASE 2
// ============================================================================

/// Usage mapped from a tool element in this pass, or carrying its marker.
fn usage_for_tool_element(ctx: &MappingContext<'_>, tool_id: &ElementId) -> Option<Iid> {
    if let Some(usage) = ctx.usages_by_tool.get(tool_id) {
        return Some(*usage);
    }
    let marked = |d: &ElementDefinition| {
        d.contained_elements
            .iter()
            .find(|u| u.tool_marker() == Some(tool_id.as_str()))
            .map(|u| u.iid)
    };
    ctx.element_definitions.values().find_map(marked).or_else(|| {
        ctx.iteration()
            .ok()?
            .element_definitions
            .values()
            .find_map(marked)
    })
}

/// Usage standing for a block that realizes an interface: its port providing
/// the interface, else any usage of its definition.
fn realizing_usage(ctx: &MappingContext<'_>, realizer: &ElementId, interface: &ElementId) -> Option<Iid> {
    let providing_port = ctx
        .project()
        .owned_of_kind(realizer, ElementKind::Port)
        .find(|p| p.provided_interfaces.contains(interface))
        .map(|p| p.id.clone());
    if let Some(usage) = providing_port.and_then(|p| ctx.port_usages.get(&p).map(|(_, u)| *u)) {
        return Some(usage);
    }

    let definition = ctx.block_rows.get(realizer).copied()?;
    let typed_by = |d: &ElementDefinition| {
        d.contained_elements
            .iter()
            .find(|u| u.element_definition == definition)
            .map(|u| u.iid)
    };
    ctx.element_definitions.values().find_map(typed_by).or_else(|| {
        ctx.iteration()
            .ok()?
            .element_definitions
            .values()
            .find_map(typed_by)
    })
}

/// Relate each port requiring an interface to whatever realizes it.
fn resolve_port_realizations(ctx: &mut MappingContext<'_>) -> Result<(), MappingError> {
    let domain = ctx.domain()?;
    let ports: Vec<(ElementId, Iid)> = ctx
        .port_usages
        .iter()
        .map(|(port, (_, usage))| (port.clone(), *usage))
        .collect();

    for (port_id, usage) in ports {
        let Some(port) = ctx.project().get(&port_id).cloned() else {
            continue;
        };
        for interface in &port.required_interfaces {
            let interface_name = ctx
                .project()
                .get(interface)
                .map(|i| i.name_or_empty().to_string())
                .unwrap_or_default();
            let realizers: Vec<ElementId> = ctx
                .project()
                .find_by_kind(ElementKind::InterfaceRealization)
                .filter(|r| r.target() == Some(interface))
                .filter_map(|r| r.source().or(r.owner.as_ref()).cloned())
                .collect();

            for realizer in realizers {
                if port.owner.as_ref() == Some(&realizer) {
                    trace!(interface = %interface_name, "self realization skipped");
                    continue;
                }
                let Some(target) = realizing_usage(ctx, &realizer, interface) else {
                    debug!(interface = %interface_name, "realizing block has no mapped usage");
                    continue;
                };
                ctx.add_relationship(BinaryRelationship::new(
                    interface_name.clone(),
                    usage,
                    target,
                    domain,
                ));
            }
        }
    }
    Ok(())
}

/// Relate the two usages a connector property's connector joins.
fn resolve_connector_properties(ctx: &mut MappingContext<'_>) -> Result<(), MappingError> {
    let domain = ctx.domain()?;
    let deferred = std::mem::take(&mut ctx.deferred_connector_properties);

    for property_id in deferred {
        let Some(property) = ctx.project().get(&property_id).cloned() else {
            continue;
        };
        let connector = property
            .default_value
            .as_ref()
            .and_then(ValueSpecification::referenced_element)
            .and_then(|c| ctx.project().get(c))
            .cloned();
        let Some(connector) = connector else {
            warn!(property = property.name_or_empty(), "connector not found; skipped");
            continue;
        };
        let ends: Vec<Iid> = connector
            .connector_ends
            .iter()
            .filter_map(|end| usage_for_tool_element(ctx, &end.role))
            .collect();
        let [source, target] = ends.as_slice() else {
            warn!(
                property = property.name_or_empty(),
                resolved = ends.len(),
                "connector ends not resolved to two usages; skipped"
            );
            continue;
        };
        ctx.add_relationship(BinaryRelationship::new(
            property.name_or_empty(),
            *source,
            *target,
            domain,
        ));
    }
    Ok(())
}

/// One relationship per binding connector whose both ends were seen.
fn flush_bindings(ctx: &mut MappingContext<'_>) -> Result<(), MappingError> {
    let domain = ctx.domain()?;
    let bindings: Vec<PendingBinding> = ctx.bindings.drain(..).map(|(_, b)| b).collect();
    for binding in bindings {
        match binding.target {
            Some(target) => {
                let name = if binding.name.is_empty() {
                    "binding".to_string()
                } else {
                    binding.name
                };
                ctx.add_relationship(BinaryRelationship::new(name, binding.source, target, domain));
            }
            None => trace!(binding = %binding.name, "binding connector with a single mapped end"),
        }
    }
    Ok(())
}
