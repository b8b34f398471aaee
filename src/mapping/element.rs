//! Element definitions to blocks.
//!
//! Parameters become value properties typed by a `"Type[Unit]"` value type,
//! usages become part properties, and usages of the port definition become
//! ports. Hub relationships between two ports are turned back into a
//! provided/required interface pair plus an interface realization.

use tracing::{debug, trace, warn};

use crate::base::names_match;
use crate::hub::{
    ElementDefinition, ElementUsage, InterfaceEndKind, Iid, MeasurementScale, MeasurementUnit,
    Parameter, ParameterType,
};
use crate::tool::stereotypes::{UNIT_TAG, split_type_representation};
use crate::tool::{Element, ElementId, ElementKind, PropertyValue, Stereotype};

use super::block::BLOCK_FLAG_CATEGORIES;
use super::category::category_names;
use super::context::MappingContext;
use super::engine::{MappingRule, skip_row_local};
use super::error::MappingError;
use super::rows::{HubRow, MappedElementRow, MappedRowStatus, MappedThing, MappingDirection};
use super::state::map_state_dependence_to_dst;
use super::values::tool_value_specification;

/// Maps hub element definitions to tool blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElementToBlockRule;

impl MappingRule for ElementToBlockRule {
    type Input = Vec<HubRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        ctx.ensure_ready()?;

        for row in &input {
            let result = map_definition(ctx, row.hub, row.dst.as_ref()).map(|_| ());
            skip_row_local(&row.hub.to_string(), result)?;
        }
        connect_ports(ctx)?;

        let mapped: Vec<(Iid, ElementId)> = ctx
            .dst_blocks
            .iter()
            .map(|(iid, block)| (*iid, block.clone()))
            .collect();
        Ok(mapped
            .into_iter()
            .filter_map(|(iid, block)| {
                let definition = ctx.element_definition(iid)?.clone();
                Some(MappedElementRow {
                    hub: MappedThing::ElementDefinition(definition),
                    status: if ctx.transaction().is_created(&block) {
                        MappedRowStatus::New
                    } else {
                        MappedRowStatus::Existing
                    },
                    dst: block,
                    direction: MappingDirection::FromHubToDst,
                })
            })
            .collect())
    }
}

/// Map one definition, and every definition its usages are typed by.
pub fn map_definition(
    ctx: &mut MappingContext<'_>,
    iid: Iid,
    hint: Option<&ElementId>,
) -> Result<ElementId, MappingError> {
    if let Some(block) = ctx.dst_blocks.get(&iid) {
        return Ok(block.clone());
    }
    let definition = ctx
        .element_definition(iid)
        .cloned()
        .ok_or(MappingError::MissingHubThing(iid))?;

    let block = find_or_create_block(ctx, &definition, hint);
    ctx.dst_blocks.insert(iid, block.clone());
    ctx.dst_stack.push(iid);

    map_flags(ctx, &definition, &block);
    for parameter in &definition.parameters {
        map_parameter(ctx, &block, parameter)?;
    }
    for usage in &definition.contained_elements {
        map_usage(ctx, &block, usage)?;
    }

    ctx.dst_stack.pop();
    Ok(block)
}

fn find_or_create_block(
    ctx: &mut MappingContext<'_>,
    definition: &ElementDefinition,
    hint: Option<&ElementId>,
) -> ElementId {
    fn is_block(ctx: &MappingContext<'_>, id: &ElementId) -> bool {
        ctx.project()
            .get(id)
            .is_some_and(|e| e.kind == ElementKind::Block)
    }

    let found = hint
        .filter(|id| is_block(ctx, id))
        .or_else(|| {
            ctx.identifiers
                .get_external(definition.iid)
                .filter(|id| is_block(ctx, id))
        })
        .cloned()
        .or_else(|| {
            ctx.project()
                .find_by_name(ElementKind::Block, &definition.name)
                .next()
                .map(|b| b.id.clone())
        });

    match found {
        Some(block) => {
            let renamed = ctx
                .project()
                .get(&block)
                .is_some_and(|b| b.name_or_empty() != definition.name);
            if renamed {
                ctx.tx.rename(ctx.project, &block, &definition.name);
            }
            block
        }
        None => {
            let root = ctx.project().root_container().map(|r| r.id.clone());
            let block = ctx
                .tx
                .create(ctx.project, ElementKind::Block, &definition.name, root.as_ref());
            ctx.tx
                .apply_stereotype(ctx.project, &block, Stereotype::Block.name());
            debug!(block = %definition.name, "created block");
            block
        }
    }
}

fn map_flags(ctx: &mut MappingContext<'_>, definition: &ElementDefinition, block: &ElementId) {
    let names = category_names(ctx, &definition.categories);
    let flag = |name: &str| names.iter().any(|n| n.eq_ignore_ascii_case(name));
    let wanted = [
        flag(BLOCK_FLAG_CATEGORIES[0]),
        flag(BLOCK_FLAG_CATEGORIES[1]),
        flag(BLOCK_FLAG_CATEGORIES[2]),
        flag(BLOCK_FLAG_CATEGORIES[3]),
    ];
    let current = ctx
        .project()
        .get(block)
        .map(|b| [b.is_abstract, b.is_leaf, b.is_active, b.is_encapsulated]);
    if current.is_some_and(|c| c != wanted) {
        ctx.tx.modify(ctx.project, block, |b| {
            [b.is_abstract, b.is_leaf, b.is_active, b.is_encapsulated] = wanted;
        });
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

fn map_parameter(
    ctx: &mut MappingContext<'_>,
    block: &ElementId,
    parameter: &Parameter,
) -> Result<(), MappingError> {
    let (parameter_type, unit, value) = {
        let chain = ctx.chain();
        let Some(parameter_type) = chain.by_iid::<ParameterType>(parameter.parameter_type).cloned()
        else {
            warn!(parameter = %parameter.iid, "parameter type not found; skipped");
            return Ok(());
        };
        let unit = parameter
            .scale
            .and_then(|s| chain.by_iid::<MeasurementScale>(s))
            .map(|scale| {
                chain
                    .by_iid::<MeasurementUnit>(scale.unit)
                    .map_or_else(|| scale.name.clone(), |u| u.name.clone())
            });
        let value = tool_value_specification(&chain, parameter, ctx.config);
        (parameter_type, unit, value)
    };

    let value_type = find_or_create_value_type(ctx, &parameter_type.name, unit.as_deref());

    let existing = ctx
        .project()
        .owned_of_kind(block, ElementKind::Property)
        .find(|p| p.name_or_empty().eq_ignore_ascii_case(&parameter_type.name))
        .map(|p| p.id.clone());
    let property = match existing {
        Some(property) => property,
        None => ctx
            .tx
            .create(ctx.project, ElementKind::Property, &parameter_type.name, Some(block)),
    };
    ctx.tx.modify(ctx.project, &property, |p| {
        p.type_ref = Some(value_type);
        p.default_value = value;
    });
    ctx.tx
        .apply_stereotype(ctx.project, &property, Stereotype::ValueProperty.name());
    trace!(property = %parameter_type.name, "value property mapped");

    if let Some(actual_list) = parameter.state_dependence {
        map_state_dependence_to_dst(ctx, &property, actual_list)?;
    }
    Ok(())
}

/// The value type named `"Type[Unit]"`, or a type named `Type` carrying the
/// unit tag; created in the data package when neither exists.
fn find_or_create_value_type(ctx: &mut MappingContext<'_>, type_name: &str, unit: Option<&str>) -> ElementId {
    let representation = match unit {
        Some(unit) => format!("{type_name}[{unit}]"),
        None => type_name.to_string(),
    };
    let (bare, unit) = split_type_representation(&representation);

    let existing = ctx
        .project()
        .find_by_kind(ElementKind::DataType)
        .find(|t| {
            let name = t.name_or_empty();
            let tagged = t.properties.get(UNIT_TAG).and_then(PropertyValue::as_str);
            name.eq_ignore_ascii_case(&representation)
                || (name.eq_ignore_ascii_case(bare) && tagged == unit)
        })
        .map(|t| t.id.clone());
    if let Some(existing) = existing {
        return existing;
    }

    let mut value_type = Element::new(ElementId::generate(), ElementKind::DataType)
        .with_name(representation.as_str())
        .with_stereotype(Stereotype::ValueType.name());
    if let Some(unit) = unit {
        value_type = value_type.with_property(UNIT_TAG, unit.into());
    }
    debug!(value_type = %representation, "created value type");
    let package = ctx.config.data_package_name.clone();
    ctx.tx
        .add_reference_data_to_data_package(ctx.project, value_type, &package)
}

// ============================================================================
// USAGES
// ============================================================================

fn is_port_usage(ctx: &MappingContext<'_>, usage: &ElementUsage) -> bool {
    let port_name = &ctx.config.port_definition_name;
    ctx.element_definition(usage.element_definition)
        .is_some_and(|d| names_match(&d.name, &d.short_name, port_name, port_name))
}

fn map_usage(ctx: &mut MappingContext<'_>, block: &ElementId, usage: &ElementUsage) -> Result<(), MappingError> {
    if is_port_usage(ctx, usage) {
        let existing = ctx
            .project()
            .owned_of_kind(block, ElementKind::Port)
            .find(|p| p.name_or_empty().eq_ignore_ascii_case(&usage.name))
            .map(|p| p.id.clone());
        let port = match existing {
            Some(port) => port,
            None => ctx
                .tx
                .create(ctx.project, ElementKind::Port, &usage.name, Some(block)),
        };
        ctx.dst_ports.insert(usage.iid, port);
        return Ok(());
    }

    if ctx.dst_stack.contains(&usage.element_definition) {
        warn!(usage = %usage.name, "usage recurses into an enclosing definition; skipped");
        return Ok(());
    }
    let part_type = match map_definition(ctx, usage.element_definition, None) {
        Ok(part_type) => part_type,
        Err(err) if err.is_row_local() => {
            warn!(usage = %usage.name, error = %err, "usage definition could not be mapped; skipped");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let existing = ctx
        .project()
        .owned_of_kind(block, ElementKind::Property)
        .find(|p| p.name_or_empty().eq_ignore_ascii_case(&usage.name))
        .map(|p| p.id.clone());
    let property = match existing {
        Some(property) => property,
        None => ctx
            .tx
            .create(ctx.project, ElementKind::Property, &usage.name, Some(block)),
    };
    let retyped = ctx
        .project()
        .get(&property)
        .is_some_and(|p| p.type_ref.as_ref() != Some(&part_type));
    if retyped {
        ctx.tx
            .modify(ctx.project, &property, |p| p.type_ref = Some(part_type));
    }
    ctx.tx
        .apply_stereotype(ctx.project, &property, Stereotype::PartProperty.name());
    Ok(())
}

// ============================================================================
// PORTS
// ============================================================================

/// Turn each hub relationship between two mapped ports into an interface
/// the source requires and the target provides, realized by the target's
/// block.
fn connect_ports(ctx: &mut MappingContext<'_>) -> Result<(), MappingError> {
    let connections: Vec<(String, Iid, Iid)> = ctx
        .iteration()?
        .relationships
        .values()
        .filter(|r| ctx.dst_ports.contains_key(&r.source) && ctx.dst_ports.contains_key(&r.target))
        .map(|r| (r.name.clone(), r.source, r.target))
        .collect();

    for (name, source, target) in connections {
        let (Some(source_port), Some(target_port)) = (
            ctx.dst_ports.get(&source).cloned(),
            ctx.dst_ports.get(&target).cloned(),
        ) else {
            continue;
        };
        let end = |iid: Iid| {
            ctx.iteration()
                .ok()
                .and_then(|i| i.usage(iid))
                .map_or(InterfaceEndKind::None, |u| u.interface_end)
        };
        let (requiring, providing) =
            if end(source) == InterfaceEndKind::Output && end(target) == InterfaceEndKind::Input {
                (target_port, source_port)
            } else {
                (source_port, target_port)
            };

        let interface_name = if name.is_empty() {
            ctx.project()
                .get(&providing)
                .map(|p| p.name_or_empty().to_string())
                .unwrap_or_default()
        } else {
            name
        };
        let interface = find_or_create_interface(ctx, &interface_name);

        let requires = ctx
            .project()
            .get(&requiring)
            .is_some_and(|p| p.required_interfaces.contains(&interface));
        if !requires {
            ctx.tx.modify(ctx.project, &requiring, |p| {
                p.required_interfaces.push(interface.clone())
            });
        }
        let provides = ctx
            .project()
            .get(&providing)
            .is_some_and(|p| p.provided_interfaces.contains(&interface));
        if !provides {
            ctx.tx.modify(ctx.project, &providing, |p| {
                p.provided_interfaces.push(interface.clone())
            });
        }

        if let Some(realizer) = ctx.project().get(&providing).and_then(|p| p.owner.clone()) {
            ensure_realization(ctx, &realizer, &interface);
        }
    }
    Ok(())
}

fn find_or_create_interface(ctx: &mut MappingContext<'_>, name: &str) -> ElementId {
    let existing = ctx
        .project()
        .find_by_name(ElementKind::Interface, name)
        .next()
        .map(|i| i.id.clone());
    match existing {
        Some(interface) => interface,
        None => {
            let root = ctx.project().root_container().map(|r| r.id.clone());
            debug!(interface = %name, "created interface");
            ctx.tx
                .create(ctx.project, ElementKind::Interface, name, root.as_ref())
        }
    }
}

fn ensure_realization(ctx: &mut MappingContext<'_>, realizer: &ElementId, interface: &ElementId) {
    let exists = ctx
        .project()
        .relationships_from(realizer)
        .any(|r| r.kind == ElementKind::InterfaceRealization && r.target() == Some(interface));
    if exists {
        return;
    }
    let realization = Element::new_relationship(
        ElementId::generate(),
        ElementKind::InterfaceRealization,
        realizer,
        interface,
    );
    let id = ctx.tx.add_element(ctx.project, realization, Some(realizer));
    ctx.dst_relationships.push(id);
}
