//! State dependency resolution.
//!
//! ## Tool → hub
//!
//! ```text
//! property ──Dependency──▶ State ──▶ PossibleFiniteStateList (one per state,
//!                                     members = region names, or the state)
//!                                          │
//!             ActualFiniteStateList ◀──────┘ (cartesian product of members)
//! ```
//!
//! ## Hub → tool
//!
//! Each possible list of a parameter's state dependence becomes a tool
//! state with a dependency from the property. The state's regions are
//! reconciled against the list members; region changes are staged on the
//! tool transaction and applied by the engine once the pass succeeds.

use tracing::{debug, trace, warn};

use crate::base::{names_match, short_name};
use crate::hub::{ActualFiniteState, ActualFiniteStateList, Iid, PossibleFiniteState, PossibleFiniteStateList};
use crate::tool::{ChangeKind, Element, ElementId, ElementKind, Project};

use super::context::MappingContext;
use super::error::MappingError;

// ============================================================================
// PURE ALGORITHMS
// ============================================================================

/// Every combination taking one member from each list, in list-then-member
/// order.
///
/// ```ignore
/// // [[a, b, c], [x, y]] → [a,x] [a,y] [b,x] [b,y] [c,x] [c,y]
/// ```
pub fn cartesian_product<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    let mut combinations: Vec<Vec<T>> = vec![Vec::new()];
    for members in lists {
        combinations = combinations
            .iter()
            .flat_map(|partial| {
                members.iter().map(move |member| {
                    let mut next = partial.clone();
                    next.push(member.clone());
                    next
                })
            })
            .collect();
    }
    combinations
}

/// Make a list's members match `names` position by position: rename in
/// place, append what is missing, drop what is beyond.
pub fn reconcile_possible_states(list: &mut PossibleFiniteStateList, names: &[String]) {
    for (index, name) in names.iter().enumerate() {
        match list.possible_states.get_mut(index) {
            Some(existing) => {
                if existing.name != *name {
                    existing.name = name.clone();
                    existing.short_name = short_name(name);
                }
            }
            None => list
                .possible_states
                .push(PossibleFiniteState::new(name.clone(), short_name(name))),
        }
    }
    list.possible_states.truncate(names.len());

    let default_is_member = list
        .default_state
        .is_some_and(|d| list.state(d).is_some());
    if !default_is_member {
        list.default_state = list.possible_states.first().map(|s| s.iid);
    }
}

/// Replace the list's possible lists and regenerate its actual states.
///
/// A combination equal to an existing actual state keeps that state.
pub fn regenerate_actual_states(
    list: &mut ActualFiniteStateList,
    possible_lists: &[Iid],
    members: &[Vec<Iid>],
) {
    list.possible_finite_state_lists.clear();
    list.possible_finite_state_lists
        .extend_from_slice(possible_lists);

    let previous = std::mem::take(&mut list.actual_states);
    list.actual_states = cartesian_product(members)
        .into_iter()
        .map(|combination| {
            previous
                .iter()
                .find(|s| s.possible_states == combination)
                .cloned()
                .unwrap_or_else(|| ActualFiniteState::new(combination))
        })
        .collect();
}

/// Region changes that make a state's regions match a list's member names.
pub fn plan_region_changes(
    state_name: &str,
    regions: &[Element],
    names: &[&str],
) -> Vec<(Element, ChangeKind)> {
    fn same(a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
    fn new_region(name: &str) -> (Element, ChangeKind) {
        (
            Element::new(ElementId::generate(), ElementKind::Region).with_name(name),
            ChangeKind::Create,
        )
    }
    let mut changes = Vec::new();

    match names {
        [] => {}
        [single] if same(single, state_name) => {
            changes.extend(regions.iter().map(|r| (r.clone(), ChangeKind::Delete)));
        }
        [single] => {
            let mut kept = false;
            for region in regions {
                if same(region.name_or_empty(), single) {
                    kept = true;
                } else {
                    changes.push((region.clone(), ChangeKind::Delete));
                }
            }
            if !kept {
                changes.push(new_region(single));
            }
        }
        many => {
            let mut surviving: Vec<&str> = Vec::new();
            for region in regions {
                if many.iter().any(|n| same(region.name_or_empty(), n)) {
                    surviving.push(region.name_or_empty());
                } else {
                    changes.push((region.clone(), ChangeKind::Delete));
                }
            }
            for name in many {
                if !surviving.iter().any(|s| same(s, name)) {
                    changes.push(new_region(name));
                }
            }
        }
    }
    changes
}

// ============================================================================
// TOOL → HUB
// ============================================================================

/// States a property depends on, in relationship order.
pub fn dependency_states(project: &Project, property: &ElementId) -> Vec<ElementId> {
    let mut states: Vec<ElementId> = Vec::new();
    for relationship in project.relationships_from(property) {
        if relationship.kind != ElementKind::Dependency {
            continue;
        }
        let Some(target) = relationship.target() else {
            continue;
        };
        let is_state = project
            .get(target)
            .is_some_and(|t| t.kind == ElementKind::State);
        if is_state && !states.contains(target) {
            states.push(target.clone());
        }
    }
    states
}

/// Member names of the partition a state stands for: its region names, or
/// the state itself when it has no regions.
pub fn partition_names(project: &Project, state: &ElementId) -> Vec<String> {
    let regions: Vec<String> = project
        .owned_of_kind(state, ElementKind::Region)
        .map(|r| r.name_or_empty().trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    if !regions.is_empty() {
        return regions;
    }
    project
        .get(state)
        .map(|s| vec![s.name_or_empty().to_string()])
        .unwrap_or_default()
}

/// Resolve the actual finite state list a property's values depend on.
///
/// Returns `None` when the property depends on no state.
pub fn map_state_dependencies(
    ctx: &mut MappingContext<'_>,
    property: &Element,
) -> Result<Option<Iid>, MappingError> {
    let states = dependency_states(ctx.project(), &property.id);
    if states.is_empty() {
        return Ok(None);
    }
    let domain = ctx.domain()?;

    let mut lists: Vec<Iid> = Vec::new();
    for state in &states {
        let list = resolve_possible_list(ctx, state, domain)?;
        if !lists.contains(&list) {
            lists.push(list);
        }
    }
    resolve_actual_list(ctx, &lists, domain).map(Some)
}

fn resolve_possible_list(
    ctx: &mut MappingContext<'_>,
    state: &ElementId,
    domain: Iid,
) -> Result<Iid, MappingError> {
    let name = ctx
        .project()
        .get(state)
        .map(|s| s.name_or_empty().to_string())
        .ok_or_else(|| MappingError::MissingToolElement(state.clone()))?;
    let short = short_name(&name);
    let names = partition_names(ctx.project(), state);

    let in_pass = ctx
        .possible_lists
        .values()
        .find(|l| names_match(&l.name, &l.short_name, &name, &short))
        .map(|l| l.iid);
    let persisted = || {
        ctx.iteration()
            .ok()
            .and_then(|i| i.possible_list_named(&name, &short))
            .map(|l| l.iid)
    };
    let found = in_pass.or_else(persisted);

    let iid = match found {
        Some(iid) => {
            trace!(state = %name, "reusing possible finite state list");
            iid
        }
        None => {
            debug!(state = %name, "creating possible finite state list");
            ctx.add_possible_list(PossibleFiniteStateList::new(name.clone(), short, domain))
        }
    };
    let list = ctx
        .checkout_possible_list(iid)
        .ok_or(MappingError::MissingHubThing(iid))?;
    reconcile_possible_states(list, &names);
    Ok(iid)
}

fn resolve_actual_list(
    ctx: &mut MappingContext<'_>,
    lists: &[Iid],
    domain: Iid,
) -> Result<Iid, MappingError> {
    let found = ctx
        .actual_lists
        .values()
        .find(|l| l.combines(lists))
        .map(|l| l.iid)
        .or_else(|| {
            ctx.iteration()
                .ok()
                .and_then(|i| i.actual_list_combining(lists))
                .map(|l| l.iid)
        });
    let iid = match found {
        Some(iid) => iid,
        None => ctx.add_actual_list(ActualFiniteStateList::new(domain)),
    };

    let members: Vec<Vec<Iid>> = lists
        .iter()
        .map(|l| {
            ctx.possible_list(*l)
                .map(|p| p.possible_states.iter().map(|s| s.iid).collect())
                .unwrap_or_default()
        })
        .collect();
    let list = ctx
        .checkout_actual_list(iid)
        .ok_or(MappingError::MissingHubThing(iid))?;
    regenerate_actual_states(list, lists, &members);
    debug!(
        lists = lists.len(),
        actual_states = list.actual_states.len(),
        "actual finite states regenerated"
    );
    Ok(iid)
}

// ============================================================================
// HUB → TOOL
// ============================================================================

/// Give a property a state (and regions) per possible list of `actual_list`.
pub fn map_state_dependence_to_dst(
    ctx: &mut MappingContext<'_>,
    property: &ElementId,
    actual_list: Iid,
) -> Result<(), MappingError> {
    let lists = ctx
        .actual_list(actual_list)
        .map(|l| l.possible_finite_state_lists.clone())
        .ok_or(MappingError::MissingHubThing(actual_list))?;

    for list_iid in lists {
        let Some(list) = ctx.possible_list(list_iid).cloned() else {
            warn!(list = %list_iid, "possible finite state list not found; skipped");
            continue;
        };
        let state = find_or_create_state(ctx, &list);
        ensure_dependency(ctx, property, &state);
        stage_regions(ctx, &state, &list);
    }
    Ok(())
}

fn is_in_state_machine(project: &Project, id: &ElementId) -> bool {
    project
        .ancestors(id)
        .iter()
        .any(|a| a.kind == ElementKind::StateMachine)
}

fn find_or_create_state(ctx: &mut MappingContext<'_>, list: &PossibleFiniteStateList) -> ElementId {
    let existing = ctx
        .project()
        .find_by_kind(ElementKind::State)
        .find(|s| {
            let name = s.name_or_empty();
            names_match(name, &short_name(name), &list.name, &list.short_name)
                && is_in_state_machine(ctx.project(), &s.id)
        })
        .map(|s| s.id.clone());
    if let Some(existing) = existing {
        return existing;
    }

    let key = list.name.to_ascii_lowercase();
    if let Some(created) = ctx.created_states.get(&key) {
        return created.clone();
    }

    let region = state_machine_region(ctx);
    let state = ctx
        .tx
        .create(ctx.project, ElementKind::State, &list.name, Some(&region));
    debug!(state = %list.name, "created state");
    ctx.created_states.insert(key, state.clone());
    state
}

/// The region new states are created in.
fn state_machine_region(ctx: &mut MappingContext<'_>) -> ElementId {
    if let Some(region) = &ctx.state_region {
        return region.clone();
    }
    let machine = ctx
        .project()
        .find_by_kind(ElementKind::StateMachine)
        .next()
        .map(|m| m.id.clone());
    let machine = match machine {
        Some(machine) => machine,
        None => {
            let root = ctx.project().root_container().map(|r| r.id.clone());
            ctx.tx
                .create(ctx.project, ElementKind::StateMachine, "StateMachine", root.as_ref())
        }
    };
    let region = ctx
        .project()
        .owned_of_kind(&machine, ElementKind::Region)
        .next()
        .map(|r| r.id.clone());
    let region = match region {
        Some(region) => region,
        None => ctx
            .tx
            .create(ctx.project, ElementKind::Region, "Region", Some(&machine)),
    };
    ctx.state_region = Some(region.clone());
    region
}

fn ensure_dependency(ctx: &mut MappingContext<'_>, property: &ElementId, state: &ElementId) {
    let exists = ctx.project().relationships_from(property).any(|r| {
        r.kind == ElementKind::Dependency && r.target() == Some(state)
    });
    if exists {
        return;
    }
    let owner = ctx.project().get(property).and_then(|p| p.owner.clone());
    let dependency = Element::new_relationship(
        ElementId::generate(),
        ElementKind::Dependency,
        property.clone(),
        state.clone(),
    );
    let id = ctx.tx.add_element(ctx.project, dependency, owner.as_ref());
    ctx.dst_relationships.push(id);
}

fn stage_regions(ctx: &mut MappingContext<'_>, state: &ElementId, list: &PossibleFiniteStateList) {
    if !ctx.tx.get_modified_regions(state).is_empty() {
        return;
    }
    let Some(state_name) = ctx.project().get(state).map(|s| s.name_or_empty().to_string()) else {
        return;
    };
    let regions: Vec<Element> = ctx
        .project()
        .owned_of_kind(state, ElementKind::Region)
        .cloned()
        .collect();
    let names: Vec<&str> = list.possible_states.iter().map(|s| s.name.as_str()).collect();
    for (region, change) in plan_region_changes(&state_name, &regions, &names) {
        trace!(state = %state_name, region = region.name_or_empty(), ?change, "staging region");
        ctx.tx.stage_region(state, region, change);
    }
}
