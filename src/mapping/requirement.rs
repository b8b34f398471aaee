//! Requirements and their package nesting.
//!
//! ```text
//! Model                          (never a specification)
//! └── Root        ──▶ RequirementsSpecification "Root"
//!     └── P1      ──▶   RequirementsGroup "P1"
//!         └── P2  ──▶     RequirementsGroup "P2"
//!             └── Req_1 ──▶ Requirement, group = P2
//! ```
//!
//! The specification is the outermost package that owns no requirement
//! directly; when every package does, it is the requirement's own package.
//! Every package below it becomes one group, reused by name within the
//! specification.

use tracing::{debug, trace};

use crate::base::{is_blank, names_match, short_name};
use crate::hub::{
    ClassKind, Definition, Iid, Requirement, RequirementsGroup, RequirementsSpecification,
};
use crate::tool::stereotypes::does_it_have_the_stereotype;
use crate::tool::{Element, ElementId, ElementKind, Project, Stereotype};

use super::category::{category_names, resolve_or_create_category};
use super::context::MappingContext;
use super::engine::{MappingRule, skip_row_local};
use super::error::MappingError;
use super::rows::{
    DstRow, HubRow, MappedElementRow, MappedRowStatus, MappedThing, MappingDirection,
};

/// Requirement stereotypes carried over as hub categories.
pub const REQUIREMENT_KINDS: [Stereotype; 5] = [
    Stereotype::FunctionalRequirement,
    Stereotype::InterfaceRequirement,
    Stereotype::PerformanceRequirement,
    Stereotype::PhysicalRequirement,
    Stereotype::DesignConstraint,
];

fn owns_requirement(project: &Project, package: &ElementId) -> bool {
    project
        .owned_of_kind(package, ElementKind::Requirement)
        .next()
        .is_some()
}

/// Split a requirement's package chain into its specification package and
/// the packages that become groups, outermost first.
pub fn specification_packages<'p>(
    project: &'p Project,
    requirement: &ElementId,
) -> Option<(&'p Element, Vec<&'p Element>)> {
    let packages: Vec<&Element> = project
        .ancestors(requirement)
        .into_iter()
        .filter(|a| a.kind == ElementKind::Package)
        .collect();
    let last = packages.len().checked_sub(1)?;
    let index = packages
        .iter()
        .position(|p| !owns_requirement(project, &p.id))
        .unwrap_or(last);
    Some((packages[index], packages[index + 1..].to_vec()))
}

// ============================================================================
// TOOL → HUB
// ============================================================================

/// Maps tool requirements into hub requirements specifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequirementToHubRule;

impl MappingRule for RequirementToHubRule {
    type Input = Vec<DstRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        let domain = ctx.ensure_ready()?;
        let mut rows = Vec::new();
        for row in &input {
            let result = map_requirement(ctx, row, domain).map(|mapped| rows.push(mapped));
            skip_row_local(row.dst.as_str(), result)?;
        }
        Ok(rows)
    }
}

/// What the tool says about a requirement, read before the hub side is
/// checked out.
struct ToolRequirement {
    name: String,
    short_name: String,
    text: Option<String>,
    categories: Vec<Iid>,
    recorded: Option<Iid>,
}

fn read_tool_requirement(
    ctx: &mut MappingContext<'_>,
    element: &Element,
    hint: Option<Iid>,
) -> ToolRequirement {
    let name = element.name_or_empty().to_string();
    let id = ctx.transaction().requirement_id(ctx.project(), &element.id);
    let short = match id {
        Some(id) if !is_blank(Some(id)) => short_name(id),
        _ => short_name(&name),
    };
    let text = ctx
        .transaction()
        .requirement_text(ctx.project(), &element.id)
        .map(str::to_string);
    let recorded = hint.or_else(|| ctx.identifiers.get_internal(&element.id));

    let mut categories = Vec::new();
    for kind in REQUIREMENT_KINDS {
        if does_it_have_the_stereotype(element, kind) {
            if let Some(category) = resolve_or_create_category(ctx, kind.name(), &[ClassKind::Requirement]) {
                categories.push(category.iid);
            }
        }
    }

    ToolRequirement {
        name,
        short_name: short,
        text,
        categories,
        recorded,
    }
}

fn find_or_create_specification(ctx: &mut MappingContext<'_>, package: &Element, domain: Iid) -> Result<Iid, MappingError> {
    let name = package.name_or_empty();
    let short = short_name(name);

    let in_pass = ctx
        .specifications
        .values()
        .find(|s| names_match(&s.name, &s.short_name, name, &short))
        .map(|s| s.iid);
    if let Some(iid) = in_pass {
        return Ok(iid);
    }
    let persisted = ctx
        .iteration()?
        .specification_named(name, &short)
        .map(|s| s.iid);
    if let Some(iid) = persisted {
        return Ok(iid);
    }
    debug!(specification = %name, "creating requirements specification");
    Ok(ctx.add_specification(RequirementsSpecification::new(name, short, domain)))
}

fn map_requirement(ctx: &mut MappingContext<'_>, row: &DstRow, domain: Iid) -> Result<MappedElementRow, MappingError> {
    let element = ctx
        .project()
        .get(&row.dst)
        .cloned()
        .ok_or_else(|| MappingError::MissingToolElement(row.dst.clone()))?;
    if element.kind != ElementKind::Requirement {
        return Err(MappingError::invalid(format!(
            "'{}' is not a requirement",
            element.name_or_empty()
        )));
    }

    let (specification_package, group_packages) = specification_packages(ctx.project(), &element.id)
        .map(|(s, g)| (s.clone(), g.into_iter().cloned().collect::<Vec<_>>()))
        .ok_or_else(|| {
            MappingError::UnresolvedRequirementContainer(element.name_or_empty().to_string())
        })?;

    let tool = read_tool_requirement(ctx, &element, row.hub);
    let language = ctx.config.language_code.clone();
    let specification_iid = find_or_create_specification(ctx, &specification_package, domain)?;
    let specification = ctx
        .checkout_specification(specification_iid)
        .ok_or(MappingError::MissingHubThing(specification_iid))?;

    let mut parent = None;
    for package in &group_packages {
        let name = package.name_or_empty();
        let short = short_name(name);
        let groups = specification
            .child_groups_mut(parent)
            .ok_or(MappingError::MissingHubThing(specification_iid))?;
        let group = match groups
            .iter()
            .find(|g| names_match(&g.name, &g.short_name, name, &short))
        {
            Some(group) => group.iid,
            None => {
                trace!(group = %name, "creating requirements group");
                let group = RequirementsGroup::new(name, short, domain);
                let iid = group.iid;
                groups.push(group);
                iid
            }
        };
        parent = Some(group);
    }

    let index = specification
        .requirements
        .iter()
        .position(|r| Some(r.iid) == tool.recorded)
        .or_else(|| {
            specification
                .requirements
                .iter()
                .position(|r| names_match(&r.name, &r.short_name, &tool.name, &tool.short_name))
        });
    let status = if index.is_some() {
        MappedRowStatus::Existing
    } else {
        MappedRowStatus::New
    };
    let requirement = match index {
        Some(index) => &mut specification.requirements[index],
        None => {
            debug!(requirement = %tool.name, "creating requirement");
            specification
                .requirements
                .push(Requirement::new(tool.name.as_str(), tool.short_name.as_str(), domain));
            let last = specification.requirements.len() - 1;
            &mut specification.requirements[last]
        }
    };

    requirement.name = tool.name;
    requirement.short_name = tool.short_name;
    requirement.group = parent;
    for category in tool.categories {
        crate::hub::things::add_category(&mut requirement.categories, category);
    }
    if let Some(text) = tool.text {
        set_definition(&mut requirement.definitions, &language, text);
    }

    Ok(MappedElementRow {
        hub: MappedThing::Requirement(requirement.clone()),
        dst: element.id,
        direction: MappingDirection::FromDstToHub,
        status,
    })
}

/// Keep exactly one definition in `language`, holding `content`.
pub fn set_definition(definitions: &mut Vec<Definition>, language: &str, content: String) {
    match definitions.iter().position(|d| d.language_code == language) {
        Some(index) => {
            let kept = definitions[index].iid;
            definitions.retain(|d| d.language_code != language || d.iid == kept);
            if let Some(definition) = definitions.iter_mut().find(|d| d.iid == kept) {
                if definition.content != content {
                    let mut replacement = definition.clone();
                    replacement.content = content;
                    *definition = replacement;
                }
            }
        }
        None => definitions.push(Definition::new(language, content)),
    }
}

// ============================================================================
// HUB → TOOL
// ============================================================================

/// Maps hub requirements to tool requirements nested in packages mirroring
/// their specification and groups.
#[derive(Clone, Copy, Debug, Default)]
pub struct HubRequirementToDstRule;

impl MappingRule for HubRequirementToDstRule {
    type Input = Vec<HubRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        ctx.ensure_ready()?;
        let mut rows = Vec::new();
        for row in &input {
            let result = map_hub_requirement(ctx, row).map(|mapped| rows.push(mapped));
            skip_row_local(&row.hub.to_string(), result)?;
        }
        Ok(rows)
    }
}

fn locate_requirement(ctx: &MappingContext<'_>, iid: Iid) -> Option<(RequirementsSpecification, Requirement)> {
    ctx.specifications
        .values()
        .find_map(|s| s.requirement(iid).map(|r| (s.clone(), r.clone())))
        .or_else(|| {
            ctx.iteration()
                .ok()?
                .requirement(iid)
                .map(|(s, r)| (s.clone(), r.clone()))
        })
}

fn find_or_create_package(ctx: &mut MappingContext<'_>, parent: Option<&ElementId>, name: &str) -> ElementId {
    let key = (parent.cloned(), name.to_ascii_lowercase());
    if let Some(package) = ctx.created_packages.get(&key) {
        return package.clone();
    }
    let existing = match parent {
        Some(parent) => ctx
            .project()
            .owned_of_kind(parent, ElementKind::Package)
            .find(|p| p.name_or_empty().eq_ignore_ascii_case(name))
            .map(|p| p.id.clone()),
        None => ctx
            .project()
            .iter_roots()
            .find(|p| p.kind == ElementKind::Package && p.name_or_empty().eq_ignore_ascii_case(name))
            .map(|p| p.id.clone()),
    };
    let package = match existing {
        Some(package) => package,
        None => {
            trace!(package = %name, "creating package");
            ctx.tx.create(ctx.project, ElementKind::Package, name, parent)
        }
    };
    ctx.created_packages.insert(key, package.clone());
    package
}

fn find_requirement_element(
    ctx: &MappingContext<'_>,
    requirement: &Requirement,
    hint: Option<&ElementId>,
) -> Option<ElementId> {
    let is_requirement = |id: &&ElementId| {
        ctx.project()
            .get(id)
            .is_some_and(|e| e.kind == ElementKind::Requirement)
    };
    hint.filter(is_requirement)
        .or_else(|| {
            ctx.identifiers
                .get_external(requirement.iid)
                .filter(is_requirement)
        })
        .cloned()
        .or_else(|| {
            ctx.project()
                .find_by_kind(ElementKind::Requirement)
                .find(|e| {
                    let id = ctx.transaction().requirement_id(ctx.project(), &e.id);
                    id.is_some_and(|id| short_name(id).eq_ignore_ascii_case(&requirement.short_name))
                        || e.name_or_empty().eq_ignore_ascii_case(&requirement.name)
                })
                .map(|e| e.id.clone())
        })
}

fn map_hub_requirement(ctx: &mut MappingContext<'_>, row: &HubRow) -> Result<MappedElementRow, MappingError> {
    let (specification, requirement) =
        locate_requirement(ctx, row.hub).ok_or(MappingError::MissingHubThing(row.hub))?;

    let root = ctx.project().root_container().map(|r| r.id.clone());
    let mut package = find_or_create_package(ctx, root.as_ref(), &specification.name);
    if let Some(group) = requirement.group {
        let path: Vec<String> = specification
            .group_path(group)
            .iter()
            .map(|g| g.name.clone())
            .collect();
        for name in path {
            package = find_or_create_package(ctx, Some(&package), &name);
        }
    }

    let element = match find_requirement_element(ctx, &requirement, row.dst.as_ref()) {
        Some(element) => {
            ctx.tx.reparent(ctx.project, &element, &package);
            element
        }
        None => {
            debug!(requirement = %requirement.name, "creating tool requirement");
            ctx.tx
                .create(ctx.project, ElementKind::Requirement, &requirement.name, Some(&package))
        }
    };
    ctx.tx
        .apply_stereotype(ctx.project, &element, Stereotype::Requirement.name());

    let renamed = ctx
        .project()
        .get(&element)
        .is_some_and(|e| e.name_or_empty() != requirement.name);
    if renamed {
        ctx.tx.rename(ctx.project, &element, &requirement.name);
    }
    let id_matches = ctx
        .transaction()
        .requirement_id(ctx.project(), &element)
        .is_some_and(|id| short_name(id).eq_ignore_ascii_case(&requirement.short_name));
    if !id_matches {
        ctx.tx
            .set_requirement_id(ctx.project, &element, &requirement.short_name);
    }
    let language = ctx.config.language_code.clone();
    if let Some(definition) = requirement.definition(&language) {
        ctx.tx
            .set_requirement_text(ctx.project, &element, &definition.content);
    }

    let names = category_names(ctx, &requirement.categories);
    for kind in REQUIREMENT_KINDS {
        if names.iter().any(|n| n.eq_ignore_ascii_case(kind.name())) {
            ctx.tx.apply_stereotype(ctx.project, &element, kind.name());
        }
    }

    let status = if ctx.transaction().is_created(&element) {
        MappedRowStatus::New
    } else {
        MappedRowStatus::Existing
    };
    Ok(MappedElementRow {
        hub: MappedThing::Requirement(requirement),
        dst: element,
        direction: MappingDirection::FromHubToDst,
        status,
    })
}
