//! Directed tool relationships to and from hub binary relationships.
//!
//! Both rules work over rows mapped by earlier passes and relate only
//! elements that both have a row. A relationship is the same relationship
//! when it has the same source, target and categories; the tool side
//! compares source, target and [`DirectedRelationshipKind`].

use tracing::{debug, trace};

use crate::hub::{BinaryRelationship, ClassKind, Iid};
use crate::tool::{Element, ElementId, ElementKind, Stereotype};

use super::category::{category_names, resolve_or_create_category};
use super::context::MappingContext;
use super::engine::MappingRule;
use super::error::MappingError;
use super::rows::{MappedElementRow, PendingDirected};

/// The directed relationship kinds, in matching order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectedRelationshipKind {
    Satisfy,
    Verify,
    Refine,
    DeriveReqt,
    Copy,
    Allocate,
    Trace,
    Abstraction,
    Dependency,
}

impl DirectedRelationshipKind {
    /// Every kind. A hub relationship carrying several matching categories
    /// takes the first kind listed here.
    pub const ALL: [Self; 9] = [
        Self::Satisfy,
        Self::Verify,
        Self::Refine,
        Self::DeriveReqt,
        Self::Copy,
        Self::Allocate,
        Self::Trace,
        Self::Abstraction,
        Self::Dependency,
    ];

    /// Name of the hub category standing for this kind.
    pub fn category_name(&self) -> &'static str {
        match self {
            Self::Satisfy => "satisfy",
            Self::Verify => "verify",
            Self::Refine => "refine",
            Self::DeriveReqt => "deriveReqt",
            Self::Copy => "copy",
            Self::Allocate => "allocate",
            Self::Trace => "trace",
            Self::Abstraction => "abstraction",
            Self::Dependency => "dependency",
        }
    }

    /// The stereotype applied to the tool relationship, if any.
    pub fn stereotype(&self) -> Option<Stereotype> {
        match self {
            Self::Satisfy => Some(Stereotype::Satisfy),
            Self::Verify => Some(Stereotype::Verify),
            Self::Refine => Some(Stereotype::Refine),
            Self::DeriveReqt => Some(Stereotype::DeriveReqt),
            Self::Copy => Some(Stereotype::Copy),
            Self::Allocate => Some(Stereotype::Allocate),
            Self::Trace => Some(Stereotype::Trace),
            Self::Abstraction | Self::Dependency => None,
        }
    }

    /// The metatype of the tool relationship.
    pub fn element_kind(&self) -> ElementKind {
        match self {
            Self::Dependency => ElementKind::Dependency,
            _ => ElementKind::Abstraction,
        }
    }

    /// The kind of a tool relationship: its first stereotype in matching
    /// order, else its metatype.
    pub fn of_element(element: &Element) -> Option<Self> {
        match element.kind {
            ElementKind::Dependency | ElementKind::Abstraction => {}
            _ => return None,
        }
        let stereotyped = Self::ALL.into_iter().find(|kind| {
            kind.stereotype()
                .is_some_and(|s| element.has_stereotype_named(s.name()))
        });
        Some(stereotyped.unwrap_or(match element.kind {
            ElementKind::Dependency => Self::Dependency,
            _ => Self::Abstraction,
        }))
    }

    /// The kind for a set of category names, `Trace` when none matches.
    pub fn from_category_names(names: &[String]) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| {
                names
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(kind.category_name()))
            })
            .unwrap_or(Self::Trace)
    }
}

impl std::fmt::Display for DirectedRelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.category_name())
    }
}

fn row_for_element(rows: &[MappedElementRow], element: &ElementId) -> Option<Iid> {
    rows.iter().find(|r| &r.dst == element).map(|r| r.hub_iid())
}

fn row_for_iid(rows: &[MappedElementRow], iid: Iid) -> Option<&ElementId> {
    rows.iter().find(|r| r.hub_iid() == iid).map(|r| &r.dst)
}

// ============================================================================
// TOOL → HUB
// ============================================================================

/// Maps dependencies and abstractions between mapped rows to hub binary
/// relationships, classified by kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectedToBinaryRelationshipRule;

impl MappingRule for DirectedToBinaryRelationshipRule {
    type Input = Vec<MappedElementRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        let domain = ctx.ensure_ready()?;

        for row in &input {
            let source = row.hub_iid();
            let relationships: Vec<(String, ElementId, DirectedRelationshipKind)> = ctx
                .project()
                .relationships_from(&row.dst)
                .filter_map(|r| {
                    let kind = DirectedRelationshipKind::of_element(r)?;
                    Some((r.name_or_empty().to_string(), r.target()?.clone(), kind))
                })
                .collect();

            for (name, target, kind) in relationships {
                let Some(target) = row_for_element(&input, &target) else {
                    trace!(row = %row.dst, "relationship target has no row; skipped");
                    continue;
                };
                let categories: Vec<Iid> = resolve_or_create_category(
                    ctx,
                    kind.category_name(),
                    &[ClassKind::BinaryRelationship],
                )
                .map(|c| vec![c.iid])
                .unwrap_or_default();

                let name = if name.is_empty() {
                    kind.category_name().to_string()
                } else {
                    name
                };
                let mut relationship = BinaryRelationship::new(name, source, target, domain);
                relationship.categories = categories;
                if ctx.add_relationship(relationship) {
                    debug!(kind = %kind, "binary relationship created");
                }
            }
        }
        Ok(Vec::new())
    }
}

// ============================================================================
// HUB → TOOL
// ============================================================================

/// Maps hub binary relationships between mapped rows to directed tool
/// relationships.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryToDirectedRelationshipRule;

impl MappingRule for BinaryToDirectedRelationshipRule {
    type Input = Vec<MappedElementRow>;

    fn transform(
        &self,
        ctx: &mut MappingContext<'_>,
        input: Self::Input,
    ) -> Result<Vec<MappedElementRow>, MappingError> {
        ctx.ensure_ready()?;

        for row in &input {
            let relationships: Vec<BinaryRelationship> = ctx
                .iteration()?
                .relationships_from(row.hub_iid())
                .cloned()
                .collect();

            for relationship in relationships {
                let Some(target) = row_for_iid(&input, relationship.target).cloned() else {
                    continue;
                };
                let names = category_names(ctx, &relationship.categories);
                let kind = DirectedRelationshipKind::from_category_names(&names);
                create_directed(ctx, &row.dst, &target, kind, &relationship.name);
            }
        }
        Ok(Vec::new())
    }
}

/// Whether the tool already relates source to target with this kind.
fn directed_exists(
    ctx: &MappingContext<'_>,
    source: &ElementId,
    target: &ElementId,
    kind: DirectedRelationshipKind,
) -> bool {
    ctx.project()
        .relationships_from(source)
        .any(|r| r.target() == Some(target) && DirectedRelationshipKind::of_element(r) == Some(kind))
        || ctx.pending().has_directed(source, target, kind)
        || ctx.new_pending.has_directed(source, target, kind)
}

fn create_directed(
    ctx: &mut MappingContext<'_>,
    source: &ElementId,
    target: &ElementId,
    kind: DirectedRelationshipKind,
    name: &str,
) {
    if directed_exists(ctx, source, target, kind) {
        trace!(source = %source, target = %target, kind = %kind, "directed relationship already present");
        return;
    }
    let owner = ctx
        .project()
        .get(source)
        .and_then(|e| e.owner.clone())
        .or_else(|| ctx.project().root_container().map(|r| r.id.clone()));

    let mut element = Element::new_relationship(ElementId::generate(), kind.element_kind(), source, target);
    if !name.is_empty() {
        element = element.with_name(name);
    }
    if let Some(stereotype) = kind.stereotype() {
        element = element.with_stereotype(stereotype.name());
    }
    let id = ctx.tx.add_element(ctx.project, element, owner.as_ref());
    debug!(source = %source, target = %target, kind = %kind, "directed relationship created");

    ctx.dst_relationships.push(id);
    ctx.new_pending.directed.push(PendingDirected {
        source: source.clone(),
        target: target.clone(),
        kind,
    });
}
