//! Rows handed between the engine and the rules.

use crate::hub::{
    ActualFiniteStateList, BinaryRelationship, ElementDefinition, Iid, PossibleFiniteStateList,
    Requirement, RequirementsSpecification, Thing, Transaction,
};
use crate::tool::ElementId;

use super::relationship::DirectedRelationshipKind;

// ============================================================================
// ROWS
// ============================================================================

/// Which way a row was mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingDirection {
    FromDstToHub,
    FromHubToDst,
}

/// Whether the counterpart of a row was created by the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MappedRowStatus {
    New,
    Existing,
}

/// The hub side of a mapped row.
#[derive(Clone, Debug, PartialEq)]
pub enum MappedThing {
    ElementDefinition(ElementDefinition),
    Requirement(Requirement),
}

impl MappedThing {
    pub fn iid(&self) -> Iid {
        match self {
            Self::ElementDefinition(t) => t.iid,
            Self::Requirement(t) => t.iid,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ElementDefinition(t) => &t.name,
            Self::Requirement(t) => &t.name,
        }
    }
}

/// A hub thing paired with a tool element.
///
/// Identity is the tool element plus the direction.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedElementRow {
    pub hub: MappedThing,
    pub dst: ElementId,
    pub direction: MappingDirection,
    pub status: MappedRowStatus,
}

impl MappedElementRow {
    pub fn key(&self) -> (&ElementId, MappingDirection) {
        (&self.dst, self.direction)
    }

    pub fn hub_iid(&self) -> Iid {
        self.hub.iid()
    }
}

/// A tool element to map to the hub, with an optional known counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DstRow {
    pub dst: ElementId,
    pub hub: Option<Iid>,
}

impl DstRow {
    pub fn new(dst: impl Into<ElementId>) -> Self {
        Self {
            dst: dst.into(),
            hub: None,
        }
    }

    pub fn with_hub(mut self, hub: Iid) -> Self {
        self.hub = Some(hub);
        self
    }
}

/// A hub thing to map to the tool, with an optional known counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubRow {
    pub hub: Iid,
    pub dst: Option<ElementId>,
}

impl HubRow {
    pub fn new(hub: Iid) -> Self {
        Self { hub, dst: None }
    }

    pub fn with_dst(mut self, dst: impl Into<ElementId>) -> Self {
        self.dst = Some(dst.into());
        self
    }
}

// ============================================================================
// EXTERNAL IDENTIFIERS
// ============================================================================

/// One recorded correspondence.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalIdentifier {
    pub internal: Iid,
    pub external: ElementId,
    pub direction: MappingDirection,
}

/// Correspondences between hub identifiers and tool identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalIdentifierMap {
    entries: Vec<ExternalIdentifier>,
}

impl ExternalIdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a correspondence, replacing any for the same tool element and
    /// direction.
    pub fn add(&mut self, internal: Iid, external: ElementId, direction: MappingDirection) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.external == external && e.direction == direction)
        {
            Some(entry) => entry.internal = internal,
            None => self.entries.push(ExternalIdentifier {
                internal,
                external,
                direction,
            }),
        }
    }

    /// The hub identifier recorded for a tool element.
    pub fn get_internal(&self, external: &ElementId) -> Option<Iid> {
        self.entries
            .iter()
            .find(|e| &e.external == external)
            .map(|e| e.internal)
    }

    /// The tool identifier recorded for a hub thing.
    pub fn get_external(&self, internal: Iid) -> Option<&ElementId> {
        self.entries
            .iter()
            .find(|e| e.internal == internal)
            .map(|e| &e.external)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalIdentifier> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// PENDING RELATIONSHIPS
// ============================================================================

/// A tool relationship created by an earlier pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDirected {
    pub source: ElementId,
    pub target: ElementId,
    pub kind: DirectedRelationshipKind,
}

/// Relationships created but not yet transferred.
#[derive(Clone, Debug, Default)]
pub struct PendingRegistry {
    pub relationships: Vec<BinaryRelationship>,
    pub directed: Vec<PendingDirected>,
}

impl PendingRegistry {
    /// A hub relationship with this identity is pending.
    pub fn has_relationship(&self, source: Iid, target: Iid, categories: &[Iid]) -> bool {
        self.relationships
            .iter()
            .any(|r| r.connects(source, target, categories))
    }

    /// A tool relationship with this identity is pending.
    pub fn has_directed(
        &self,
        source: &ElementId,
        target: &ElementId,
        kind: DirectedRelationshipKind,
    ) -> bool {
        self.directed
            .iter()
            .any(|d| &d.source == source && &d.target == target && d.kind == kind)
    }

    /// Fold another registry into this one.
    pub fn extend(&mut self, other: PendingRegistry) {
        self.relationships.extend(other.relationships);
        self.directed.extend(other.directed);
    }

    pub fn clear(&mut self) {
        self.relationships.clear();
        self.directed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty() && self.directed.is_empty()
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Everything one transform produced.
#[derive(Clone, Debug, Default)]
pub struct MappingOutput {
    pub rows: Vec<MappedElementRow>,
    /// Every element definition the pass created or changed.
    pub element_definitions: Vec<ElementDefinition>,
    pub requirements_specifications: Vec<RequirementsSpecification>,
    pub relationships: Vec<BinaryRelationship>,
    pub possible_finite_state_lists: Vec<PossibleFiniteStateList>,
    pub actual_finite_state_lists: Vec<ActualFiniteStateList>,
    /// Tool relationships the pass created.
    pub dst_relationships: Vec<ElementId>,
}

impl MappingOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
            && self.element_definitions.is_empty()
            && self.requirements_specifications.is_empty()
            && self.relationships.is_empty()
            && self.possible_finite_state_lists.is_empty()
            && self.actual_finite_state_lists.is_empty()
            && self.dst_relationships.is_empty()
    }

    /// A row by tool element and direction.
    pub fn row(&self, dst: &ElementId, direction: MappingDirection) -> Option<&MappedElementRow> {
        self.rows.iter().find(|r| r.key() == (dst, direction))
    }

    /// Stage every produced hub thing as create-or-update.
    ///
    /// State lists come first so that parameters never reference a list the
    /// transaction lacks.
    pub fn to_transaction(&self) -> Transaction {
        let mut transaction = Transaction::new();
        for list in &self.possible_finite_state_lists {
            transaction.create_or_update(Thing::PossibleFiniteStateList(list.clone()));
        }
        for list in &self.actual_finite_state_lists {
            transaction.create_or_update(Thing::ActualFiniteStateList(list.clone()));
        }
        for definition in &self.element_definitions {
            transaction.create_or_update(Thing::ElementDefinition(definition.clone()));
        }
        for specification in &self.requirements_specifications {
            transaction.create_or_update(Thing::RequirementsSpecification(specification.clone()));
        }
        for relationship in &self.relationships {
            transaction.create_or_update(Thing::BinaryRelationship(relationship.clone()));
        }
        transaction
    }
}
