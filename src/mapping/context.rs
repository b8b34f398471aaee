//! Per-transform working state.
//!
//! A [`MappingContext`] lives for exactly one transform. It owns every
//! in-pass cache (reference data, working copies of hub things, state
//! caches, deferred connector work), so nothing leaks from one pass into
//! the next.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::hub::{
    ActualFiniteStateList, BinaryRelationship, Category, ElementDefinition, HubSession, Iid,
    Iteration, MeasurementScale, MeasurementUnit, ParameterType, PossibleFiniteStateList,
    RdlChain, RequirementsSpecification,
};
use crate::tool::{ElementId, Project, ToolTransaction};

use super::config::MappingConfig;
use super::error::MappingError;
use super::rows::{ExternalIdentifierMap, MappedElementRow, MappingOutput, PendingRegistry};

/// A binding connector seen from one or both of its ends.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingBinding {
    pub name: String,
    pub source: Iid,
    pub target: Option<Iid>,
}

/// Working state of one transform.
pub struct MappingContext<'a> {
    pub(crate) hub: &'a mut dyn HubSession,
    pub(crate) project: &'a mut Project,
    pub(crate) tx: ToolTransaction,
    pub(crate) config: &'a MappingConfig,
    pub(crate) identifiers: &'a ExternalIdentifierMap,
    pending: &'a PendingRegistry,
    pub(crate) new_pending: PendingRegistry,

    // ── Reference data, keyed by lowercase short name ──
    pub(crate) categories: FxHashMap<String, Category>,
    pub(crate) parameter_types: FxHashMap<String, ParameterType>,
    pub(crate) scales: FxHashMap<String, MeasurementScale>,
    pub(crate) units: FxHashMap<String, MeasurementUnit>,

    // ── Working copies of hub things ──
    pub(crate) element_definitions: IndexMap<Iid, ElementDefinition>,
    pub(crate) specifications: IndexMap<Iid, RequirementsSpecification>,
    pub(crate) possible_lists: IndexMap<Iid, PossibleFiniteStateList>,
    pub(crate) actual_lists: IndexMap<Iid, ActualFiniteStateList>,
    pub(crate) relationships: Vec<BinaryRelationship>,
    created: FxHashSet<Iid>,

    // ── Tool to hub structure ──
    pub(crate) block_rows: IndexMap<ElementId, Iid>,
    pub(crate) block_stack: Vec<ElementId>,
    pub(crate) port_definition: Option<Iid>,
    pub(crate) port_usages: IndexMap<ElementId, (Iid, Iid)>,
    pub(crate) usages_by_tool: FxHashMap<ElementId, Iid>,
    pub(crate) bindings: IndexMap<ElementId, PendingBinding>,
    pub(crate) deferred_connector_properties: Vec<ElementId>,

    // ── Hub to tool structure ──
    pub(crate) dst_blocks: IndexMap<Iid, ElementId>,
    pub(crate) dst_stack: Vec<Iid>,
    pub(crate) dst_ports: IndexMap<Iid, ElementId>,
    pub(crate) created_packages: FxHashMap<(Option<ElementId>, String), ElementId>,
    pub(crate) dst_relationships: Vec<ElementId>,

    // ── States ──
    pub(crate) created_states: FxHashMap<String, ElementId>,
    pub(crate) state_region: Option<ElementId>,
}

impl<'a> MappingContext<'a> {
    pub fn new(
        hub: &'a mut dyn HubSession,
        project: &'a mut Project,
        config: &'a MappingConfig,
        identifiers: &'a ExternalIdentifierMap,
        pending: &'a PendingRegistry,
    ) -> Self {
        Self {
            hub,
            project,
            tx: ToolTransaction::new(),
            config,
            identifiers,
            pending,
            new_pending: PendingRegistry::default(),
            categories: FxHashMap::default(),
            parameter_types: FxHashMap::default(),
            scales: FxHashMap::default(),
            units: FxHashMap::default(),
            element_definitions: IndexMap::new(),
            specifications: IndexMap::new(),
            possible_lists: IndexMap::new(),
            actual_lists: IndexMap::new(),
            relationships: Vec::new(),
            created: FxHashSet::default(),
            block_rows: IndexMap::new(),
            block_stack: Vec::new(),
            port_definition: None,
            port_usages: IndexMap::new(),
            usages_by_tool: FxHashMap::default(),
            bindings: IndexMap::new(),
            deferred_connector_properties: Vec::new(),
            dst_blocks: IndexMap::new(),
            dst_stack: Vec::new(),
            dst_ports: IndexMap::new(),
            created_packages: FxHashMap::default(),
            dst_relationships: Vec::new(),
            created_states: FxHashMap::default(),
            state_region: None,
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    pub fn iteration(&self) -> Result<&Iteration, MappingError> {
        self.hub.open_iteration().ok_or(MappingError::NoOpenIteration)
    }

    /// The current domain, owner of everything created on the hub.
    pub fn domain(&self) -> Result<Iid, MappingError> {
        self.hub
            .current_domain()
            .map(|d| d.iid)
            .ok_or(MappingError::NoDomain)
    }

    /// Fail early when the session cannot take new things.
    pub fn ensure_ready(&self) -> Result<Iid, MappingError> {
        self.iteration()?;
        self.domain()
    }

    pub fn chain(&self) -> RdlChain<'_> {
        self.hub.rdl_chain()
    }

    pub fn project(&self) -> &Project {
        &*self.project
    }

    pub fn transaction(&self) -> &ToolTransaction {
        &self.tx
    }

    /// The tool transaction with the project it edits.
    pub fn tool_mut(&mut self) -> (&mut ToolTransaction, &mut Project) {
        (&mut self.tx, &mut *self.project)
    }

    /// Whether the pass created this hub thing.
    pub fn is_created(&self, iid: Iid) -> bool {
        self.created.contains(&iid)
    }

    // ── Element definitions ─────────────────────────────────────────

    /// The working copy, else the persisted one.
    pub fn element_definition(&self, iid: Iid) -> Option<&ElementDefinition> {
        self.element_definitions.get(&iid).or_else(|| {
            self.hub
                .open_iteration()
                .and_then(|i| i.element_definitions.get(&iid))
        })
    }

    /// A working copy for mutation, cloned from the session on first use.
    pub fn checkout_definition(&mut self, iid: Iid) -> Option<&mut ElementDefinition> {
        if !self.element_definitions.contains_key(&iid) {
            let persisted = self
                .hub
                .open_iteration()
                .and_then(|i| i.element_definitions.get(&iid))
                .cloned()?;
            self.element_definitions.insert(iid, persisted);
        }
        self.element_definitions.get_mut(&iid)
    }

    /// Add a definition created by this pass.
    pub fn add_definition(&mut self, definition: ElementDefinition) -> Iid {
        let iid = definition.iid;
        self.created.insert(iid);
        self.element_definitions.insert(iid, definition);
        iid
    }

    /// A definition by name: working set first, then the session.
    pub fn find_definition_named(&self, name: &str, short_name: &str) -> Option<Iid> {
        self.element_definitions
            .values()
            .find(|d| crate::base::names_match(&d.name, &d.short_name, name, short_name))
            .map(|d| d.iid)
            .or_else(|| {
                self.hub
                    .open_iteration()
                    .and_then(|i| i.element_definition_named(name, short_name))
                    .map(|d| d.iid)
            })
    }

    // ── Requirements specifications ─────────────────────────────────

    pub fn checkout_specification(&mut self, iid: Iid) -> Option<&mut RequirementsSpecification> {
        if !self.specifications.contains_key(&iid) {
            let persisted = self
                .hub
                .open_iteration()
                .and_then(|i| i.requirements_specifications.get(&iid))
                .cloned()?;
            self.specifications.insert(iid, persisted);
        }
        self.specifications.get_mut(&iid)
    }

    pub fn add_specification(&mut self, specification: RequirementsSpecification) -> Iid {
        let iid = specification.iid;
        self.created.insert(iid);
        self.specifications.insert(iid, specification);
        iid
    }

    // ── Finite state lists ──────────────────────────────────────────

    pub fn possible_list(&self, iid: Iid) -> Option<&PossibleFiniteStateList> {
        self.possible_lists.get(&iid).or_else(|| {
            self.hub
                .open_iteration()
                .and_then(|i| i.possible_finite_state_lists.get(&iid))
        })
    }

    pub fn checkout_possible_list(&mut self, iid: Iid) -> Option<&mut PossibleFiniteStateList> {
        if !self.possible_lists.contains_key(&iid) {
            let persisted = self
                .hub
                .open_iteration()
                .and_then(|i| i.possible_finite_state_lists.get(&iid))
                .cloned()?;
            self.possible_lists.insert(iid, persisted);
        }
        self.possible_lists.get_mut(&iid)
    }

    pub fn add_possible_list(&mut self, list: PossibleFiniteStateList) -> Iid {
        let iid = list.iid;
        self.created.insert(iid);
        self.possible_lists.insert(iid, list);
        iid
    }

    pub fn actual_list(&self, iid: Iid) -> Option<&ActualFiniteStateList> {
        self.actual_lists.get(&iid).or_else(|| {
            self.hub
                .open_iteration()
                .and_then(|i| i.actual_finite_state_lists.get(&iid))
        })
    }

    pub fn checkout_actual_list(&mut self, iid: Iid) -> Option<&mut ActualFiniteStateList> {
        if !self.actual_lists.contains_key(&iid) {
            let persisted = self
                .hub
                .open_iteration()
                .and_then(|i| i.actual_finite_state_lists.get(&iid))
                .cloned()?;
            self.actual_lists.insert(iid, persisted);
        }
        self.actual_lists.get_mut(&iid)
    }

    pub fn add_actual_list(&mut self, list: ActualFiniteStateList) -> Iid {
        let iid = list.iid;
        self.created.insert(iid);
        self.actual_lists.insert(iid, list);
        iid
    }

    // ── Relationships ───────────────────────────────────────────────

    /// Whether a relationship with this identity exists in the session, in
    /// this pass, or among pending relationships of earlier passes.
    pub fn relationship_exists(&self, source: Iid, target: Iid, categories: &[Iid]) -> bool {
        self.relationships
            .iter()
            .any(|r| r.connects(source, target, categories))
            || self.pending.has_relationship(source, target, categories)
            || self.new_pending.has_relationship(source, target, categories)
            || self.hub.open_iteration().is_some_and(|i| {
                i.relationships
                    .values()
                    .any(|r| r.connects(source, target, categories))
            })
    }

    /// Keep a relationship unless an equivalent one exists.
    pub fn add_relationship(&mut self, relationship: BinaryRelationship) -> bool {
        if self.relationship_exists(
            relationship.source,
            relationship.target,
            &relationship.categories,
        ) {
            tracing::debug!(
                source = %relationship.source,
                target = %relationship.target,
                "relationship already present"
            );
            return false;
        }
        self.created.insert(relationship.iid);
        self.new_pending.relationships.push(relationship.clone());
        self.relationships.push(relationship);
        true
    }

    pub(crate) fn pending(&self) -> &PendingRegistry {
        self.pending
    }

    // ── Finish ──────────────────────────────────────────────────────

    /// Collect the pass output, handing back the tool transaction and the
    /// relationships to register as pending.
    pub fn finish(self, rows: Vec<MappedElementRow>) -> (MappingOutput, ToolTransaction, PendingRegistry) {
        let output = MappingOutput {
            rows,
            element_definitions: self.element_definitions.into_values().collect(),
            requirements_specifications: self.specifications.into_values().collect(),
            relationships: self.relationships,
            possible_finite_state_lists: self.possible_lists.into_values().collect(),
            actual_finite_state_lists: self.actual_lists.into_values().collect(),
            dst_relationships: self.dst_relationships,
        };
        (output, self.tx, self.new_pending)
    }

    /// Abandon the pass, handing back the tool transaction to roll back.
    pub fn abandon(self) -> ToolTransaction {
        self.tx
    }
}
