//! The open iteration of an engineering model.

use indexmap::IndexMap;

use super::ids::Iid;
use super::things::{
    ActualFiniteStateList, BinaryRelationship, ElementDefinition, ElementUsage,
    PossibleFiniteStateList, Requirement, RequirementsSpecification, Thing,
};
use crate::base::names_match;

/// Top-level things of one engineering-model iteration, by identifier.
#[derive(Clone, Debug, Default)]
pub struct Iteration {
    pub iid: Iid,
    pub element_definitions: IndexMap<Iid, ElementDefinition>,
    pub requirements_specifications: IndexMap<Iid, RequirementsSpecification>,
    pub relationships: IndexMap<Iid, BinaryRelationship>,
    pub possible_finite_state_lists: IndexMap<Iid, PossibleFiniteStateList>,
    pub actual_finite_state_lists: IndexMap<Iid, ActualFiniteStateList>,
    pub top_element: Option<Iid>,
}

impl Iteration {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// An element definition whose name or short name matches.
    pub fn element_definition_named(&self, name: &str, short_name: &str) -> Option<&ElementDefinition> {
        self.element_definitions
            .values()
            .find(|d| names_match(&d.name, &d.short_name, name, short_name))
    }

    /// A contained usage anywhere in the iteration.
    pub fn usage(&self, iid: Iid) -> Option<&ElementUsage> {
        self.element_definitions
            .values()
            .find_map(|d| d.usage(iid))
    }

    /// A requirements specification whose name or short name matches.
    pub fn specification_named(
        &self,
        name: &str,
        short_name: &str,
    ) -> Option<&RequirementsSpecification> {
        self.requirements_specifications
            .values()
            .find(|s| names_match(&s.name, &s.short_name, name, short_name))
    }

    /// A requirement and its specification.
    pub fn requirement(&self, iid: Iid) -> Option<(&RequirementsSpecification, &Requirement)> {
        self.requirements_specifications
            .values()
            .find_map(|s| s.requirement(iid).map(|r| (s, r)))
    }

    /// A possible finite state list whose name or short name matches.
    pub fn possible_list_named(&self, name: &str, short_name: &str) -> Option<&PossibleFiniteStateList> {
        self.possible_finite_state_lists
            .values()
            .find(|l| names_match(&l.name, &l.short_name, name, short_name))
    }

    /// The actual finite state list combining exactly these possible lists.
    pub fn actual_list_combining(&self, lists: &[Iid]) -> Option<&ActualFiniteStateList> {
        self.actual_finite_state_lists
            .values()
            .find(|l| l.combines(lists))
    }

    /// Relationships whose source is the given thing.
    pub fn relationships_from(&self, source: Iid) -> impl Iterator<Item = &BinaryRelationship> {
        self.relationships.values().filter(move |r| r.source == source)
    }

    /// Look up any top-level thing by identifier.
    pub fn thing(&self, iid: Iid) -> Option<Thing> {
        if let Some(t) = self.element_definitions.get(&iid) {
            return Some(Thing::ElementDefinition(t.clone()));
        }
        if let Some(t) = self.requirements_specifications.get(&iid) {
            return Some(Thing::RequirementsSpecification(t.clone()));
        }
        if let Some(t) = self.relationships.get(&iid) {
            return Some(Thing::BinaryRelationship(t.clone()));
        }
        if let Some(t) = self.possible_finite_state_lists.get(&iid) {
            return Some(Thing::PossibleFiniteStateList(t.clone()));
        }
        self.actual_finite_state_lists
            .get(&iid)
            .map(|t| Thing::ActualFiniteStateList(t.clone()))
    }

    // ── Update ──────────────────────────────────────────────────────

    /// Create or replace a top-level thing.
    ///
    /// Returns the thing back when it does not live in an iteration.
    pub fn upsert(&mut self, thing: Thing) -> Option<Thing> {
        match thing {
            Thing::ElementDefinition(t) => {
                self.element_definitions.insert(t.iid, t);
            }
            Thing::RequirementsSpecification(t) => {
                self.requirements_specifications.insert(t.iid, t);
            }
            Thing::BinaryRelationship(t) => {
                self.relationships.insert(t.iid, t);
            }
            Thing::PossibleFiniteStateList(t) => {
                self.possible_finite_state_lists.insert(t.iid, t);
            }
            Thing::ActualFiniteStateList(t) => {
                self.actual_finite_state_lists.insert(t.iid, t);
            }
            other @ Thing::ReferenceDataLibrary(_) => return Some(other),
        }
        None
    }

    /// Total number of top-level things.
    pub fn thing_count(&self) -> usize {
        self.element_definitions.len()
            + self.requirements_specifications.len()
            + self.relationships.len()
            + self.possible_finite_state_lists.len()
            + self.actual_finite_state_lists.len()
    }
}
