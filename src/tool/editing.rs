//! Transactional mutation API for a tool [`Project`].
//!
//! `ToolTransaction` is the only way the mapping rules touch the project.
//! Before an existing element is mutated for the first time the transaction
//! keeps a snapshot of it, so the original stays available through
//! [`get_clone`](ToolTransaction::get_clone) and the whole transaction can
//! be [rolled back](ToolTransaction::rollback).
//!
//! ## Example
//!
//! ```ignore
//! let mut tx = ToolTransaction::new();
//! let block = tx.create(&mut project, ElementKind::Block, "Engine", Some(&pkg));
//! tx.modify(&mut project, &block, |e| e.is_abstract = true);
//! assert!(tx.is_created(&block));
//! ```

use super::model::{Element, ElementId, ElementKind, Project, PropertyValue};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Tagged-value key holding a requirement's identifier.
pub const REQUIREMENT_ID_TAG: &str = "Id";
/// Tagged-value key holding a requirement's text.
pub const REQUIREMENT_TEXT_TAG: &str = "Text";

/// Whether a staged region is to be created or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Delete,
}

/// An original element next to its current (mutated) state.
#[derive(Clone, Copy, Debug)]
pub struct ClonedElement<'a> {
    pub original: &'a Element,
    pub clone: &'a Element,
}

/// Records every mutation applied to a [`Project`] during a mapping pass.
#[derive(Clone, Debug, Default)]
pub struct ToolTransaction {
    /// Snapshots of existing elements taken before their first mutation.
    originals: IndexMap<ElementId, Element>,
    /// Elements created by this transaction, in creation order.
    created: IndexSet<ElementId>,
    /// Pre-existing elements removed by this transaction.
    removed: IndexMap<ElementId, Element>,
    /// Region changes staged per state, applied by the caller.
    regions: IndexMap<ElementId, Vec<(Element, ChangeKind)>>,
}

impl ToolTransaction {
    /// Create a new empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Query ───────────────────────────────────────────────────────

    /// Whether any mutations have been recorded.
    pub fn has_changes(&self) -> bool {
        !self.originals.is_empty()
            || !self.created.is_empty()
            || !self.removed.is_empty()
            || self.regions.values().any(|r| !r.is_empty())
    }

    /// Whether an existing element has been cloned for mutation.
    pub fn is_cloned(&self, id: &ElementId) -> bool {
        self.originals.contains_key(id)
    }

    /// Whether an element was created by this transaction.
    pub fn is_created(&self, id: &ElementId) -> bool {
        self.created.contains(id)
    }

    /// The original snapshot and current state of a cloned element.
    pub fn get_clone<'a>(&'a self, project: &'a Project, id: &ElementId) -> Option<ClonedElement<'a>> {
        let original = self.originals.get(id)?;
        let clone = project.get(id)?;
        Some(ClonedElement { original, clone })
    }

    /// Elements created by this transaction, in creation order.
    pub fn created_elements(&self) -> impl Iterator<Item = &ElementId> {
        self.created.iter()
    }

    /// Existing elements cloned for mutation.
    pub fn cloned_elements(&self) -> impl Iterator<Item = &ElementId> {
        self.originals.keys()
    }

    // ── Element lifecycle ───────────────────────────────────────────

    /// Create an element of a kind with a name, optionally owned.
    pub fn create(
        &mut self,
        project: &mut Project,
        kind: ElementKind,
        name: &str,
        owner: Option<&ElementId>,
    ) -> ElementId {
        let element = Element::new(ElementId::generate(), kind).with_name(name);
        self.add_element(project, element, owner)
    }

    /// Add a fully built element, linking it under `owner`.
    pub fn add_element(
        &mut self,
        project: &mut Project,
        mut element: Element,
        owner: Option<&ElementId>,
    ) -> ElementId {
        let id = element.id.clone();
        if let Some(owner_id) = owner {
            self.snapshot(project, owner_id);
            element.owner = Some(owner_id.clone());
        }
        project.add_element(element);
        self.created.insert(id.clone());
        id
    }

    /// Snapshot an existing element so it can be mutated safely.
    ///
    /// Returns false if the element does not exist.
    pub fn clone_element(&mut self, project: &Project, id: &ElementId) -> bool {
        if project.get(id).is_none() {
            return false;
        }
        self.snapshot(project, id);
        true
    }

    /// Mutate an element through a closure, snapshotting it first.
    pub fn modify<R>(
        &mut self,
        project: &mut Project,
        id: &ElementId,
        f: impl FnOnce(&mut Element) -> R,
    ) -> Option<R> {
        self.snapshot(project, id);
        project.get_mut(id).map(f)
    }

    /// Rename an element.
    pub fn rename(&mut self, project: &mut Project, id: &ElementId, name: &str) {
        self.modify(project, id, |e| e.name = Some(Arc::from(name)));
    }

    /// Apply a stereotype unless it is already applied.
    pub fn apply_stereotype(&mut self, project: &mut Project, id: &ElementId, stereotype: &str) {
        let present = project
            .get(id)
            .is_some_and(|e| e.has_stereotype_named(stereotype));
        if !present {
            self.modify(project, id, |e| e.stereotypes.push(Arc::from(stereotype)));
        }
    }

    /// Remove an element, everything it owns, and relationships touching it.
    pub fn remove_element(&mut self, project: &mut Project, id: &ElementId) -> Option<Element> {
        let owner_id = project.get(id)?.owner.clone();
        if let Some(owner_id) = owner_id {
            self.modify(project, &owner_id, |owner| {
                owner.owned_elements.retain(|child| child != id)
            });
        }
        project.roots.retain(|r| r != id);

        let mut doomed = vec![id.clone()];
        let mut index = 0;
        while index < doomed.len() {
            if let Some(e) = project.get(&doomed[index]) {
                doomed.extend(e.owned_elements.iter().cloned());
            }
            index += 1;
        }
        let relationships: Vec<ElementId> = project
            .iter_elements()
            .filter(|e| {
                e.relationship
                    .as_ref()
                    .is_some_and(|r| doomed.contains(&r.source) || doomed.contains(&r.target))
            })
            .map(|e| e.id.clone())
            .collect();
        doomed.extend(relationships);

        let mut removed_root = None;
        for doomed_id in doomed {
            if let Some(removed) = project.elements.shift_remove(&doomed_id) {
                if &doomed_id == id {
                    removed_root = Some(removed.clone());
                }
                if !self.created.shift_remove(&doomed_id) {
                    let original = self.originals.shift_remove(&doomed_id).unwrap_or(removed);
                    self.removed.insert(doomed_id, original);
                }
            }
        }
        removed_root
    }

    /// Move an element under a new owner, dropping the stale containment edge.
    pub fn reparent(&mut self, project: &mut Project, id: &ElementId, new_owner: &ElementId) {
        let Some(old_owner) = project.get(id).map(|e| e.owner.clone()) else {
            return;
        };
        if old_owner.as_ref() == Some(new_owner) {
            return;
        }
        match old_owner {
            Some(old_owner) => {
                self.modify(project, &old_owner, |owner| {
                    owner.owned_elements.retain(|child| child != id)
                });
            }
            None => project.roots.retain(|r| r != id),
        }
        self.modify(project, new_owner, |owner| {
            if !owner.owned_elements.contains(id) {
                owner.owned_elements.push(id.clone());
            }
        });
        self.modify(project, id, |e| e.owner = Some(new_owner.clone()));
    }

    // ── Requirements ────────────────────────────────────────────────

    /// The requirement identifier tag.
    pub fn requirement_id<'a>(&self, project: &'a Project, id: &ElementId) -> Option<&'a str> {
        tag(project, id, REQUIREMENT_ID_TAG)
    }

    /// Set the requirement identifier tag.
    pub fn set_requirement_id(&mut self, project: &mut Project, id: &ElementId, value: &str) {
        if self.requirement_id(project, id) != Some(value) {
            self.modify(project, id, |e| {
                e.properties
                    .insert(Arc::from(REQUIREMENT_ID_TAG), PropertyValue::from(value))
            });
        }
    }

    /// The requirement text tag.
    pub fn requirement_text<'a>(&self, project: &'a Project, id: &ElementId) -> Option<&'a str> {
        tag(project, id, REQUIREMENT_TEXT_TAG)
    }

    /// Set the requirement text tag.
    pub fn set_requirement_text(&mut self, project: &mut Project, id: &ElementId, value: &str) {
        if self.requirement_text(project, id) != Some(value) {
            self.modify(project, id, |e| {
                e.properties
                    .insert(Arc::from(REQUIREMENT_TEXT_TAG), PropertyValue::from(value))
            });
        }
    }

    // ── Reference data ──────────────────────────────────────────────

    /// Place a data type into the project's reference-data package, creating
    /// the package under the root container when missing.
    pub fn add_reference_data_to_data_package(
        &mut self,
        project: &mut Project,
        data_type: Element,
        package_name: &str,
    ) -> ElementId {
        let root = project.root_container().map(|r| r.id.clone());
        let package = match &root {
            Some(root_id) => project
                .owned_of_kind(root_id, ElementKind::Package)
                .find(|p| p.name_or_empty() == package_name)
                .map(|p| p.id.clone()),
            None => None,
        };
        let package = match package {
            Some(package) => package,
            None => self.create(project, ElementKind::Package, package_name, root.as_ref()),
        };
        self.add_element(project, data_type, Some(&package))
    }

    // ── Regions ─────────────────────────────────────────────────────

    /// Stage a region change for a state.
    pub fn stage_region(&mut self, state: &ElementId, region: Element, change: ChangeKind) {
        self.regions
            .entry(state.clone())
            .or_default()
            .push((region, change));
    }

    /// Region changes staged for a state.
    pub fn get_modified_regions(&self, state: &ElementId) -> &[(Element, ChangeKind)] {
        self.regions.get(state).map(Vec::as_slice).unwrap_or_default()
    }

    /// Apply every staged region change and clear the staging area.
    pub fn apply_region_changes(&mut self, project: &mut Project) {
        let staged = std::mem::take(&mut self.regions);
        for (state, changes) in staged {
            for (region, change) in changes {
                match change {
                    ChangeKind::Create => {
                        self.add_element(project, region, Some(&state));
                    }
                    ChangeKind::Delete => {
                        self.remove_element(project, &region.id);
                    }
                }
            }
        }
    }

    // ── Transaction control ─────────────────────────────────────────

    /// Fold another transaction's records into this one.
    ///
    /// Snapshots already held here win, since they are older.
    pub fn absorb(&mut self, other: ToolTransaction) {
        for (id, original) in other.originals {
            if !self.created.contains(&id) {
                self.originals.entry(id).or_insert(original);
            }
        }
        self.created.extend(other.created);
        for (id, original) in other.removed {
            if !self.created.shift_remove(&id) {
                let original = self.originals.shift_remove(&id).unwrap_or(original);
                self.removed.insert(id, original);
            }
        }
        for (state, changes) in other.regions {
            self.regions.entry(state).or_default().extend(changes);
        }
    }

    /// Undo every recorded mutation.
    pub fn rollback(self, project: &mut Project) {
        for id in self.created.iter().rev() {
            project.elements.shift_remove(id);
            project.roots.retain(|r| r != id);
        }
        for (id, original) in self.removed.into_iter().chain(self.originals) {
            if original.owner.is_none() && !project.roots.contains(&id) {
                project.roots.push(id.clone());
            }
            project.elements.insert(id, original);
        }
    }

    /// Snapshot an element before its first mutation.
    fn snapshot(&mut self, project: &Project, id: &ElementId) {
        if self.created.contains(id) || self.originals.contains_key(id) {
            return;
        }
        if let Some(element) = project.get(id) {
            self.originals.insert(id.clone(), element.clone());
        }
    }
}

fn tag<'a>(project: &'a Project, id: &ElementId, key: &str) -> Option<&'a str> {
    project
        .get(id)?
        .properties
        .get(key)
        .and_then(PropertyValue::as_str)
}
