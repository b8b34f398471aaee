//! The hub session seam.
//!
//! Mapping rules reach the repository only through [`HubSession`]. A real
//! session talks to a remote repository; [`MemoryHub`] keeps everything in
//! memory and is what the test-suite (and offline callers) use.
//!
//! ## Quick start
//!
//! ```ignore
//! let mut hub = MemoryHub::new();
//! let mut tx = Transaction::new();
//! tx.create_or_update(Thing::ElementDefinition(definition));
//! hub.write(tx)?;
//! ```

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::error::HubError;
use super::ids::Iid;
use super::iteration::Iteration;
use super::reference_data::{RdlChain, ReferenceDataLibrary};
use super::things::{DomainOfExpertise, Thing};

// ============================================================================
// TRANSACTION
// ============================================================================

/// A batch of create-or-update operations, committed atomically.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    things: IndexMap<Iid, Thing>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a thing. Staging the same identifier twice keeps the latest.
    pub fn create_or_update(&mut self, thing: Thing) {
        self.things.insert(thing.iid(), thing);
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    /// Staged things, in staging order.
    pub fn things(&self) -> impl Iterator<Item = &Thing> {
        self.things.values()
    }

    pub fn into_things(self) -> impl Iterator<Item = Thing> {
        self.things.into_values()
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Capabilities the mapping rules need from a hub repository session.
pub trait HubSession {
    /// The iteration being edited.
    fn open_iteration(&self) -> Option<&Iteration>;

    /// The domain that owns newly created things.
    fn current_domain(&self) -> Option<&DomainOfExpertise>;

    /// The model-specific reference data library, head of the chain.
    fn model_rdl(&self) -> Option<&ReferenceDataLibrary>;

    /// Any known reference data library.
    fn rdl(&self, iid: Iid) -> Option<&ReferenceDataLibrary>;

    /// Commit a transaction.
    fn write(&mut self, transaction: Transaction) -> Result<(), HubError>;

    /// Reload a library after a commit touched it.
    fn refresh_reference_data_library(&mut self, iid: Iid) -> Result<(), HubError>;

    /// The reference data chain, most specific library first.
    fn rdl_chain(&self) -> RdlChain<'_> {
        RdlChain::walk(self.model_rdl(), |iid| self.rdl(iid))
    }

    /// Look up an iteration thing by identifier.
    fn thing_by_iid(&self, iid: Iid) -> Option<Thing> {
        self.open_iteration()?.thing(iid)
    }
}

// ============================================================================
// IN-MEMORY SESSION
// ============================================================================

/// A self-contained in-memory hub.
#[derive(Clone, Debug)]
pub struct MemoryHub {
    iteration: Option<Iteration>,
    domain: Option<DomainOfExpertise>,
    libraries: IndexMap<Iid, ReferenceDataLibrary>,
    model_rdl: Option<Iid>,
    reject_writes: bool,
    commits: usize,
}

impl MemoryHub {
    /// An open iteration, a domain, and a model library chained onto a site
    /// library.
    pub fn new() -> Self {
        let site = ReferenceDataLibrary::new("Site Reference Data Library", "SiteRDL");
        let model = ReferenceDataLibrary::new("Model Reference Data Library", "ModelRDL")
            .requiring(site.iid);
        let model_iid = model.iid;
        let mut libraries = IndexMap::new();
        libraries.insert(model.iid, model);
        libraries.insert(site.iid, site);
        Self {
            iteration: Some(Iteration::new()),
            domain: Some(DomainOfExpertise::new("System Engineering", "SYS")),
            libraries,
            model_rdl: Some(model_iid),
            reject_writes: false,
            commits: 0,
        }
    }

    /// A hub with no open iteration.
    pub fn closed() -> Self {
        Self {
            iteration: None,
            ..Self::new()
        }
    }

    /// Replace the current domain.
    pub fn with_domain(mut self, domain: Option<DomainOfExpertise>) -> Self {
        self.domain = domain;
        self
    }

    /// Make every later write fail.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// The open iteration, mutably, for seeding fixtures.
    pub fn iteration_mut(&mut self) -> Option<&mut Iteration> {
        self.iteration.as_mut()
    }

    /// The least specific library in the chain.
    pub fn site_rdl_mut(&mut self) -> Option<&mut ReferenceDataLibrary> {
        let site = self.rdl_chain().libraries().last().map(|l| l.iid)?;
        self.libraries.get_mut(&site)
    }
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

impl HubSession for MemoryHub {
    fn open_iteration(&self) -> Option<&Iteration> {
        self.iteration.as_ref()
    }

    fn current_domain(&self) -> Option<&DomainOfExpertise> {
        self.domain.as_ref()
    }

    fn model_rdl(&self) -> Option<&ReferenceDataLibrary> {
        self.model_rdl.and_then(|iid| self.libraries.get(&iid))
    }

    fn rdl(&self, iid: Iid) -> Option<&ReferenceDataLibrary> {
        self.libraries.get(&iid)
    }

    fn write(&mut self, transaction: Transaction) -> Result<(), HubError> {
        if self.reject_writes {
            return Err(HubError::rejected("repository is read-only"));
        }
        let things: Vec<Thing> = transaction.into_things().collect();
        let needs_iteration = things
            .iter()
            .any(|t| !matches!(t, Thing::ReferenceDataLibrary(_)));
        if needs_iteration && self.iteration.is_none() {
            return Err(HubError::rejected("no open iteration"));
        }

        for thing in things {
            trace!(iid = %thing.iid(), "commit");
            match thing {
                Thing::ReferenceDataLibrary(rdl) => {
                    self.libraries.insert(rdl.iid, rdl);
                }
                other => {
                    if let Some(iteration) = self.iteration.as_mut() {
                        iteration.upsert(other);
                    }
                }
            }
        }
        self.commits += 1;
        debug!(commits = self.commits, "transaction committed");
        Ok(())
    }

    fn refresh_reference_data_library(&mut self, iid: Iid) -> Result<(), HubError> {
        if self.libraries.contains_key(&iid) {
            Ok(())
        } else {
            Err(HubError::NotFound(iid))
        }
    }
}
