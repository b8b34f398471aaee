//! # syster-hub
//!
//! Bidirectional mapping between a SysML modeling tool's project graph and an
//! engineering-model hub.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! mapping   → Mapping rules, engine, identity and state resolution
//!   ↓
//! hub       → Hub things, reference data chain, session trait
//! tool      → Tool elements, stereotype queries, tool transaction
//!   ↓
//! base      → Primitives (short names, name matching)
//! ```

// ============================================================================
// MODULES (dependency order: base → tool, hub → mapping)
// ============================================================================

/// Foundation helpers: short names, name matching
pub mod base;

/// Tool side: project graph, stereotypes, transactional editing
pub mod tool;

/// Hub side: things, reference data libraries, sessions
pub mod hub;

/// Mapping rules and the engine running them
pub mod mapping;

// Re-export the entry points
pub use hub::{HubSession, Iid, MemoryHub};
pub use mapping::{
    BinaryToDirectedRelationshipRule, BlockToElementRule, DirectedToBinaryRelationshipRule,
    DstRow, ElementToBlockRule, HubRequirementToDstRule, HubRow, MappingConfig, MappingEngine,
    MappingError, MappingOutput, MappingRule, RequirementToHubRule,
};
pub use tool::{Element, ElementId, ElementKind, Project, ToolTransaction};
