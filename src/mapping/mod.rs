//! The bidirectional mapping rules and their engine.
//!
//! ## Architecture
//!
//! ```text
//! MappingEngine (identifier map, pending registry, tool transaction)
//!   │ transform(rule, hub, project, rows)
//!   ▼
//! MappingContext (one per transform: caches, working copies)
//!   │
//!   ├── block         BlockToElementRule          tool ─▶ hub
//!   ├── element       ElementToBlockRule          hub  ─▶ tool
//!   ├── requirement   RequirementToHubRule        tool ─▶ hub
//!   │                 HubRequirementToDstRule     hub  ─▶ tool
//!   └── relationship  DirectedToBinaryRelationshipRule / BinaryToDirectedRelationshipRule
//!         │
//!         ├── category  reference data find-or-create
//!         ├── values    literals, parameter types, scales
//!         └── state     finite states and their cross product
//! ```
//!
//! A rule never writes to the hub. It works on copies of hub things held by
//! the context, and the engine hands the result back as a
//! [`MappingOutput`]. Only reference data is committed during a pass, so it
//! can be shared by every thing the pass creates.

pub mod block;
pub mod category;
pub mod config;
pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod relationship;
pub mod requirement;
pub mod rows;
pub mod state;
pub mod values;

pub use block::BlockToElementRule;
pub use config::MappingConfig;
pub use context::MappingContext;
pub use element::ElementToBlockRule;
pub use engine::{MappingEngine, MappingRule};
pub use error::MappingError;
pub use relationship::{
    BinaryToDirectedRelationshipRule, DirectedRelationshipKind, DirectedToBinaryRelationshipRule,
};
pub use requirement::{HubRequirementToDstRule, RequirementToHubRule};
pub use rows::{
    DstRow, ExternalIdentifier, ExternalIdentifierMap, HubRow, MappedElementRow, MappedRowStatus,
    MappedThing, MappingDirection, MappingOutput, PendingDirected, PendingRegistry,
};
