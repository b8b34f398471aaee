//! Tool side of the bridge: the SysML modeling tool's project graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Project (standalone)                   │
//! │  - elements: IndexMap<ElementId, Element>                │
//! │  - roots: Vec<ElementId>                                 │
//! └──────────────────────────────────────────────────────────┘
//!        ▲                                  ▲
//!        │ mutates                          │ queries
//! ┌──────┴───────────────┐        ┌─────────┴────────────────┐
//! │   ToolTransaction    │        │      stereotypes         │
//! │  clone-before-write  │        │  part / value / connector│
//! │  region staging      │        │  type representation     │
//! └──────────────────────┘        └──────────────────────────┘
//! ```

pub mod editing;
pub mod model;
pub mod stereotypes;

pub use editing::{ChangeKind, ClonedElement, ToolTransaction};
pub use model::{
    ConnectorEnd, Element, ElementId, ElementKind, Project, PropertyValue, RelationshipData,
    ValueSpecification,
};
pub use stereotypes::Stereotype;
