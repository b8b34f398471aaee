//! Hub side of the bridge: the engineering-model repository.
//!
//! ## Architecture
//!
//! ```text
//! HubSession (trait)
//! ├── open_iteration() → Iteration
//! │     ├── element_definitions       (parameters, usages)
//! │     ├── requirements_specifications (group tree, requirements)
//! │     ├── relationships             (binary relationships)
//! │     └── possible / actual finite state lists
//! ├── rdl_chain() → RdlChain          (categories, parameter types, scales, units)
//! └── write(Transaction)              (create-or-update, atomic)
//! ```
//!
//! Things are plain values. A thing read from the session is cloned before
//! it is changed, and reaches the session again only through a committed
//! [`Transaction`].

mod error;
mod ids;
mod iteration;
pub mod reference_data;
mod session;
pub mod things;

pub use error::HubError;
pub use ids::Iid;
pub use iteration::Iteration;
pub use reference_data::{
    Category, ClassKind, MeasurementScale, MeasurementUnit, NumberSetKind, ParameterType,
    ParameterTypeKind, RdlChain, ReferenceData, ReferenceDataLibrary,
};
pub use session::{HubSession, MemoryHub, Transaction};
pub use things::{
    ActualFiniteState, ActualFiniteStateKind, ActualFiniteStateList, BinaryRelationship,
    Definition, DomainOfExpertise, ElementDefinition, ElementUsage, InterfaceEndKind, Parameter,
    ParameterSwitchKind, ParameterValueSet, PossibleFiniteState, PossibleFiniteStateList,
    Requirement, RequirementsGroup, RequirementsSpecification, Thing,
};

/// The rendering of "no value" in a value set.
pub const NO_VALUE: &str = "-";
