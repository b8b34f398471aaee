//! Mapping rule tests
//!
//! End-to-end passes through the engine against an in-memory hub:
//! - Blocks to element definitions (parts, values, ports, connectors)
//! - Element definitions back to blocks
//! - Requirements and their package nesting
//! - Directed and binary relationships
//! - State dependencies
//! - Engine failure handling and identifier reuse

pub mod tests_block_mapping;
pub mod tests_element_mapping;
pub mod tests_requirement_mapping;
pub mod tests_state_mapping;
