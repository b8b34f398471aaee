//! Foundation helpers shared by both sides of the bridge.
//!
//! This module provides:
//! - [`short_name`] - Deterministic short-name derivation
//! - [`names_match`] - Case-insensitive name / short-name matching
//!
//! This module has NO dependencies on other syster-hub modules.

mod names;

pub use names::{is_blank, names_match, short_name};
