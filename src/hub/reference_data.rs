//! Reference data: categories, parameter types, scales and units.
//!
//! Reference data lives in a layered chain of libraries, searched from the
//! most specific (model) to the least specific (site / generic). The first
//! match wins.

use super::ids::Iid;

// ============================================================================
// CLASS KINDS
// ============================================================================

/// Hub thing kinds a category may be applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    ElementDefinition,
    ElementUsage,
    Parameter,
    Requirement,
    RequirementsGroup,
    RequirementsSpecification,
    BinaryRelationship,
    PossibleFiniteStateList,
}

// ============================================================================
// CATEGORY
// ============================================================================

/// A named classification marker.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub is_abstract: bool,
    /// Kinds this category may be applied to.
    pub permissible_classes: Vec<ClassKind>,
}

impl Category {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            is_abstract: false,
            permissible_classes: Vec::new(),
        }
    }

    /// Restrict the category to the given kinds.
    pub fn with_permissible(mut self, classes: &[ClassKind]) -> Self {
        self.permissible_classes = classes.to_vec();
        self
    }

    /// Whether the category may be applied to a kind.
    pub fn permits(&self, class: ClassKind) -> bool {
        self.permissible_classes.contains(&class)
    }
}

// ============================================================================
// PARAMETER TYPES, SCALES, UNITS
// ============================================================================

/// The value domain of a parameter type.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterTypeKind {
    /// A quantity kind measured on a scale.
    QuantityKind {
        default_scale: Iid,
        possible_scales: Vec<Iid>,
    },
    Boolean,
    Text,
}

/// The type of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterType {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub symbol: String,
    pub kind: ParameterTypeKind,
}

impl ParameterType {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, kind: ParameterTypeKind) -> Self {
        let short_name = short_name.into();
        Self {
            iid: Iid::new(),
            name: name.into(),
            symbol: short_name.clone(),
            short_name,
            kind,
        }
    }

    /// Whether this is a quantity kind.
    pub fn is_quantity_kind(&self) -> bool {
        matches!(self.kind, ParameterTypeKind::QuantityKind { .. })
    }

    /// The default scale of a quantity kind.
    pub fn default_scale(&self) -> Option<Iid> {
        match &self.kind {
            ParameterTypeKind::QuantityKind { default_scale, .. } => Some(*default_scale),
            _ => None,
        }
    }
}

/// The number set a measurement scale ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberSetKind {
    Integer,
    Natural,
    Real,
}

/// A ratio scale for quantity kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementScale {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub unit: Iid,
    pub number_set: NumberSetKind,
}

impl MeasurementScale {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        unit: Iid,
        number_set: NumberSetKind,
    ) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            unit,
            number_set,
        }
    }
}

/// A simple measurement unit.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementUnit {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
}

impl MeasurementUnit {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
        }
    }
}

// ============================================================================
// LIBRARY
// ============================================================================

/// A reference data library, optionally requiring a less specific one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceDataLibrary {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    /// The next library in the chain.
    pub required_rdl: Option<Iid>,
    pub categories: Vec<Category>,
    pub parameter_types: Vec<ParameterType>,
    pub scales: Vec<MeasurementScale>,
    pub units: Vec<MeasurementUnit>,
}

impl ReferenceDataLibrary {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            ..Default::default()
        }
    }

    /// Chain this library onto a less specific one.
    pub fn requiring(mut self, required: Iid) -> Self {
        self.required_rdl = Some(required);
        self
    }
}

/// A reference data kind stored in libraries and resolved by name.
pub trait ReferenceData: Clone {
    /// Label used in log messages.
    const LABEL: &'static str;

    fn iid(&self) -> Iid;
    fn name(&self) -> &str;
    fn short_name(&self) -> &str;
    fn in_library(rdl: &ReferenceDataLibrary) -> &[Self];
    fn in_library_mut(rdl: &mut ReferenceDataLibrary) -> &mut Vec<Self>;
}

macro_rules! reference_data {
    ($ty:ty, $label:literal, $field:ident) => {
        impl ReferenceData for $ty {
            const LABEL: &'static str = $label;

            fn iid(&self) -> Iid {
                self.iid
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn short_name(&self) -> &str {
                &self.short_name
            }

            fn in_library(rdl: &ReferenceDataLibrary) -> &[Self] {
                &rdl.$field
            }

            fn in_library_mut(rdl: &mut ReferenceDataLibrary) -> &mut Vec<Self> {
                &mut rdl.$field
            }
        }
    };
}

reference_data!(Category, "category", categories);
reference_data!(ParameterType, "parameter type", parameter_types);
reference_data!(MeasurementScale, "measurement scale", scales);
reference_data!(MeasurementUnit, "measurement unit", units);

// ============================================================================
// CHAIN
// ============================================================================

/// The ordered chain of libraries reachable from the model library.
#[derive(Clone, Debug, Default)]
pub struct RdlChain<'a> {
    libraries: Vec<&'a ReferenceDataLibrary>,
}

impl<'a> RdlChain<'a> {
    /// Build a chain from libraries ordered most specific first.
    pub fn new(libraries: Vec<&'a ReferenceDataLibrary>) -> Self {
        Self { libraries }
    }

    /// Follow `required_rdl` links from a starting library.
    pub fn walk(
        start: Option<&'a ReferenceDataLibrary>,
        lookup: impl Fn(Iid) -> Option<&'a ReferenceDataLibrary>,
    ) -> Self {
        let mut libraries: Vec<&'a ReferenceDataLibrary> = Vec::new();
        let mut current = start;
        while let Some(rdl) = current {
            if libraries.iter().any(|l| l.iid == rdl.iid) {
                break;
            }
            libraries.push(rdl);
            current = rdl.required_rdl.and_then(&lookup);
        }
        Self { libraries }
    }

    /// Libraries, most specific first.
    pub fn libraries(&self) -> &[&'a ReferenceDataLibrary] {
        &self.libraries
    }

    /// The most specific library, where new reference data is added.
    pub fn most_specific(&self) -> Option<&'a ReferenceDataLibrary> {
        self.libraries.first().copied()
    }

    /// First thing of a kind, across the chain, satisfying a predicate.
    pub fn find<T: ReferenceData>(&self, predicate: impl Fn(&T) -> bool) -> Option<&'a T> {
        self.libraries
            .iter()
            .copied()
            .flat_map(|rdl| T::in_library(rdl).iter())
            .find(|thing| predicate(thing))
    }

    /// A thing of a kind by identifier.
    pub fn by_iid<T: ReferenceData>(&self, iid: Iid) -> Option<&'a T> {
        self.find(|thing: &T| thing.iid() == iid)
    }

    /// A thing of a kind whose short name or name matches, ignoring case.
    pub fn by_name<T: ReferenceData>(&self, name: &str, short_name: &str) -> Option<&'a T> {
        self.find(|thing: &T| {
            crate::base::names_match(thing.name(), thing.short_name(), name, short_name)
        })
    }
}
