//! Engineering-model things held by a hub iteration.
//!
//! Things are plain owned values. Anything fetched from a session is cloned
//! before it is changed; the session's own copy only changes through a
//! committed [`Transaction`](super::Transaction).

use super::ids::Iid;
use super::reference_data::ClassKind;

/// Language code of the requirement text definition.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Language code of the definition that records a usage's tool element.
pub const TOOL_ID_MARKER: &str = "x-tool-id";

// ============================================================================
// DOMAIN
// ============================================================================

/// The authoring domain that owns newly created things.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainOfExpertise {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
}

impl DomainOfExpertise {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
        }
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// Direction of service of a port-like element usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterfaceEndKind {
    #[default]
    None,
    Undirected,
    Input,
    Output,
    InOut,
}

/// Which value of a value set is in effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterSwitchKind {
    #[default]
    Manual,
    Computed,
    Reference,
}

/// The values of a parameter, optionally for one actual finite state.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterValueSet {
    pub iid: Iid,
    pub actual_state: Option<Iid>,
    pub manual: Vec<String>,
    pub computed: Vec<String>,
    pub reference: Vec<String>,
    pub value_switch: ParameterSwitchKind,
}

impl ParameterValueSet {
    /// A manual value set holding one value.
    pub fn manual(value: impl Into<String>, actual_state: Option<Iid>) -> Self {
        Self {
            iid: Iid::new(),
            actual_state,
            manual: vec![value.into()],
            computed: vec![super::NO_VALUE.to_string()],
            reference: vec![super::NO_VALUE.to_string()],
            value_switch: ParameterSwitchKind::Manual,
        }
    }

    /// The first value of the manual entry.
    pub fn manual_value(&self) -> Option<&str> {
        self.manual.first().map(String::as_str)
    }

    /// The value selected by the switch.
    pub fn actual_value(&self) -> Option<&str> {
        let values = match self.value_switch {
            ParameterSwitchKind::Manual => &self.manual,
            ParameterSwitchKind::Computed => &self.computed,
            ParameterSwitchKind::Reference => &self.reference,
        };
        values.first().map(String::as_str)
    }
}

/// A quantified attribute of an element definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub iid: Iid,
    pub owner: Iid,
    pub parameter_type: Iid,
    pub scale: Option<Iid>,
    /// The actual finite state list the values depend on.
    pub state_dependence: Option<Iid>,
    pub value_sets: Vec<ParameterValueSet>,
}

impl Parameter {
    pub fn new(parameter_type: Iid, scale: Option<Iid>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            owner,
            parameter_type,
            scale,
            state_dependence: None,
            value_sets: Vec::new(),
        }
    }

    /// The value set used when the parameter is not state dependent, or the
    /// first value set otherwise.
    pub fn primary_value_set(&self) -> Option<&ParameterValueSet> {
        self.value_sets
            .iter()
            .find(|v| v.actual_state.is_none())
            .or_else(|| self.value_sets.first())
    }

    /// Set the manual value of every value set, creating a single
    /// state-independent one when there is none.
    pub fn set_manual_value(&mut self, value: &str) {
        if self.value_sets.is_empty() {
            self.value_sets.push(ParameterValueSet::manual(value, None));
            return;
        }
        for value_set in &mut self.value_sets {
            value_set.manual = vec![value.to_string()];
            value_set.value_switch = ParameterSwitchKind::Manual;
        }
    }
}

/// A contained instance of another element definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementUsage {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    pub element_definition: Iid,
    pub interface_end: InterfaceEndKind,
    pub categories: Vec<Iid>,
    pub definitions: Vec<Definition>,
}

impl ElementUsage {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        element_definition: Iid,
        owner: Iid,
    ) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            element_definition,
            interface_end: InterfaceEndKind::None,
            categories: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// The tool element this usage was mapped from.
    pub fn tool_marker(&self) -> Option<&str> {
        self.definitions
            .iter()
            .find(|d| d.language_code == TOOL_ID_MARKER)
            .map(|d| d.content.as_str())
    }

    /// Record the tool element this usage was mapped from.
    pub fn set_tool_marker(&mut self, tool_id: &str) {
        match self
            .definitions
            .iter_mut()
            .find(|d| d.language_code == TOOL_ID_MARKER)
        {
            Some(marker) => marker.content = tool_id.to_string(),
            None => self.definitions.push(Definition::new(TOOL_ID_MARKER, tool_id)),
        }
    }
}

/// An engineering element definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDefinition {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    pub categories: Vec<Iid>,
    pub parameters: Vec<Parameter>,
    pub contained_elements: Vec<ElementUsage>,
    pub definitions: Vec<Definition>,
}

impl ElementDefinition {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            categories: Vec::new(),
            parameters: Vec::new(),
            contained_elements: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// A contained usage by identifier.
    pub fn usage(&self, iid: Iid) -> Option<&ElementUsage> {
        self.contained_elements.iter().find(|u| u.iid == iid)
    }

    /// A parameter by identifier.
    pub fn parameter(&self, iid: Iid) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.iid == iid)
    }

    /// A parameter by parameter type.
    pub fn parameter_of_type(&self, parameter_type: Iid) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.parameter_type == parameter_type)
    }
}

/// Apply a category once.
pub fn add_category(categories: &mut Vec<Iid>, category: Iid) {
    if !categories.contains(&category) {
        categories.push(category);
    }
}

// ============================================================================
// REQUIREMENTS
// ============================================================================

/// A textual definition in a language.
#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    pub iid: Iid,
    pub language_code: String,
    pub content: String,
}

impl Definition {
    pub fn new(language_code: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            language_code: language_code.into(),
            content: content.into(),
        }
    }
}

/// A single requirement.
#[derive(Clone, Debug, PartialEq)]
pub struct Requirement {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    /// The innermost group holding this requirement.
    pub group: Option<Iid>,
    pub categories: Vec<Iid>,
    pub definitions: Vec<Definition>,
    pub is_deprecated: bool,
}

impl Requirement {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            group: None,
            categories: Vec::new(),
            definitions: Vec::new(),
            is_deprecated: false,
        }
    }

    /// The definition in a language.
    pub fn definition(&self, language_code: &str) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|d| d.language_code == language_code)
    }
}

/// A group of requirements inside a specification.
#[derive(Clone, Debug, PartialEq)]
pub struct RequirementsGroup {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    pub groups: Vec<RequirementsGroup>,
    pub categories: Vec<Iid>,
}

impl RequirementsGroup {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            groups: Vec::new(),
            categories: Vec::new(),
        }
    }
}

/// A requirements specification: a tree of groups plus its requirements.
#[derive(Clone, Debug, PartialEq)]
pub struct RequirementsSpecification {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    pub groups: Vec<RequirementsGroup>,
    pub requirements: Vec<Requirement>,
    pub categories: Vec<Iid>,
}

impl RequirementsSpecification {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            groups: Vec::new(),
            requirements: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Every group in the tree, depth first.
    pub fn all_groups(&self) -> Vec<&RequirementsGroup> {
        fn collect<'a>(groups: &'a [RequirementsGroup], out: &mut Vec<&'a RequirementsGroup>) {
            for group in groups {
                out.push(group);
                collect(&group.groups, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.groups, &mut out);
        out
    }

    /// A group anywhere in the tree.
    pub fn group(&self, iid: Iid) -> Option<&RequirementsGroup> {
        self.all_groups().into_iter().find(|g| g.iid == iid)
    }

    /// The child groups of a parent (`None` means the specification itself).
    pub fn child_groups_mut(&mut self, parent: Option<Iid>) -> Option<&mut Vec<RequirementsGroup>> {
        fn find<'a>(
            groups: &'a mut Vec<RequirementsGroup>,
            iid: Iid,
        ) -> Option<&'a mut Vec<RequirementsGroup>> {
            for group in groups.iter_mut() {
                if group.iid == iid {
                    return Some(&mut group.groups);
                }
                if let Some(found) = find(&mut group.groups, iid) {
                    return Some(found);
                }
            }
            None
        }
        match parent {
            None => Some(&mut self.groups),
            Some(iid) => find(&mut self.groups, iid),
        }
    }

    /// The chain of groups from the specification down to `iid`, outermost first.
    pub fn group_path(&self, iid: Iid) -> Vec<&RequirementsGroup> {
        fn walk<'a>(
            groups: &'a [RequirementsGroup],
            iid: Iid,
            path: &mut Vec<&'a RequirementsGroup>,
        ) -> bool {
            for group in groups {
                path.push(group);
                if group.iid == iid || walk(&group.groups, iid, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.groups, iid, &mut path);
        path
    }

    /// A requirement by identifier.
    pub fn requirement(&self, iid: Iid) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.iid == iid)
    }
}

// ============================================================================
// RELATIONSHIPS
// ============================================================================

/// A directed edge between two hub things.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryRelationship {
    pub iid: Iid,
    pub name: String,
    pub owner: Iid,
    pub source: Iid,
    pub target: Iid,
    pub categories: Vec<Iid>,
}

impl BinaryRelationship {
    pub fn new(name: impl Into<String>, source: Iid, target: Iid, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            owner,
            source,
            target,
            categories: Vec::new(),
        }
    }

    /// Whether this relationship has the identity (source, target, categories).
    ///
    /// Categories compare as sets.
    pub fn connects(&self, source: Iid, target: Iid, categories: &[Iid]) -> bool {
        self.source == source
            && self.target == target
            && self.categories.len() == categories.len()
            && categories.iter().all(|c| self.categories.contains(c))
    }
}

// ============================================================================
// FINITE STATES
// ============================================================================

/// One member of a possible finite state list.
#[derive(Clone, Debug, PartialEq)]
pub struct PossibleFiniteState {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
}

impl PossibleFiniteState {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
        }
    }
}

/// An ordered partition of possible states.
#[derive(Clone, Debug, PartialEq)]
pub struct PossibleFiniteStateList {
    pub iid: Iid,
    pub name: String,
    pub short_name: String,
    pub owner: Iid,
    pub possible_states: Vec<PossibleFiniteState>,
    pub default_state: Option<Iid>,
    pub categories: Vec<Iid>,
}

impl PossibleFiniteStateList {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            name: name.into(),
            short_name: short_name.into(),
            owner,
            possible_states: Vec::new(),
            default_state: None,
            categories: Vec::new(),
        }
    }

    /// A member state by identifier.
    pub fn state(&self, iid: Iid) -> Option<&PossibleFiniteState> {
        self.possible_states.iter().find(|s| s.iid == iid)
    }
}

/// Whether an actual state is allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActualFiniteStateKind {
    #[default]
    Mandatory,
    Forbidden,
}

/// One combination of possible states, one from each list.
#[derive(Clone, Debug, PartialEq)]
pub struct ActualFiniteState {
    pub iid: Iid,
    /// One possible state per list, in list order.
    pub possible_states: Vec<Iid>,
    pub kind: ActualFiniteStateKind,
}

impl ActualFiniteState {
    pub fn new(possible_states: Vec<Iid>) -> Self {
        Self {
            iid: Iid::new(),
            possible_states,
            kind: ActualFiniteStateKind::Mandatory,
        }
    }
}

/// The cross product of a set of possible finite state lists.
#[derive(Clone, Debug, PartialEq)]
pub struct ActualFiniteStateList {
    pub iid: Iid,
    pub owner: Iid,
    pub possible_finite_state_lists: Vec<Iid>,
    pub actual_states: Vec<ActualFiniteState>,
}

impl ActualFiniteStateList {
    pub fn new(owner: Iid) -> Self {
        Self {
            iid: Iid::new(),
            owner,
            possible_finite_state_lists: Vec::new(),
            actual_states: Vec::new(),
        }
    }

    /// Whether this list combines exactly the given possible lists, in any order.
    pub fn combines(&self, lists: &[Iid]) -> bool {
        self.possible_finite_state_lists.len() == lists.len()
            && lists
                .iter()
                .all(|l| self.possible_finite_state_lists.contains(l))
    }
}

// ============================================================================
// THING
// ============================================================================

/// Any top-level thing that can be written in a transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Thing {
    ElementDefinition(ElementDefinition),
    RequirementsSpecification(RequirementsSpecification),
    BinaryRelationship(BinaryRelationship),
    PossibleFiniteStateList(PossibleFiniteStateList),
    ActualFiniteStateList(ActualFiniteStateList),
    ReferenceDataLibrary(super::ReferenceDataLibrary),
}

impl Thing {
    /// The thing's identifier.
    pub fn iid(&self) -> Iid {
        match self {
            Self::ElementDefinition(t) => t.iid,
            Self::RequirementsSpecification(t) => t.iid,
            Self::BinaryRelationship(t) => t.iid,
            Self::PossibleFiniteStateList(t) => t.iid,
            Self::ActualFiniteStateList(t) => t.iid,
            Self::ReferenceDataLibrary(t) => t.iid,
        }
    }

    /// The category host kind, for things that can carry categories.
    pub fn class_kind(&self) -> Option<ClassKind> {
        match self {
            Self::ElementDefinition(_) => Some(ClassKind::ElementDefinition),
            Self::RequirementsSpecification(_) => Some(ClassKind::RequirementsSpecification),
            Self::BinaryRelationship(_) => Some(ClassKind::BinaryRelationship),
            Self::PossibleFiniteStateList(_) => Some(ClassKind::PossibleFiniteStateList),
            Self::ActualFiniteStateList(_) | Self::ReferenceDataLibrary(_) => None,
        }
    }
}
