//! In-memory representation of a SysML modeling-tool project.
//!
//! The modeling tool stores UML/SysML elements with stereotypes attached at
//! runtime. Here every element carries an explicit [`ElementKind`] plus its
//! applied stereotype names, and capability checks (part property, value
//! property, ...) are pure functions over that data (see
//! [`stereotypes`](super::stereotypes)).
//!
//! ```text
//! Project
//! ├── elements: IndexMap<ElementId, Element>  (preserves insertion order)
//! └── roots: Vec<ElementId>
//! ```
//!
//! Relationships (dependencies, abstractions, realizations) are elements too,
//! carrying [`RelationshipData`] with their source and target.

use indexmap::IndexMap;
use std::sync::Arc;

// ============================================================================
// IDs
// ============================================================================

/// Tool-native identifier of a project element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub Arc<str>);

impl ElementId {
    /// Create a new element ID.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID-based ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&ElementId> for ElementId {
    fn from(id: &ElementId) -> Self {
        id.clone()
    }
}

// ============================================================================
// ELEMENT KINDS
// ============================================================================

/// The metatype of a tool element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    // Containers
    Model,
    Package,

    // Classifiers
    Block,
    Interface,
    DataType,
    Requirement,

    // Features
    Property,
    Port,

    // Structure wiring
    Connector,
    InterfaceRealization,

    // Behavior
    StateMachine,
    Region,
    State,

    // Directed relationships
    Dependency,
    Abstraction,
}

impl ElementKind {
    /// Returns true if this kind can own packaged elements.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Model | Self::Package)
    }

    /// Returns true if this is a directed relationship.
    pub fn is_directed_relationship(&self) -> bool {
        matches!(
            self,
            Self::Dependency | Self::Abstraction | Self::InterfaceRealization
        )
    }

    /// Human-readable metaclass name.
    pub fn metaclass(&self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Package => "Package",
            Self::Block => "Class",
            Self::Interface => "Interface",
            Self::DataType => "DataType",
            Self::Requirement => "Class",
            Self::Property => "Property",
            Self::Port => "Port",
            Self::Connector => "Connector",
            Self::InterfaceRealization => "InterfaceRealization",
            Self::StateMachine => "StateMachine",
            Self::Region => "Region",
            Self::State => "State",
            Self::Dependency => "Dependency",
            Self::Abstraction => "Abstraction",
        }
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A property's default value, as the tool stores it.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueSpecification {
    LiteralInteger(i64),
    LiteralUnlimitedNatural(u64),
    LiteralReal(f64),
    LiteralBoolean(bool),
    LiteralString(Arc<str>),
    /// Cross-reference to another element (used by connector properties).
    ElementValue(ElementId),
    /// A literal slot with nothing in it.
    LiteralNull,
}

impl ValueSpecification {
    /// Create a string literal.
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Self::LiteralString(value.into())
    }

    /// The element referenced by an element value.
    pub fn referenced_element(&self) -> Option<&ElementId> {
        match self {
            Self::ElementValue(id) => Some(id),
            _ => None,
        }
    }
}

/// A tagged value stored on an element.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(Arc<str>),
    Integer(i64),
    Boolean(bool),
    Reference(ElementId),
}

impl PropertyValue {
    /// The string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

// ============================================================================
// CONNECTORS AND RELATIONSHIPS
// ============================================================================

/// One end of a connector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectorEnd {
    /// Unique identifier of this end.
    pub id: ElementId,
    /// The property or port this end attaches to.
    pub role: ElementId,
    /// The part property through which a nested port is reached.
    pub part_with_port: Option<ElementId>,
}

impl ConnectorEnd {
    pub fn new(id: impl Into<ElementId>, role: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            part_with_port: None,
        }
    }
}

/// Source and target of a directed relationship element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipData {
    pub source: ElementId,
    pub target: ElementId,
}

impl RelationshipData {
    pub fn new(source: impl Into<ElementId>, target: impl Into<ElementId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// A tool element with its properties.
#[derive(Clone, Debug)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// The metatype.
    pub kind: ElementKind,
    /// The declared name (may be None for anonymous elements).
    pub name: Option<Arc<str>>,
    /// The owning element's ID (None for root elements).
    pub owner: Option<ElementId>,
    /// IDs of directly owned elements.
    pub owned_elements: Vec<ElementId>,
    /// Names of the stereotypes applied to this element.
    pub stereotypes: Vec<Arc<str>>,
    /// The type of a property or port.
    pub type_ref: Option<ElementId>,
    /// The default value of a property.
    pub default_value: Option<ValueSpecification>,
    /// Interfaces a port provides.
    pub provided_interfaces: Vec<ElementId>,
    /// Interfaces a port requires.
    pub required_interfaces: Vec<ElementId>,
    /// Ends of a connector.
    pub connector_ends: Vec<ConnectorEnd>,
    pub is_abstract: bool,
    pub is_leaf: bool,
    pub is_active: bool,
    pub is_encapsulated: bool,
    /// Tagged values (requirement id and text live here).
    pub properties: IndexMap<Arc<str>, PropertyValue>,
    /// Present when this element is a directed relationship.
    pub relationship: Option<RelationshipData>,
}

impl Element {
    /// Create a new element with the given ID and kind.
    pub fn new(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            owner: None,
            owned_elements: Vec::new(),
            stereotypes: Vec::new(),
            type_ref: None,
            default_value: None,
            provided_interfaces: Vec::new(),
            required_interfaces: Vec::new(),
            connector_ends: Vec::new(),
            is_abstract: false,
            is_leaf: false,
            is_active: false,
            is_encapsulated: false,
            properties: IndexMap::new(),
            relationship: None,
        }
    }

    /// Create a new directed relationship element.
    pub fn new_relationship(
        id: impl Into<ElementId>,
        kind: ElementKind,
        source: impl Into<ElementId>,
        target: impl Into<ElementId>,
    ) -> Self {
        Self {
            relationship: Some(RelationshipData::new(source, target)),
            ..Self::new(id, kind)
        }
    }

    /// The declared name, or an empty string.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Source of a relationship element.
    pub fn source(&self) -> Option<&ElementId> {
        self.relationship.as_ref().map(|r| &r.source)
    }

    /// Target of a relationship element.
    pub fn target(&self) -> Option<&ElementId> {
        self.relationship.as_ref().map(|r| &r.target)
    }

    /// Whether a stereotype with this name is applied (case-insensitive).
    pub fn has_stereotype_named(&self, name: &str) -> bool {
        self.stereotypes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name))
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner: impl Into<ElementId>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Apply a stereotype by name.
    pub fn with_stereotype(mut self, stereotype: impl Into<Arc<str>>) -> Self {
        self.stereotypes.push(stereotype.into());
        self
    }

    /// Set the type of a property or port.
    pub fn with_type(mut self, type_ref: impl Into<ElementId>) -> Self {
        self.type_ref = Some(type_ref.into());
        self
    }

    /// Set the default value.
    pub fn with_default_value(mut self, value: ValueSpecification) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Add a provided interface.
    pub fn with_provided(mut self, interface: impl Into<ElementId>) -> Self {
        self.provided_interfaces.push(interface.into());
        self
    }

    /// Add a required interface.
    pub fn with_required(mut self, interface: impl Into<ElementId>) -> Self {
        self.required_interfaces.push(interface.into());
        self
    }

    /// Add a connector end.
    pub fn with_end(mut self, end: ConnectorEnd) -> Self {
        self.connector_ends.push(end);
        self
    }

    /// Set a tagged value.
    pub fn with_property(mut self, key: impl Into<Arc<str>>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Mark abstract.
    pub fn with_abstract(mut self, value: bool) -> Self {
        self.is_abstract = value;
        self
    }
}

// ============================================================================
// PROJECT
// ============================================================================

/// A complete tool project.
#[derive(Clone, Debug, Default)]
pub struct Project {
    /// All elements by ID (IndexMap preserves insertion order).
    pub elements: IndexMap<ElementId, Element>,
    /// Root element IDs.
    pub roots: Vec<ElementId>,
}

impl Project {
    /// Create a new empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element, linking it into its owner's owned elements.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        match &element.owner {
            Some(owner_id) => {
                if let Some(owner) = self.elements.get_mut(owner_id) {
                    if !owner.owned_elements.contains(&id) {
                        owner.owned_elements.push(id.clone());
                    }
                }
            }
            None => {
                if !self.roots.contains(&id) {
                    self.roots.push(id.clone());
                }
            }
        }
        self.elements.insert(id.clone(), element);
        id
    }

    /// Get an element by ID.
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Get a mutable element by ID.
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Iterate over all elements.
    pub fn iter_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Iterate over root elements.
    pub fn iter_roots(&self) -> impl Iterator<Item = &Element> {
        self.roots.iter().filter_map(|id| self.elements.get(id))
    }

    /// The first root container, which owns newly created top-level elements.
    pub fn root_container(&self) -> Option<&Element> {
        self.iter_roots().find(|e| e.kind.is_container())
    }

    /// Elements of a kind.
    pub fn find_by_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(move |e| e.kind == kind)
    }

    /// Elements of a kind whose name matches (ASCII case-insensitive).
    pub fn find_by_name<'a>(
        &'a self,
        kind: ElementKind,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.find_by_kind(kind)
            .filter(move |e| e.name_or_empty().eq_ignore_ascii_case(name))
    }

    /// Directly owned elements of an element.
    pub fn owned<'a>(&'a self, id: &ElementId) -> impl Iterator<Item = &'a Element> + use<'a> {
        self.get(id)
            .map(|e| e.owned_elements.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.elements.get(child))
    }

    /// Directly owned elements of a kind.
    pub fn owned_of_kind<'a>(
        &'a self,
        id: &ElementId,
        kind: ElementKind,
    ) -> impl Iterator<Item = &'a Element> + use<'a> {
        self.owned(id).filter(move |e| e.kind == kind)
    }

    /// Owner chain of an element, outermost first, excluding the element.
    pub fn ancestors(&self, id: &ElementId) -> Vec<&Element> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|e| e.owner.as_ref());
        while let Some(owner_id) = current {
            match self.get(owner_id) {
                Some(owner) => {
                    if chain.iter().any(|e: &&Element| e.id == owner.id) {
                        break;
                    }
                    chain.push(owner);
                    current = owner.owner.as_ref();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// Directed relationship elements whose source is the given element.
    pub fn relationships_from<'a>(
        &'a self,
        source: &'a ElementId,
    ) -> impl Iterator<Item = &'a Element> {
        self.elements
            .values()
            .filter(move |e| e.source() == Some(source))
    }

    /// Directed relationship elements whose target is the given element.
    pub fn relationships_to<'a>(
        &'a self,
        target: &'a ElementId,
    ) -> impl Iterator<Item = &'a Element> {
        self.elements
            .values()
            .filter(move |e| e.target() == Some(target))
    }

    /// Connectors with at least one end attached to the given role.
    pub fn connectors_of<'a>(&'a self, role: &'a ElementId) -> impl Iterator<Item = &'a Element> {
        self.find_by_kind(ElementKind::Connector)
            .filter(move |c| c.connector_ends.iter().any(|end| &end.role == role))
    }

    /// Get the number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of directed relationship elements.
    pub fn relationship_count(&self) -> usize {
        self.elements
            .values()
            .filter(|e| e.relationship.is_some())
            .count()
    }
}
