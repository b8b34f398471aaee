use uuid::Uuid;

/// Stable identifier of a hub thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Iid(pub Uuid);

impl Iid {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil identifier, used as a placeholder owner.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for Iid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Iid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for Iid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
