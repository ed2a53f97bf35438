use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider tags are strings (human-readable, stable across peers and versions)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderKind(pub String);

impl ProviderKind {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderKind {
    fn from(tag: &str) -> Self {
        Self(tag.to_owned())
    }
}

/// Designation payload tags, same convention as [`ProviderKind`].
///
/// The remote side reconstructs a fresh payload value from this tag, so it
/// must name a registered designation kind on every participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignationKind(pub String);

impl DesignationKind {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DesignationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DesignationKind {
    fn from(tag: &str) -> Self {
        Self(tag.to_owned())
    }
}

/// Stable positional identity of one action handler within one provider's
/// ordered handler list.
///
/// Valid only for the catalog build generation (`epoch`) that produced it.
/// Resolving an id against a different epoch must fail rather than silently
/// pick whatever handler now occupies the slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuEntryId {
    pub provider: ProviderKind,
    pub index: u16,
    pub epoch: u64,
}

impl MenuEntryId {
    pub fn new(provider: ProviderKind, index: u16, epoch: u64) -> Self {
        Self {
            provider,
            index,
            epoch,
        }
    }
}

impl fmt::Display for MenuEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.provider, self.index, self.epoch)
    }
}
