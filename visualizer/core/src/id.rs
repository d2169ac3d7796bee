use crate::IpBlock;
use std::{fmt, str::FromStr};

/// Identifies a namespaced resource (a workload or a policy).
///
/// Rendered as `namespace/name`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

/// Identifies a traffic peer: either a workload or a synthetic ipBlock.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum PeerId {
    Workload(ResourceId),
    IpBlock(IpBlock),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid resource id {0:?}: expected namespace/name")]
pub struct InvalidResourceId(String);

// === impl ResourceId ===

impl ResourceId {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = InvalidResourceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => Err(InvalidResourceId(s.to_string())),
        }
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

// === impl PeerId ===

impl PeerId {
    pub fn workload(&self) -> Option<&ResourceId> {
        match self {
            Self::Workload(id) => Some(id),
            Self::IpBlock(_) => None,
        }
    }
}

impl From<ResourceId> for PeerId {
    fn from(id: ResourceId) -> Self {
        Self::Workload(id)
    }
}

impl From<IpBlock> for PeerId {
    fn from(block: IpBlock) -> Self {
        Self::IpBlock(block)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workload(id) => id.fmt(f),
            Self::IpBlock(block) => block.fmt(f),
        }
    }
}

impl serde::Serialize for PeerId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
