//! Firmware description nodes and reference resolution.
//!
//! Nodes are addressed by [`FwNodeId`]; reference properties name their
//! targets by node name, the way device-tree labels do.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{OffloadError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FwNodeId(pub u32);

impl fmt::Display for FwNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fwnode{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PropertyValue {
    /// Ordered list of referenced node names.
    Reference(Vec<String>),
    U32(u32),
    Str(String),
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FwNode {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub compatible: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl FwNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compatible: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_compatible(mut self, compatible: impl Into<String>) -> Self {
        self.compatible = Some(compatible.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Shorthand for a single-entry reference property.
    pub fn with_reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_property(name, PropertyValue::Reference(vec![target.into()]))
    }
}

/// Resolves firmware references between nodes.
pub trait ReferenceResolver: Send + Sync {
    fn property_present(&self, node: FwNodeId, property: &str) -> bool;

    /// Resolve entry `index` of reference property `property` on `node`.
    ///
    /// Any failure is [`OffloadError::Malformed`]: the reference itself is
    /// wrong, and retrying will not help.
    fn find_reference(&self, node: FwNodeId, property: &str, index: usize) -> Result<FwNodeId>;

    fn compatible(&self, node: FwNodeId) -> Option<String>;
}

/// In-memory firmware tree.
#[derive(Debug, Clone, Default)]
pub struct FwTree {
    nodes: Vec<FwNode>,
}

impl FwTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = FwNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn add(&mut self, node: FwNode) -> FwNodeId {
        self.nodes.push(node);
        FwNodeId((self.nodes.len() - 1) as u32)
    }

    pub fn node(&self, id: FwNodeId) -> Option<&FwNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn find_by_name(&self, name: &str) -> Option<FwNodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(|idx| FwNodeId(idx as u32))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl ReferenceResolver for FwTree {
    fn property_present(&self, node: FwNodeId, property: &str) -> bool {
        self.node(node)
            .is_some_and(|node| node.properties.contains_key(property))
    }

    fn find_reference(&self, node: FwNodeId, property: &str, index: usize) -> Result<FwNodeId> {
        let owner = self
            .node(node)
            .ok_or_else(|| OffloadError::malformed(format!("{node} does not exist")))?;

        let targets = match owner.properties.get(property) {
            Some(PropertyValue::Reference(targets)) => targets,
            Some(_) => {
                return Err(OffloadError::malformed(format!(
                    "{}: {property} is not a reference",
                    owner.name
                )))
            }
            None => {
                return Err(OffloadError::malformed(format!(
                    "{}: missing {property}",
                    owner.name
                )))
            }
        };

        let target = targets.get(index).ok_or_else(|| {
            OffloadError::malformed(format!(
                "{}: {property} has {} entries, wanted index {index}",
                owner.name,
                targets.len()
            ))
        })?;

        self.find_by_name(target).ok_or_else(|| {
            OffloadError::malformed(format!(
                "{}: {property} points at unknown node {target}",
                owner.name
            ))
        })
    }

    fn compatible(&self, node: FwNodeId) -> Option<String> {
        self.node(node).and_then(|node| node.compatible.clone())
    }
}
