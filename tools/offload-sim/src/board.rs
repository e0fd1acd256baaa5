//! JSON board descriptions.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use offload_trigger::{DeviceInfo, FwNode, FwTree, OffloadConfig};
use serde::{Deserialize, Serialize};

use crate::adc::DEFAULT_ADC_COMPATIBLE;

/// A device to instantiate, referring to its firmware node by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDevice {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub compatible: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub config: OffloadConfig,
    #[serde(default = "default_adc_compatible")]
    pub adc_compatible: String,
    pub nodes: Vec<FwNode>,
    pub devices: Vec<BoardDevice>,
}

fn default_adc_compatible() -> String {
    DEFAULT_ADC_COMPATIBLE.to_string()
}

impl Board {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn firmware(&self) -> FwTree {
        FwTree::from_nodes(self.nodes.iter().cloned())
    }

    /// Device descriptions with node names resolved against `tree`.
    pub fn device_infos(&self, tree: &FwTree) -> anyhow::Result<Vec<DeviceInfo>> {
        self.devices
            .iter()
            .map(|dev| {
                let fwnode = dev
                    .node
                    .as_deref()
                    .map(|node| {
                        tree.find_by_name(node)
                            .ok_or_else(|| anyhow!("{}: unknown node {node}", dev.name))
                    })
                    .transpose()?;
                Ok(DeviceInfo {
                    name: dev.name.clone(),
                    parent: dev.parent.clone(),
                    fwnode,
                    compatible: dev.compatible.clone(),
                })
            })
            .collect()
    }
}
