//! Channel catalog used to populate driver, tuning space and channel choices

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ChannelDirectory;

/// One service offered by a tuning space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub network_id: u16,
    pub service_id: u16,
    /// Host channel number within the tuning space
    #[serde(default)]
    pub channel: i32,
    #[serde(default)]
    pub disabled: bool,
}

impl PartialEq for ServiceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.network_id == other.network_id && self.service_id == other.service_id
    }
}

impl Eq for ServiceInfo {}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.service_id, self.network_id, self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuningSpaceEntry {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ServiceInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverEntry {
    pub name: String,
    #[serde(default)]
    pub tuning_spaces: Vec<TuningSpaceEntry>,
}

/// Snapshot of the viewer's drivers and their channel lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelCatalog {
    #[serde(default)]
    pub drivers: Vec<DriverEntry>,
}

impl ChannelCatalog {
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading channel catalog from {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| "parsing channel catalog JSON")
    }

    fn driver(&self, name: &str) -> Option<&DriverEntry> {
        self.drivers.iter().find(|d| d.name == name)
    }
}

impl ChannelDirectory for ChannelCatalog {
    fn drivers(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.name.clone()).collect()
    }

    fn tuning_spaces(&self, driver: &str) -> Vec<String> {
        self.driver(driver)
            .map(|d| d.tuning_spaces.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    fn channels(&self, driver: &str, space: usize) -> Vec<ServiceInfo> {
        self.driver(driver)
            .and_then(|d| d.tuning_spaces.get(space))
            .map(|s| s.channels.iter().filter(|c| !c.disabled).cloned().collect())
            .unwrap_or_default()
    }
}
