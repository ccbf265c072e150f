//! Virtual addresses backing virtual-server destinations.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VirtualAddress {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    pub address: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the device answers ARP for this address.
    #[serde(default = "default_true")]
    pub arp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_group: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Identified for VirtualAddress {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}
