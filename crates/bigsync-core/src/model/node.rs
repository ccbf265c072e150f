//! Nodes: the addresses pool members point at.
//!
//! Nodes are derived state. The desired set is computed from desired pool
//! members rather than declared in the service document, and the engine
//! never recreates an existing node to change it: identity is the address,
//! so only the administrative state is ever updated in place.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

/// Desired availability of a node. Nodes have no forced-offline notion of
/// their own; draining happens at the member level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeAdminState {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Node {
    /// Node name; for derived nodes this is the member address, including
    /// any route-domain suffix (`10.2.3.5%0`).
    pub name: String,
    #[serde(default)]
    pub partition: String,
    pub address: String,
    #[serde(default)]
    pub admin_state: NodeAdminState,
}

impl Node {
    /// A node derived from a pool member's address.
    pub fn from_member_address(partition: &str, address: &str) -> Self {
        Self {
            name: address.to_owned(),
            partition: partition.to_owned(),
            address: address.to_owned(),
            admin_state: NodeAdminState::Enabled,
        }
    }
}

impl Identified for Node {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}
