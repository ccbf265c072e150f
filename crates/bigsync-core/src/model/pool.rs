//! Pools and their members.

use serde::{Deserialize, Serialize};

use crate::model::common::{AdminState, Identified};

/// Load distribution across members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LbMode {
    #[default]
    RoundRobin,
    LeastConnectionsMember,
    LeastConnectionsNode,
    RatioMember,
    RatioNode,
    FastestNode,
    ObservedMember,
}

/// One member of a pool. Identity is `address:port` (IPv6 members join with
/// `.` instead, matching the device's naming), computed during
/// normalization and carried so the full property set hashes as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PoolMember {
    /// Computed `address:port` name; documents omit it.
    #[serde(default)]
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub admin_state: AdminState,
    #[serde(default = "default_ratio")]
    pub ratio: u32,
    #[serde(default)]
    pub connection_limit: u32,
}

fn default_ratio() -> u32 {
    1
}

impl PoolMember {
    /// Device naming scheme: IPv4 (optionally with a route domain) joins
    /// address and port with `:`, IPv6 with `.`.
    pub fn member_name(address: &str, port: u16) -> String {
        if address.contains(':') {
            format!("{address}.{port}")
        } else {
            format!("{address}:{port}")
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.name = Self::member_name(&self.address, self.port);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Pool {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(default)]
    pub load_balancing_mode: LbMode,
    /// Full paths of the health monitors guarding this pool, kept sorted.
    #[serde(default)]
    pub monitors: Vec<String>,
    /// Members, kept sorted by name; membership is a set, not a sequence.
    #[serde(default)]
    pub members: Vec<PoolMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Pool {
    /// Canonical form shared by the document reader and the device state
    /// reader, so equal configurations compare equal regardless of input
    /// ordering.
    pub fn normalize(&mut self) {
        self.monitors.sort_unstable();
        for member in &mut self.members {
            member.normalize();
        }
        self.members.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    }

    /// Addresses referenced by this pool's members, route-domain suffix and
    /// all. These are the node names the pool depends on.
    pub fn member_addresses(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.address.as_str())
    }
}

impl Identified for Pool {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

// ── Tests ───────────────────────────────────────────────────────────
