//! Per-partition object sets, keyed by name.
//!
//! Both sides of a diff use this shape: the document reader produces the
//! desired state, the device state reader produces the actual state.
//! `IndexMap` keeps declaration/device order so plans render in a stable,
//! recognizable order.

use indexmap::IndexMap;

use crate::model::{
    AppService, ArpEntry, FdbTunnel, IRule, InternalDataGroup, L7Policy, Monitor, Node, Pool,
    ResourceKind, VirtualAddress, VirtualServer,
};

#[derive(Debug, Clone, Default)]
pub struct PartitionState {
    pub monitors: IndexMap<String, Monitor>,
    pub nodes: IndexMap<String, Node>,
    pub pools: IndexMap<String, Pool>,
    pub l7_policies: IndexMap<String, L7Policy>,
    pub irules: IndexMap<String, IRule>,
    pub virtual_addresses: IndexMap<String, VirtualAddress>,
    pub virtual_servers: IndexMap<String, VirtualServer>,
    pub app_services: IndexMap<String, AppService>,
    pub data_groups: IndexMap<String, InternalDataGroup>,
    pub arps: IndexMap<String, ArpEntry>,
    pub fdb_tunnels: IndexMap<String, FdbTunnel>,
}

impl PartitionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Monitor => self.monitors.len(),
            ResourceKind::Node => self.nodes.len(),
            ResourceKind::Pool => self.pools.len(),
            ResourceKind::L7Policy => self.l7_policies.len(),
            ResourceKind::IRule => self.irules.len(),
            ResourceKind::VirtualAddress => self.virtual_addresses.len(),
            ResourceKind::VirtualServer => self.virtual_servers.len(),
            ResourceKind::AppService => self.app_services.len(),
            ResourceKind::InternalDataGroup => self.data_groups.len(),
            ResourceKind::ArpEntry => self.arps.len(),
            ResourceKind::FdbTunnel => self.fdb_tunnels.len(),
        }
    }

    pub fn total(&self) -> usize {
        crate::engine::order::APPLY_ORDER
            .iter()
            .map(|kind| self.count(*kind))
            .sum()
    }
}
