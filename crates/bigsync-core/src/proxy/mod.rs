//! Device access behind one flat capability interface.
//!
//! The engine never walks a nested device object graph; everything it can
//! do to the device is one method per kind and operation on [`DeviceProxy`].
//! The REST adapter in [`rest`] implements the trait over the iControl
//! client; tests substitute an in-memory implementation.

pub mod rest;
mod wire;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    AppService, ArpEntry, FdbTunnel, IRule, InternalDataGroup, L7Policy, Monitor, MonitorType,
    Node, Pool, VirtualAddress, VirtualServer,
};
use crate::state::PartitionState;

pub use rest::RestDeviceProxy;

/// CRUD access to every managed kind, scoped to partitions.
///
/// `list_*` failures are pass-fatal and come back as [`CoreError::Read`]
/// or [`CoreError::ReadNormalize`]; mutation failures are per-operation
/// and come back as [`CoreError::Api`].
///
/// Monitor deletion carries the monitor type because the device keeps each
/// probe type in its own collection; the type names the collection.
#[async_trait]
pub trait DeviceProxy: Send + Sync {
    async fn list_monitors(&self, partition: &str) -> Result<Vec<Monitor>, CoreError>;
    async fn create_monitor(&self, monitor: &Monitor) -> Result<(), CoreError>;
    async fn update_monitor(&self, monitor: &Monitor) -> Result<(), CoreError>;
    async fn delete_monitor(
        &self,
        partition: &str,
        name: &str,
        monitor_type: MonitorType,
    ) -> Result<(), CoreError>;

    async fn list_nodes(&self, partition: &str) -> Result<Vec<Node>, CoreError>;
    async fn create_node(&self, node: &Node) -> Result<(), CoreError>;
    /// Only the administrative state is writable on an existing node.
    async fn update_node(&self, node: &Node) -> Result<(), CoreError>;
    async fn delete_node(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_pools(&self, partition: &str) -> Result<Vec<Pool>, CoreError>;
    async fn create_pool(&self, pool: &Pool) -> Result<(), CoreError>;
    async fn update_pool(&self, pool: &Pool) -> Result<(), CoreError>;
    async fn delete_pool(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_l7_policies(&self, partition: &str) -> Result<Vec<L7Policy>, CoreError>;
    async fn create_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError>;
    async fn update_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError>;
    async fn delete_l7_policy(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_irules(&self, partition: &str) -> Result<Vec<IRule>, CoreError>;
    async fn create_irule(&self, irule: &IRule) -> Result<(), CoreError>;
    async fn update_irule(&self, irule: &IRule) -> Result<(), CoreError>;
    async fn delete_irule(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_virtual_addresses(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualAddress>, CoreError>;
    async fn create_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError>;
    async fn update_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError>;
    async fn delete_virtual_address(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_virtual_servers(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualServer>, CoreError>;
    async fn create_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError>;
    async fn update_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError>;
    async fn delete_virtual_server(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_app_services(&self, partition: &str) -> Result<Vec<AppService>, CoreError>;
    async fn create_app_service(&self, service: &AppService) -> Result<(), CoreError>;
    async fn update_app_service(&self, service: &AppService) -> Result<(), CoreError>;
    async fn delete_app_service(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_data_groups(
        &self,
        partition: &str,
    ) -> Result<Vec<InternalDataGroup>, CoreError>;
    async fn create_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError>;
    async fn update_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError>;
    async fn delete_data_group(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_arps(&self, partition: &str) -> Result<Vec<ArpEntry>, CoreError>;
    async fn create_arp(&self, entry: &ArpEntry) -> Result<(), CoreError>;
    async fn update_arp(&self, entry: &ArpEntry) -> Result<(), CoreError>;
    async fn delete_arp(&self, partition: &str, name: &str) -> Result<(), CoreError>;

    async fn list_fdb_tunnels(&self, partition: &str) -> Result<Vec<FdbTunnel>, CoreError>;
    async fn create_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError>;
    async fn update_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError>;
    async fn delete_fdb_tunnel(&self, partition: &str, name: &str) -> Result<(), CoreError>;
}

/// Read the authoritative inventory of one partition, one list call per
/// kind. Any single failure aborts the read: a diff against a partial
/// inventory would schedule destructive nonsense.
pub async fn read_partition(
    proxy: &dyn DeviceProxy,
    partition: &str,
) -> Result<PartitionState, CoreError> {
    let mut state = PartitionState::new();

    for monitor in proxy.list_monitors(partition).await? {
        state.monitors.insert(monitor.name.clone(), monitor);
    }
    for node in proxy.list_nodes(partition).await? {
        state.nodes.insert(node.name.clone(), node);
    }
    for pool in proxy.list_pools(partition).await? {
        state.pools.insert(pool.name.clone(), pool);
    }
    for policy in proxy.list_l7_policies(partition).await? {
        state.l7_policies.insert(policy.name.clone(), policy);
    }
    for irule in proxy.list_irules(partition).await? {
        state.irules.insert(irule.name.clone(), irule);
    }
    for address in proxy.list_virtual_addresses(partition).await? {
        state.virtual_addresses.insert(address.name.clone(), address);
    }
    for server in proxy.list_virtual_servers(partition).await? {
        state.virtual_servers.insert(server.name.clone(), server);
    }
    for service in proxy.list_app_services(partition).await? {
        state.app_services.insert(service.name.clone(), service);
    }
    for group in proxy.list_data_groups(partition).await? {
        state.data_groups.insert(group.name.clone(), group);
    }
    for entry in proxy.list_arps(partition).await? {
        state.arps.insert(entry.name.clone(), entry);
    }
    for tunnel in proxy.list_fdb_tunnels(partition).await? {
        state.fdb_tunnels.insert(tunnel.name.clone(), tunnel);
    }

    debug!(partition, objects = state.total(), "partition inventory read");
    Ok(state)
}
