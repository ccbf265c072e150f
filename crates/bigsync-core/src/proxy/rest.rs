//! iControl REST implementation of the device proxy.
//!
//! Thin by intent: every method picks the collection path, converts between
//! the wire shape and the domain type, and classifies the failure. List
//! failures become pass-fatal read errors; mutation failures stay scoped to
//! the one operation.

use std::sync::Arc;

use async_trait::async_trait;
use bigsync_api::{DeviceClient, paths};

use super::DeviceProxy;
use super::wire::{
    AppServiceItem, ArpItem, DataGroupItem, FdbTunnelItem, MonitorItem, NodeItem,
    NodeSessionPatch, PolicyItem, PoolItem, RuleItem, VirtualAddressItem, VirtualItem,
};
use crate::error::{ApiError, CoreError};
use crate::model::{
    AppService, ArpEntry, FdbTunnel, IRule, InternalDataGroup, L7Policy, Monitor, MonitorType,
    Node, Pool, ResourceKind, VirtualAddress, VirtualServer,
};

/// Each probe type lives in its own collection.
fn monitor_path(monitor_type: MonitorType) -> &'static str {
    match monitor_type {
        MonitorType::Http => paths::MONITOR_HTTP,
        MonitorType::Https => paths::MONITOR_HTTPS,
        MonitorType::Tcp => paths::MONITOR_TCP,
        MonitorType::Udp => paths::MONITOR_UDP,
        MonitorType::Icmp => paths::MONITOR_GATEWAY_ICMP,
    }
}

const MONITOR_FAMILIES: [MonitorType; 5] = [
    MonitorType::Http,
    MonitorType::Https,
    MonitorType::Tcp,
    MonitorType::Udp,
    MonitorType::Icmp,
];

pub struct RestDeviceProxy {
    client: Arc<DeviceClient>,
}

impl RestDeviceProxy {
    pub fn new(client: Arc<DeviceClient>) -> Self {
        Self { client }
    }

    fn read_error(kind: ResourceKind, partition: &str, source: ApiError) -> CoreError {
        CoreError::Read {
            kind,
            partition: partition.to_owned(),
            source,
        }
    }

    fn normalize_error(kind: ResourceKind, partition: &str, reason: String) -> CoreError {
        CoreError::ReadNormalize {
            kind,
            partition: partition.to_owned(),
            reason,
        }
    }
}

#[async_trait]
impl DeviceProxy for RestDeviceProxy {
    async fn list_monitors(&self, partition: &str) -> Result<Vec<Monitor>, CoreError> {
        let mut monitors = Vec::new();
        for monitor_type in MONITOR_FAMILIES {
            let items: Vec<MonitorItem> = self
                .client
                .collection(monitor_path(monitor_type), partition, false)
                .await
                .map_err(|source| Self::read_error(ResourceKind::Monitor, partition, source))?;
            monitors.extend(items.into_iter().map(|item| item.into_monitor(monitor_type)));
        }
        Ok(monitors)
    }

    async fn create_monitor(&self, monitor: &Monitor) -> Result<(), CoreError> {
        self.client
            .create(monitor_path(monitor.monitor_type), &MonitorItem::from(monitor))
            .await?;
        Ok(())
    }

    async fn update_monitor(&self, monitor: &Monitor) -> Result<(), CoreError> {
        self.client
            .replace(
                monitor_path(monitor.monitor_type),
                &paths::item_id(&monitor.partition, &monitor.name),
                &MonitorItem::from(monitor),
            )
            .await?;
        Ok(())
    }

    async fn delete_monitor(
        &self,
        partition: &str,
        name: &str,
        monitor_type: MonitorType,
    ) -> Result<(), CoreError> {
        self.client
            .remove(monitor_path(monitor_type), &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_nodes(&self, partition: &str) -> Result<Vec<Node>, CoreError> {
        let items: Vec<NodeItem> = self
            .client
            .collection(paths::NODE, partition, false)
            .await
            .map_err(|source| Self::read_error(ResourceKind::Node, partition, source))?;
        Ok(items.into_iter().map(Node::from).collect())
    }

    async fn create_node(&self, node: &Node) -> Result<(), CoreError> {
        self.client.create(paths::NODE, &NodeItem::from(node)).await?;
        Ok(())
    }

    async fn update_node(&self, node: &Node) -> Result<(), CoreError> {
        // Address and name are immutable; only the session may change.
        self.client
            .modify(
                paths::NODE,
                &paths::item_id(&node.partition, &node.name),
                &NodeSessionPatch::from(node),
            )
            .await?;
        Ok(())
    }

    async fn delete_node(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::NODE, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_pools(&self, partition: &str) -> Result<Vec<Pool>, CoreError> {
        let items: Vec<PoolItem> = self
            .client
            .collection(paths::POOL, partition, true)
            .await
            .map_err(|source| Self::read_error(ResourceKind::Pool, partition, source))?;
        items
            .into_iter()
            .map(|item| {
                Pool::try_from(item)
                    .map_err(|reason| Self::normalize_error(ResourceKind::Pool, partition, reason))
            })
            .collect()
    }

    async fn create_pool(&self, pool: &Pool) -> Result<(), CoreError> {
        self.client.create(paths::POOL, &PoolItem::from(pool)).await?;
        Ok(())
    }

    async fn update_pool(&self, pool: &Pool) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::POOL,
                &paths::item_id(&pool.partition, &pool.name),
                &PoolItem::from(pool),
            )
            .await?;
        Ok(())
    }

    async fn delete_pool(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::POOL, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_l7_policies(&self, partition: &str) -> Result<Vec<L7Policy>, CoreError> {
        let items: Vec<PolicyItem> = self
            .client
            .collection(paths::POLICY, partition, true)
            .await
            .map_err(|source| Self::read_error(ResourceKind::L7Policy, partition, source))?;
        items
            .into_iter()
            .map(|item| {
                L7Policy::try_from(item).map_err(|reason| {
                    Self::normalize_error(ResourceKind::L7Policy, partition, reason)
                })
            })
            .collect()
    }

    async fn create_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError> {
        self.client
            .create(paths::POLICY, &PolicyItem::from(policy))
            .await?;
        Ok(())
    }

    async fn update_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::POLICY,
                &paths::item_id(&policy.partition, &policy.name),
                &PolicyItem::from(policy),
            )
            .await?;
        Ok(())
    }

    async fn delete_l7_policy(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::POLICY, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_irules(&self, partition: &str) -> Result<Vec<IRule>, CoreError> {
        let items: Vec<RuleItem> = self
            .client
            .collection(paths::RULE, partition, false)
            .await
            .map_err(|source| Self::read_error(ResourceKind::IRule, partition, source))?;
        Ok(items.into_iter().map(IRule::from).collect())
    }

    async fn create_irule(&self, irule: &IRule) -> Result<(), CoreError> {
        self.client.create(paths::RULE, &RuleItem::from(irule)).await?;
        Ok(())
    }

    async fn update_irule(&self, irule: &IRule) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::RULE,
                &paths::item_id(&irule.partition, &irule.name),
                &RuleItem::from(irule),
            )
            .await?;
        Ok(())
    }

    async fn delete_irule(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::RULE, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_virtual_addresses(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualAddress>, CoreError> {
        let items: Vec<VirtualAddressItem> = self
            .client
            .collection(paths::VIRTUAL_ADDRESS, partition, false)
            .await
            .map_err(|source| {
                Self::read_error(ResourceKind::VirtualAddress, partition, source)
            })?;
        Ok(items.into_iter().map(VirtualAddress::from).collect())
    }

    async fn create_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError> {
        self.client
            .create(paths::VIRTUAL_ADDRESS, &VirtualAddressItem::from(address))
            .await?;
        Ok(())
    }

    async fn update_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::VIRTUAL_ADDRESS,
                &paths::item_id(&address.partition, &address.name),
                &VirtualAddressItem::from(address),
            )
            .await?;
        Ok(())
    }

    async fn delete_virtual_address(
        &self,
        partition: &str,
        name: &str,
    ) -> Result<(), CoreError> {
        self.client
            .remove(paths::VIRTUAL_ADDRESS, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_virtual_servers(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualServer>, CoreError> {
        let items: Vec<VirtualItem> = self
            .client
            .collection(paths::VIRTUAL, partition, true)
            .await
            .map_err(|source| {
                Self::read_error(ResourceKind::VirtualServer, partition, source)
            })?;
        items
            .into_iter()
            .map(|item| {
                VirtualServer::try_from(item).map_err(|reason| {
                    Self::normalize_error(ResourceKind::VirtualServer, partition, reason)
                })
            })
            .collect()
    }

    async fn create_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError> {
        self.client
            .create(paths::VIRTUAL, &VirtualItem::from(server))
            .await?;
        Ok(())
    }

    async fn update_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::VIRTUAL,
                &paths::item_id(&server.partition, &server.name),
                &VirtualItem::from(server),
            )
            .await?;
        Ok(())
    }

    async fn delete_virtual_server(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::VIRTUAL, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_app_services(&self, partition: &str) -> Result<Vec<AppService>, CoreError> {
        let items: Vec<AppServiceItem> = self
            .client
            .collection(paths::APP_SERVICE, partition, false)
            .await
            .map_err(|source| Self::read_error(ResourceKind::AppService, partition, source))?;
        items
            .into_iter()
            .map(|item| {
                AppService::try_from(item).map_err(|reason| {
                    Self::normalize_error(ResourceKind::AppService, partition, reason)
                })
            })
            .collect()
    }

    async fn create_app_service(&self, service: &AppService) -> Result<(), CoreError> {
        self.client
            .create(paths::APP_SERVICE, &AppServiceItem::from(service))
            .await?;
        Ok(())
    }

    async fn update_app_service(&self, service: &AppService) -> Result<(), CoreError> {
        // Without a forced re-run the template keeps serving the old
        // rendering even though the variables changed.
        let mut item = AppServiceItem::from(service);
        item.execute_action = Some("definition".to_owned());
        self.client
            .replace(
                paths::APP_SERVICE,
                &paths::app_service_item_id(&service.partition, &service.name),
                &item,
            )
            .await?;
        Ok(())
    }

    async fn delete_app_service(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(
                paths::APP_SERVICE,
                &paths::app_service_item_id(partition, name),
            )
            .await?;
        Ok(())
    }

    async fn list_data_groups(
        &self,
        partition: &str,
    ) -> Result<Vec<InternalDataGroup>, CoreError> {
        let items: Vec<DataGroupItem> = self
            .client
            .collection(paths::DATA_GROUP_INTERNAL, partition, false)
            .await
            .map_err(|source| {
                Self::read_error(ResourceKind::InternalDataGroup, partition, source)
            })?;
        Ok(items.into_iter().map(InternalDataGroup::from).collect())
    }

    async fn create_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError> {
        self.client
            .create(paths::DATA_GROUP_INTERNAL, &DataGroupItem::from(group))
            .await?;
        Ok(())
    }

    async fn update_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::DATA_GROUP_INTERNAL,
                &paths::item_id(&group.partition, &group.name),
                &DataGroupItem::from(group),
            )
            .await?;
        Ok(())
    }

    async fn delete_data_group(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::DATA_GROUP_INTERNAL, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_arps(&self, partition: &str) -> Result<Vec<ArpEntry>, CoreError> {
        let items: Vec<ArpItem> = self
            .client
            .collection(paths::ARP, partition, false)
            .await
            .map_err(|source| Self::read_error(ResourceKind::ArpEntry, partition, source))?;
        items
            .into_iter()
            .map(|item| {
                ArpEntry::try_from(item).map_err(|reason| {
                    Self::normalize_error(ResourceKind::ArpEntry, partition, reason)
                })
            })
            .collect()
    }

    async fn create_arp(&self, entry: &ArpEntry) -> Result<(), CoreError> {
        self.client.create(paths::ARP, &ArpItem::from(entry)).await?;
        Ok(())
    }

    async fn update_arp(&self, entry: &ArpEntry) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::ARP,
                &paths::item_id(&entry.partition, &entry.name),
                &ArpItem::from(entry),
            )
            .await?;
        Ok(())
    }

    async fn delete_arp(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::ARP, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }

    async fn list_fdb_tunnels(&self, partition: &str) -> Result<Vec<FdbTunnel>, CoreError> {
        let items: Vec<FdbTunnelItem> = self
            .client
            .collection(paths::FDB_TUNNEL, partition, false)
            .await
            .map_err(|source| Self::read_error(ResourceKind::FdbTunnel, partition, source))?;
        items
            .into_iter()
            .map(|item| {
                FdbTunnel::try_from(item).map_err(|reason| {
                    Self::normalize_error(ResourceKind::FdbTunnel, partition, reason)
                })
            })
            .collect()
    }

    async fn create_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError> {
        self.client
            .create(paths::FDB_TUNNEL, &FdbTunnelItem::from(tunnel))
            .await?;
        Ok(())
    }

    async fn update_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError> {
        self.client
            .replace(
                paths::FDB_TUNNEL,
                &paths::item_id(&tunnel.partition, &tunnel.name),
                &FdbTunnelItem::from(tunnel),
            )
            .await?;
        Ok(())
    }

    async fn delete_fdb_tunnel(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.client
            .remove(paths::FDB_TUNNEL, &paths::item_id(partition, name))
            .await?;
        Ok(())
    }
}
