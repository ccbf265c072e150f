//! Service document reader.
//!
//! A service document is the JSON declaration of everything one partition
//! should contain. Parsing is strict: unknown fields anywhere are rejected,
//! omissions get kind-specific defaults, and structural rules (bounds,
//! duplicates, required strings) are checked before any device interaction.
//! Resource-level invariant failures are softer than structural ones: the
//! offending object is excluded from the desired set and reported, and the
//! rest of the document still converges.
//!
//! The reader owns the one piece of derived state: desired nodes are
//! computed from desired pool members, never declared.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CoreError, DocumentError, ValidationError};
use crate::model::{
    AdminState, AppService, ArpEntry, FdbTunnel, IRule, InternalDataGroup, L7Policy, Monitor,
    Node, NodeAdminState, Pool, ResourceKind, VirtualAddress, VirtualServer,
};
use crate::state::PartitionState;

// ── Document shape ──────────────────────────────────────────────────

/// Which monitor construction variant the document asks for: `strict`
/// refuses timing the device API would refuse, `lenient` accepts anything
/// the console would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentValidation {
    #[default]
    Strict,
    Lenient,
}

/// Names the engine must leave alone even when they drift or disappear
/// from the document: excluded from update and delete candidacy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct UnmanagedNames {
    pub monitors: HashSet<String>,
    pub nodes: HashSet<String>,
    pub pools: HashSet<String>,
    pub l7_policies: HashSet<String>,
    pub i_rules: HashSet<String>,
    pub virtual_addresses: HashSet<String>,
    pub virtual_servers: HashSet<String>,
    pub iapps: HashSet<String>,
    pub internal_data_groups: HashSet<String>,
    pub arps: HashSet<String>,
    pub fdb_tunnels: HashSet<String>,
}

impl UnmanagedNames {
    pub fn for_kind(&self, kind: ResourceKind) -> &HashSet<String> {
        match kind {
            ResourceKind::Monitor => &self.monitors,
            ResourceKind::Node => &self.nodes,
            ResourceKind::Pool => &self.pools,
            ResourceKind::L7Policy => &self.l7_policies,
            ResourceKind::IRule => &self.i_rules,
            ResourceKind::VirtualAddress => &self.virtual_addresses,
            ResourceKind::VirtualServer => &self.virtual_servers,
            ResourceKind::AppService => &self.iapps,
            ResourceKind::InternalDataGroup => &self.internal_data_groups,
            ResourceKind::ArpEntry => &self.arps,
            ResourceKind::FdbTunnel => &self.fdb_tunnels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
            && self.nodes.is_empty()
            && self.pools.is_empty()
            && self.l7_policies.is_empty()
            && self.i_rules.is_empty()
            && self.virtual_addresses.is_empty()
            && self.virtual_servers.is_empty()
            && self.iapps.is_empty()
            && self.internal_data_groups.is_empty()
            && self.arps.is_empty()
            && self.fdb_tunnels.is_empty()
    }
}

/// Raw serde form of the document. Section names follow the device's own
/// vocabulary (`iapps` for application services).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct ServiceDocument {
    pub validation: DocumentValidation,
    pub monitors: Vec<Monitor>,
    pub pools: Vec<Pool>,
    pub l7_policies: Vec<L7Policy>,
    pub i_rules: Vec<IRule>,
    pub virtual_addresses: Vec<VirtualAddress>,
    pub virtual_servers: Vec<VirtualServer>,
    pub iapps: Vec<AppService>,
    pub internal_data_groups: Vec<InternalDataGroup>,
    pub arps: Vec<ArpEntry>,
    pub fdb_tunnels: Vec<FdbTunnel>,
    pub unmanaged: UnmanagedNames,
}

// ── Desired configuration ───────────────────────────────────────────

/// A validated, normalized desired state for one partition.
///
/// `rejected` lists resources that failed an invariant at construction
/// and were excluded from the desired set. Their names are also folded
/// into `unmanaged` so a pass leaves the device-side object untouched
/// until the declaration is fixed.
#[derive(Debug, Clone)]
pub struct DesiredConfig {
    pub partition: String,
    pub state: PartitionState,
    pub unmanaged: UnmanagedNames,
    pub rejected: Vec<ValidationError>,
}

impl DesiredConfig {
    pub fn from_json(text: &str, partition: &str) -> Result<Self, CoreError> {
        let document: ServiceDocument =
            serde_json::from_str(text).map_err(|source| DocumentError::Parse { source })?;
        Self::from_document(document, partition)
    }

    #[allow(clippy::too_many_lines)]
    pub fn from_document(document: ServiceDocument, partition: &str) -> Result<Self, CoreError> {
        let mut state = PartitionState::new();
        let mut unmanaged = document.unmanaged;
        let mut rejected = Vec::new();

        for (index, mut monitor) in document.monitors.into_iter().enumerate() {
            let path = format!("monitors[{index}]");
            require_name(&monitor.name, &path)?;
            require(
                monitor.interval >= 1,
                format!("{path}.interval"),
                "must be at least 1",
            )?;
            require(
                monitor.timeout >= 1,
                format!("{path}.timeout"),
                "must be at least 1",
            )?;
            monitor.partition = partition.to_owned();
            let monitor = match document.validation {
                DocumentValidation::Strict => {
                    let name = monitor.name.clone();
                    match monitor.strict() {
                        Ok(monitor) => monitor,
                        Err(error) => {
                            warn!(%error, "monitor excluded from desired state");
                            unmanaged.monitors.insert(name);
                            rejected.push(error);
                            continue;
                        }
                    }
                }
                DocumentValidation::Lenient => monitor.lenient(),
            };
            insert_unique(&mut state.monitors, monitor.name.clone(), monitor, "monitors")?;
        }

        for (index, mut pool) in document.pools.into_iter().enumerate() {
            let path = format!("pools[{index}]");
            require_name(&pool.name, &path)?;
            for (member_index, member) in pool.members.iter().enumerate() {
                require(
                    !member.address.trim().is_empty(),
                    format!("{path}.members[{member_index}].address"),
                    "must not be empty",
                )?;
            }
            pool.partition = partition.to_owned();
            pool.normalize();
            insert_unique(&mut state.pools, pool.name.clone(), pool, "pools")?;
        }

        for (index, mut policy) in document.l7_policies.into_iter().enumerate() {
            let path = format!("l7Policies[{index}]");
            require_name(&policy.name, &path)?;
            policy.partition = partition.to_owned();
            policy.normalize();
            insert_unique(&mut state.l7_policies, policy.name.clone(), policy, "l7Policies")?;
        }

        for (index, mut irule) in document.i_rules.into_iter().enumerate() {
            let path = format!("iRules[{index}]");
            require_name(&irule.name, &path)?;
            require(
                !irule.definition.trim().is_empty(),
                format!("{path}.definition"),
                "must not be empty",
            )?;
            irule.partition = partition.to_owned();
            insert_unique(&mut state.irules, irule.name.clone(), irule, "iRules")?;
        }

        for (index, mut address) in document.virtual_addresses.into_iter().enumerate() {
            let path = format!("virtualAddresses[{index}]");
            require_name(&address.name, &path)?;
            require(
                !address.address.trim().is_empty(),
                format!("{path}.address"),
                "must not be empty",
            )?;
            address.partition = partition.to_owned();
            insert_unique(
                &mut state.virtual_addresses,
                address.name.clone(),
                address,
                "virtualAddresses",
            )?;
        }

        for (index, mut vs) in document.virtual_servers.into_iter().enumerate() {
            let path = format!("virtualServers[{index}]");
            require_name(&vs.name, &path)?;
            require(
                !vs.destination.trim().is_empty(),
                format!("{path}.destination"),
                "must not be empty",
            )?;
            vs.partition = partition.to_owned();
            vs.normalize();
            insert_unique(&mut state.virtual_servers, vs.name.clone(), vs, "virtualServers")?;
        }

        for (index, mut app) in document.iapps.into_iter().enumerate() {
            let path = format!("iapps[{index}]");
            require_name(&app.name, &path)?;
            require(
                !app.template.trim().is_empty(),
                format!("{path}.template"),
                "must not be empty",
            )?;
            app.partition = partition.to_owned();
            app.normalize();
            insert_unique(&mut state.app_services, app.name.clone(), app, "iapps")?;
        }

        for (index, mut group) in document.internal_data_groups.into_iter().enumerate() {
            let path = format!("internalDataGroups[{index}]");
            require_name(&group.name, &path)?;
            group.partition = partition.to_owned();
            group.normalize();
            insert_unique(
                &mut state.data_groups,
                group.name.clone(),
                group,
                "internalDataGroups",
            )?;
        }

        for (index, mut arp) in document.arps.into_iter().enumerate() {
            let path = format!("arps[{index}]");
            require_name(&arp.name, &path)?;
            require(
                !arp.ip_address.trim().is_empty(),
                format!("{path}.ipAddress"),
                "must not be empty",
            )?;
            arp.partition = partition.to_owned();
            insert_unique(&mut state.arps, arp.name.clone(), arp, "arps")?;
        }

        for (index, mut tunnel) in document.fdb_tunnels.into_iter().enumerate() {
            let path = format!("fdbTunnels[{index}]");
            require_name(&tunnel.name, &path)?;
            tunnel.partition = partition.to_owned();
            tunnel.normalize();
            insert_unique(&mut state.fdb_tunnels, tunnel.name.clone(), tunnel, "fdbTunnels")?;
        }

        state.nodes = derive_nodes(partition, &state.pools);

        debug!(
            partition,
            objects = state.total(),
            nodes = state.nodes.len(),
            rejected = rejected.len(),
            "service document accepted"
        );

        Ok(Self {
            partition: partition.to_owned(),
            state,
            unmanaged,
            rejected,
        })
    }
}

/// Desired nodes, computed from desired pool members. A node is disabled
/// only when every member referencing its address is drained; a single
/// enabled member keeps the node enabled.
fn derive_nodes(partition: &str, pools: &IndexMap<String, Pool>) -> IndexMap<String, Node> {
    let mut nodes: IndexMap<String, Node> = IndexMap::new();
    for pool in pools.values() {
        for member in &pool.members {
            let node = nodes
                .entry(member.address.clone())
                .or_insert_with(|| Node {
                    admin_state: NodeAdminState::Disabled,
                    ..Node::from_member_address(partition, &member.address)
                });
            if member.admin_state == AdminState::Enabled {
                node.admin_state = NodeAdminState::Enabled;
            }
        }
    }
    nodes
}

// ── Validation helpers ──────────────────────────────────────────────

fn require(condition: bool, path: String, reason: &str) -> Result<(), DocumentError> {
    if condition {
        Ok(())
    } else {
        Err(DocumentError::Invalid {
            path,
            reason: reason.to_owned(),
        })
    }
}

fn require_name(name: &str, path: &str) -> Result<(), DocumentError> {
    require(
        !name.trim().is_empty(),
        format!("{path}.name"),
        "must not be empty",
    )
}

fn insert_unique<T>(
    map: &mut IndexMap<String, T>,
    name: String,
    value: T,
    section: &str,
) -> Result<(), DocumentError> {
    if map.contains_key(&name) {
        return Err(DocumentError::Invalid {
            path: section.to_owned(),
            reason: format!("duplicate name `{name}`"),
        });
    }
    map.insert(name, value);
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::MonitorType;

    const DOCUMENT: &str = r#"{
        "monitors": [
            { "name": "web-http", "type": "http" },
            { "name": "ping", "type": "icmp", "interval": 10, "timeout": 31 }
        ],
        "pools": [
            {
                "name": "web-pool",
                "monitors": ["/Tenant1/web-http"],
                "members": [
                    { "address": "10.2.3.4", "port": 80 },
                    { "address": "10.2.3.5%0", "port": 8080, "adminState": "disabled" }
                ]
            }
        ],
        "virtualServers": [
            {
                "name": "web-vs",
                "destination": "/Tenant1/192.0.2.10:80",
                "pool": "/Tenant1/web-pool"
            }
        ],
        "unmanaged": { "monitors": ["builtin-http"] }
    }"#;

    #[test]
    fn accepts_a_complete_document_and_injects_partition() {
        let config = DesiredConfig::from_json(DOCUMENT, "Tenant1").unwrap();

        assert_eq!(config.partition, "Tenant1");
        assert_eq!(config.state.monitors.len(), 2);
        assert_eq!(config.state.pools.len(), 1);
        assert_eq!(config.state.virtual_servers.len(), 1);
        assert!(config.state.pools["web-pool"].partition == "Tenant1");
        assert!(config.unmanaged.monitors.contains("builtin-http"));
        assert!(config.rejected.is_empty());

        let monitor = &config.state.monitors["web-http"];
        assert_eq!(monitor.monitor_type, MonitorType::Http);
        assert_eq!(monitor.interval, 5);
        assert_eq!(monitor.timeout, 16);
    }

    #[test]
    fn desired_nodes_are_derived_from_members() {
        let config = DesiredConfig::from_json(DOCUMENT, "Tenant1").unwrap();

        let nodes = &config.state.nodes;
        assert_eq!(nodes.len(), 2);
        assert!(nodes.contains_key("10.2.3.4"));
        assert!(nodes.contains_key("10.2.3.5%0"));
        assert_eq!(nodes["10.2.3.4"].admin_state, NodeAdminState::Enabled);
        // Every member on that address is drained, so the node is too.
        assert_eq!(nodes["10.2.3.5%0"].admin_state, NodeAdminState::Disabled);
    }

    #[test]
    fn node_stays_enabled_while_any_member_is_enabled() {
        let text = r#"{
            "pools": [
                { "name": "a", "members": [{ "address": "10.0.0.1", "port": 80, "adminState": "disabled" }] },
                { "name": "b", "members": [{ "address": "10.0.0.1", "port": 81 }] }
            ]
        }"#;
        let config = DesiredConfig::from_json(text, "Common").unwrap();
        assert_eq!(
            config.state.nodes["10.0.0.1"].admin_state,
            NodeAdminState::Enabled
        );
    }

    #[test]
    fn unknown_top_level_sections_are_rejected() {
        let err = DesiredConfig::from_json(r#"{ "virtualServres": [] }"#, "Common").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Document(DocumentError::Parse { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected_with_the_section() {
        let text = r#"{
            "pools": [ { "name": "web" }, { "name": "web" } ]
        }"#;
        let err = DesiredConfig::from_json(text, "Common").unwrap_err();
        match err {
            CoreError::Document(DocumentError::Invalid { path, reason }) => {
                assert_eq!(path, "pools");
                assert!(reason.contains("web"));
            }
            other => panic!("expected Invalid, got: {other:?}"),
        }
    }

    #[test]
    fn strict_timing_failure_excludes_only_that_monitor() {
        let text = r#"{
            "monitors": [
                { "name": "bad", "type": "udp", "interval": 30, "timeout": 10 },
                { "name": "good", "type": "tcp" }
            ]
        }"#;
        let config = DesiredConfig::from_json(text, "Common").unwrap();

        assert_eq!(config.rejected.len(), 1);
        assert!(!config.state.monitors.contains_key("bad"));
        assert!(config.state.monitors.contains_key("good"));
        // The device-side object must survive the pass untouched.
        assert!(config.unmanaged.monitors.contains("bad"));
    }

    #[test]
    fn lenient_documents_accept_console_timing() {
        let text = r#"{
            "validation": "lenient",
            "monitors": [{ "name": "m", "type": "udp", "interval": 30, "timeout": 10 }]
        }"#;
        let config = DesiredConfig::from_json(text, "Common").unwrap();
        assert_eq!(config.state.monitors["m"].interval, 30);
        assert!(config.rejected.is_empty());
    }

    #[test]
    fn zero_interval_is_a_document_error_even_when_lenient() {
        let text = r#"{
            "validation": "lenient",
            "monitors": [{ "name": "m", "type": "tcp", "interval": 0 }]
        }"#;
        let err = DesiredConfig::from_json(text, "Common").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Document(DocumentError::Invalid { .. })
        ));
    }

    #[test]
    fn empty_document_is_a_valid_empty_desired_state() {
        let config = DesiredConfig::from_json("{}", "Common").unwrap();
        assert_eq!(config.state.total(), 0);
        assert!(config.unmanaged.is_empty());
    }
}
