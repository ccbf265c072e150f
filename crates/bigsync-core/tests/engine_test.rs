#![allow(clippy::unwrap_used)]
// Integration tests driving `Deployer` and `ServiceManager` against an
// in-memory device.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{Mutex, Semaphore};

use bigsync_core::model::{
    AppService, ArpEntry, FdbTunnel, IRule, Identified, InternalDataGroup, L7Policy, LbMode,
    Monitor, MonitorType, Node, Pool, VirtualAddress, VirtualServer,
};
use bigsync_core::{
    ApiError, CoreError, Deployer, DesiredConfig, DeviceProxy, PartitionState, PassSummary,
    ResourceKind, ServiceDocument, ServiceManager,
};

// ── Mock device ─────────────────────────────────────────────────────

#[derive(Default)]
struct OpGauge {
    active: usize,
    kind: Option<ResourceKind>,
    max: usize,
}

/// An in-memory device: partition state behind a lock, a log of every call,
/// and knobs for injecting failures, latency, and pauses.
#[derive(Default)]
struct MockDevice {
    state: Mutex<PartitionState>,
    log: Mutex<Vec<String>>,
    fail_targets: Mutex<HashSet<String>>,
    /// Kind -> number of successful reads allowed before failing.
    failing_reads: Mutex<HashMap<ResourceKind, usize>>,
    gauge: Mutex<OpGauge>,
    latency: Option<Duration>,
    pool_create_gate: Option<Arc<Semaphore>>,
}

fn status_error(method: &str, path: &str, status: u16, message: &str) -> ApiError {
    ApiError::Status {
        method: method.to_owned(),
        url: format!("https://device.test/mgmt{path}"),
        status,
        message: message.to_owned(),
    }
}

impl MockDevice {
    async fn fail_mutations_on(&self, path: &str) {
        self.fail_targets.lock().await.insert(path.to_owned());
    }

    async fn fail_reads_of(&self, kind: ResourceKind) {
        self.failing_reads.lock().await.insert(kind, 0);
    }

    async fn fail_reads_of_after(&self, kind: ResourceKind, successes: usize) {
        self.failing_reads.lock().await.insert(kind, successes);
    }

    async fn log_entries(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }

    async fn clear_log(&self) {
        self.log.lock().await.clear();
    }

    async fn mutation_count(&self) -> usize {
        self.log
            .lock()
            .await
            .iter()
            .filter(|entry| !entry.starts_with("list"))
            .count()
    }

    async fn snapshot(&self) -> PartitionState {
        self.state.lock().await.clone()
    }

    async fn max_in_flight(&self) -> usize {
        self.gauge.lock().await.max
    }

    // Reads log before failing so aborted passes leave evidence.
    async fn read(&self, kind: ResourceKind, partition: &str) -> Result<(), CoreError> {
        self.log
            .lock()
            .await
            .push(format!("list {kind} /{partition}"));
        if let Some(allowed) = self.failing_reads.lock().await.get_mut(&kind) {
            if *allowed == 0 {
                return Err(CoreError::Read {
                    kind,
                    partition: partition.to_owned(),
                    source: status_error("GET", "/tm", 500, "injected read failure"),
                });
            }
            *allowed -= 1;
        }
        Ok(())
    }

    async fn begin(&self, action: &str, kind: ResourceKind, path: &str) {
        {
            let mut gauge = self.gauge.lock().await;
            if let Some(active) = gauge.kind {
                assert_eq!(active, kind, "operations of different kinds overlapped");
            }
            gauge.kind = Some(kind);
            gauge.active += 1;
            gauge.max = gauge.max.max(gauge.active);
        }
        self.log
            .lock()
            .await
            .push(format!("{action} {kind} {path}"));
        if action == "create" && kind == ResourceKind::Pool {
            if let Some(gate) = &self.pool_create_gate {
                gate.acquire().await.unwrap().forget();
            }
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn end(&self) {
        let mut gauge = self.gauge.lock().await;
        gauge.active -= 1;
        if gauge.active == 0 {
            gauge.kind = None;
        }
    }

    async fn injected(&self, method: &str, path: &str) -> Result<(), CoreError> {
        if self.fail_targets.lock().await.contains(path) {
            return Err(CoreError::Api(status_error(
                method,
                path,
                409,
                "injected device failure",
            )));
        }
        Ok(())
    }

    async fn list<T: Clone>(
        &self,
        kind: ResourceKind,
        partition: &str,
        field: fn(&PartitionState) -> &IndexMap<String, T>,
    ) -> Result<Vec<T>, CoreError> {
        self.read(kind, partition).await?;
        let state = self.state.lock().await;
        Ok(field(&state).values().cloned().collect())
    }

    async fn insert<T: Clone + Identified>(
        &self,
        kind: ResourceKind,
        item: &T,
        field: fn(&mut PartitionState) -> &mut IndexMap<String, T>,
    ) -> Result<(), CoreError> {
        let path = item.full_path();
        self.begin("create", kind, &path).await;
        let result = match self.injected("POST", &path).await {
            Err(error) => Err(error),
            Ok(()) => {
                let mut state = self.state.lock().await;
                let map = field(&mut state);
                if map.contains_key(item.name()) {
                    Err(CoreError::Api(status_error(
                        "POST",
                        &path,
                        409,
                        "object already exists",
                    )))
                } else {
                    map.insert(item.name().to_owned(), item.clone());
                    Ok(())
                }
            }
        };
        self.end().await;
        result
    }

    async fn replace<T: Clone + Identified>(
        &self,
        kind: ResourceKind,
        item: &T,
        field: fn(&mut PartitionState) -> &mut IndexMap<String, T>,
    ) -> Result<(), CoreError> {
        let path = item.full_path();
        self.begin("update", kind, &path).await;
        let result = match self.injected("PUT", &path).await {
            Err(error) => Err(error),
            Ok(()) => {
                let mut state = self.state.lock().await;
                match field(&mut state).get_mut(item.name()) {
                    Some(slot) => {
                        *slot = item.clone();
                        Ok(())
                    }
                    None => Err(CoreError::Api(status_error(
                        "PUT",
                        &path,
                        404,
                        "no such object",
                    ))),
                }
            }
        };
        self.end().await;
        result
    }

    async fn remove<T>(
        &self,
        kind: ResourceKind,
        partition: &str,
        name: &str,
        field: fn(&mut PartitionState) -> &mut IndexMap<String, T>,
    ) -> Result<(), CoreError> {
        let path = format!("/{partition}/{name}");
        self.begin("delete", kind, &path).await;
        let result = match self.injected("DELETE", &path).await {
            Err(error) => Err(error),
            Ok(()) => {
                let mut state = self.state.lock().await;
                if field(&mut state).shift_remove(name).is_some() {
                    Ok(())
                } else {
                    Err(CoreError::Api(status_error(
                        "DELETE",
                        &path,
                        404,
                        "no such object",
                    )))
                }
            }
        };
        self.end().await;
        result
    }
}

#[async_trait]
impl DeviceProxy for MockDevice {
    async fn list_monitors(&self, partition: &str) -> Result<Vec<Monitor>, CoreError> {
        self.list(ResourceKind::Monitor, partition, |s| &s.monitors)
            .await
    }
    async fn create_monitor(&self, monitor: &Monitor) -> Result<(), CoreError> {
        self.insert(ResourceKind::Monitor, monitor, |s| &mut s.monitors)
            .await
    }
    async fn update_monitor(&self, monitor: &Monitor) -> Result<(), CoreError> {
        self.replace(ResourceKind::Monitor, monitor, |s| &mut s.monitors)
            .await
    }
    async fn delete_monitor(
        &self,
        partition: &str,
        name: &str,
        _monitor_type: MonitorType,
    ) -> Result<(), CoreError> {
        self.remove(ResourceKind::Monitor, partition, name, |s| &mut s.monitors)
            .await
    }

    async fn list_nodes(&self, partition: &str) -> Result<Vec<Node>, CoreError> {
        self.list(ResourceKind::Node, partition, |s| &s.nodes).await
    }
    async fn create_node(&self, node: &Node) -> Result<(), CoreError> {
        self.insert(ResourceKind::Node, node, |s| &mut s.nodes).await
    }
    async fn update_node(&self, node: &Node) -> Result<(), CoreError> {
        self.replace(ResourceKind::Node, node, |s| &mut s.nodes).await
    }
    async fn delete_node(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::Node, partition, name, |s| &mut s.nodes)
            .await
    }

    async fn list_pools(&self, partition: &str) -> Result<Vec<Pool>, CoreError> {
        self.list(ResourceKind::Pool, partition, |s| &s.pools).await
    }
    async fn create_pool(&self, pool: &Pool) -> Result<(), CoreError> {
        self.insert(ResourceKind::Pool, pool, |s| &mut s.pools).await
    }
    async fn update_pool(&self, pool: &Pool) -> Result<(), CoreError> {
        self.replace(ResourceKind::Pool, pool, |s| &mut s.pools).await
    }
    async fn delete_pool(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::Pool, partition, name, |s| &mut s.pools)
            .await
    }

    async fn list_l7_policies(&self, partition: &str) -> Result<Vec<L7Policy>, CoreError> {
        self.list(ResourceKind::L7Policy, partition, |s| &s.l7_policies)
            .await
    }
    async fn create_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError> {
        self.insert(ResourceKind::L7Policy, policy, |s| &mut s.l7_policies)
            .await
    }
    async fn update_l7_policy(&self, policy: &L7Policy) -> Result<(), CoreError> {
        self.replace(ResourceKind::L7Policy, policy, |s| &mut s.l7_policies)
            .await
    }
    async fn delete_l7_policy(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::L7Policy, partition, name, |s| {
            &mut s.l7_policies
        })
        .await
    }

    async fn list_irules(&self, partition: &str) -> Result<Vec<IRule>, CoreError> {
        self.list(ResourceKind::IRule, partition, |s| &s.irules).await
    }
    async fn create_irule(&self, irule: &IRule) -> Result<(), CoreError> {
        self.insert(ResourceKind::IRule, irule, |s| &mut s.irules)
            .await
    }
    async fn update_irule(&self, irule: &IRule) -> Result<(), CoreError> {
        self.replace(ResourceKind::IRule, irule, |s| &mut s.irules)
            .await
    }
    async fn delete_irule(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::IRule, partition, name, |s| &mut s.irules)
            .await
    }

    async fn list_virtual_addresses(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualAddress>, CoreError> {
        self.list(ResourceKind::VirtualAddress, partition, |s| {
            &s.virtual_addresses
        })
        .await
    }
    async fn create_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError> {
        self.insert(ResourceKind::VirtualAddress, address, |s| {
            &mut s.virtual_addresses
        })
        .await
    }
    async fn update_virtual_address(&self, address: &VirtualAddress) -> Result<(), CoreError> {
        self.replace(ResourceKind::VirtualAddress, address, |s| {
            &mut s.virtual_addresses
        })
        .await
    }
    async fn delete_virtual_address(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::VirtualAddress, partition, name, |s| {
            &mut s.virtual_addresses
        })
        .await
    }

    async fn list_virtual_servers(
        &self,
        partition: &str,
    ) -> Result<Vec<VirtualServer>, CoreError> {
        self.list(ResourceKind::VirtualServer, partition, |s| {
            &s.virtual_servers
        })
        .await
    }
    async fn create_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError> {
        self.insert(ResourceKind::VirtualServer, server, |s| {
            &mut s.virtual_servers
        })
        .await
    }
    async fn update_virtual_server(&self, server: &VirtualServer) -> Result<(), CoreError> {
        self.replace(ResourceKind::VirtualServer, server, |s| {
            &mut s.virtual_servers
        })
        .await
    }
    async fn delete_virtual_server(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::VirtualServer, partition, name, |s| {
            &mut s.virtual_servers
        })
        .await
    }

    async fn list_app_services(&self, partition: &str) -> Result<Vec<AppService>, CoreError> {
        self.list(ResourceKind::AppService, partition, |s| &s.app_services)
            .await
    }
    async fn create_app_service(&self, service: &AppService) -> Result<(), CoreError> {
        self.insert(ResourceKind::AppService, service, |s| &mut s.app_services)
            .await
    }
    async fn update_app_service(&self, service: &AppService) -> Result<(), CoreError> {
        self.replace(ResourceKind::AppService, service, |s| &mut s.app_services)
            .await
    }
    async fn delete_app_service(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::AppService, partition, name, |s| {
            &mut s.app_services
        })
        .await
    }

    async fn list_data_groups(
        &self,
        partition: &str,
    ) -> Result<Vec<InternalDataGroup>, CoreError> {
        self.list(ResourceKind::InternalDataGroup, partition, |s| {
            &s.data_groups
        })
        .await
    }
    async fn create_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError> {
        self.insert(ResourceKind::InternalDataGroup, group, |s| {
            &mut s.data_groups
        })
        .await
    }
    async fn update_data_group(&self, group: &InternalDataGroup) -> Result<(), CoreError> {
        self.replace(ResourceKind::InternalDataGroup, group, |s| {
            &mut s.data_groups
        })
        .await
    }
    async fn delete_data_group(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::InternalDataGroup, partition, name, |s| {
            &mut s.data_groups
        })
        .await
    }

    async fn list_arps(&self, partition: &str) -> Result<Vec<ArpEntry>, CoreError> {
        self.list(ResourceKind::ArpEntry, partition, |s| &s.arps).await
    }
    async fn create_arp(&self, entry: &ArpEntry) -> Result<(), CoreError> {
        self.insert(ResourceKind::ArpEntry, entry, |s| &mut s.arps)
            .await
    }
    async fn update_arp(&self, entry: &ArpEntry) -> Result<(), CoreError> {
        self.replace(ResourceKind::ArpEntry, entry, |s| &mut s.arps)
            .await
    }
    async fn delete_arp(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::ArpEntry, partition, name, |s| &mut s.arps)
            .await
    }

    async fn list_fdb_tunnels(&self, partition: &str) -> Result<Vec<FdbTunnel>, CoreError> {
        self.list(ResourceKind::FdbTunnel, partition, |s| &s.fdb_tunnels)
            .await
    }
    async fn create_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError> {
        self.insert(ResourceKind::FdbTunnel, tunnel, |s| &mut s.fdb_tunnels)
            .await
    }
    async fn update_fdb_tunnel(&self, tunnel: &FdbTunnel) -> Result<(), CoreError> {
        self.replace(ResourceKind::FdbTunnel, tunnel, |s| &mut s.fdb_tunnels)
            .await
    }
    async fn delete_fdb_tunnel(&self, partition: &str, name: &str) -> Result<(), CoreError> {
        self.remove(ResourceKind::FdbTunnel, partition, name, |s| {
            &mut s.fdb_tunnels
        })
        .await
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// A document exercising every managed kind. Pool members derive the two
/// desired nodes `10.2.3.4` and `10.2.3.5%0`.
const FULL_DOC: &str = r#"{
    "monitors": [
        { "name": "web-http", "type": "http" },
        { "name": "ping", "type": "icmp", "interval": 10, "timeout": 31 }
    ],
    "pools": [
        {
            "name": "web-pool",
            "monitors": ["/Test/web-http"],
            "members": [
                { "address": "10.2.3.4", "port": 80 },
                { "address": "10.2.3.5%0", "port": 8080 }
            ]
        }
    ],
    "l7Policies": [
        {
            "name": "ingress",
            "controls": ["forwarding"],
            "requires": ["http"],
            "rules": [
                {
                    "name": "api",
                    "conditions": [
                        { "operand": "httpUri", "match": "startsWith", "values": ["/api"] }
                    ],
                    "actions": [{ "type": "forward", "pool": "/Test/web-pool" }]
                }
            ]
        }
    ],
    "iRules": [
        {
            "name": "redirect",
            "definition": "when HTTP_REQUEST { HTTP::redirect https://[HTTP::host][HTTP::uri] }"
        }
    ],
    "virtualAddresses": [
        { "name": "192.0.2.10", "address": "192.0.2.10" }
    ],
    "virtualServers": [
        {
            "name": "web-vs",
            "destination": "/Test/192.0.2.10:80",
            "pool": "/Test/web-pool",
            "profiles": ["/Common/http", "/Common/tcp"],
            "policies": ["/Test/ingress"],
            "rules": ["/Test/redirect"]
        }
    ],
    "iapps": [
        { "name": "shop", "template": "/Common/f5.http" }
    ],
    "internalDataGroups": [
        {
            "name": "routes",
            "type": "string",
            "records": [{ "name": "a", "data": "1" }]
        }
    ],
    "arps": [
        { "name": "10.1.0.5", "ipAddress": "10.1.0.5", "macAddress": "0a:0b:0c:0d:0e:0f" }
    ],
    "fdbTunnels": [
        {
            "name": "vxlan0",
            "records": [{ "name": "0a:0b:0c:0d:0e:10", "endpoint": "10.10.10.1" }]
        }
    ]
}"#;

/// Objects FULL_DOC converges to: 13 including the two derived nodes.
const FULL_DOC_OBJECTS: usize = 13;

fn full_desired() -> DesiredConfig {
    DesiredConfig::from_json(FULL_DOC, "Test").unwrap()
}

fn empty_desired() -> DesiredConfig {
    DesiredConfig::from_json("{}", "Test").unwrap()
}

async fn run_pass(device: &Arc<MockDevice>, desired: &DesiredConfig) -> PassSummary {
    Deployer::new(Arc::clone(device) as Arc<dyn DeviceProxy>)
        .run(desired)
        .await
        .unwrap()
}

fn position(log: &[String], needle: &str) -> usize {
    log.iter()
        .position(|entry| entry.contains(needle))
        .unwrap_or_else(|| panic!("`{needle}` not found in log:\n{log:#?}"))
}

fn count(log: &[String], needle: &str) -> usize {
    log.iter().filter(|entry| entry.contains(needle)).count()
}

async fn wait_for(device: &MockDevice, needle: &str) {
    for _ in 0..400 {
        if count(&device.log_entries().await, needle) >= 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for `{needle}` in the device log");
}

// ── Convergence ─────────────────────────────────────────────────────

#[tokio::test]
async fn converges_an_empty_partition_to_the_document() {
    let device = Arc::new(MockDevice::default());
    let summary = run_pass(&device, &full_desired()).await;

    assert_eq!(summary.failed_operations(), 0);
    assert_eq!(summary.operations.len(), FULL_DOC_OBJECTS);
    assert!(summary.is_clean());

    let state = device.snapshot().await;
    assert_eq!(state.total(), FULL_DOC_OBJECTS);
    assert_eq!(state.monitors.len(), 2);
    assert_eq!(state.nodes.len(), 2);
    assert!(state.pools.contains_key("web-pool"));
    assert!(state.virtual_servers.contains_key("web-vs"));
    assert!(state.fdb_tunnels.contains_key("vxlan0"));
}

#[tokio::test]
async fn a_second_pass_issues_zero_operations() {
    let device = Arc::new(MockDevice::default());
    let desired = full_desired();
    run_pass(&device, &desired).await;
    device.clear_log().await;

    let summary = run_pass(&device, &desired).await;

    assert!(summary.operations.is_empty());
    assert_eq!(summary.failed_operations(), 0);
    assert_eq!(device.mutation_count().await, 0);
}

#[tokio::test]
async fn emptying_the_document_tears_everything_down() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;
    device.clear_log().await;

    let summary = run_pass(&device, &empty_desired()).await;

    assert_eq!(summary.failed_operations(), 0);
    assert_eq!(device.snapshot().await.total(), 0);
}

// ── Ordering ────────────────────────────────────────────────────────

#[tokio::test]
async fn creates_follow_dependency_order() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;

    let log = device.log_entries().await;
    let order = [
        "create monitor",
        "create node",
        "create pool",
        "create l7-policy",
        "create irule",
        "create virtual-address",
        "create virtual-server",
        "create app-service",
        "create internal-data-group",
        "create arp-entry",
        "create fdb-tunnel",
    ];
    for pair in order.windows(2) {
        assert!(
            position(&log, pair[0]) < position(&log, pair[1]),
            "expected `{}` before `{}`:\n{log:#?}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test]
async fn deletes_run_in_reverse_dependency_order() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;
    device.clear_log().await;

    run_pass(&device, &empty_desired()).await;

    let log = device.log_entries().await;
    // Nodes go first: reclamation runs before the delete phase.
    let order = [
        "delete node",
        "delete fdb-tunnel",
        "delete arp-entry",
        "delete internal-data-group",
        "delete app-service",
        "delete virtual-server",
        "delete virtual-address",
        "delete irule",
        "delete l7-policy",
        "delete pool",
        "delete monitor",
    ];
    for pair in order.windows(2) {
        assert!(
            position(&log, pair[0]) < position(&log, pair[1]),
            "expected `{}` before `{}`:\n{log:#?}",
            pair[0],
            pair[1]
        );
    }
    // The delete phase must not retry nodes the reclaimer already removed.
    assert_eq!(count(&log, "delete node /Test/10.2.3.4"), 1);
    assert_eq!(count(&log, "delete node /Test/10.2.3.5%0"), 1);
}

// ── Orphaned node reclamation ───────────────────────────────────────

#[tokio::test]
async fn referenced_nodes_are_never_reclaimed() {
    let device = Arc::new(MockDevice::default());
    let desired = full_desired();
    run_pass(&device, &desired).await;
    device.clear_log().await;

    run_pass(&device, &desired).await;

    let log = device.log_entries().await;
    assert_eq!(count(&log, "delete node"), 0);
    let state = device.snapshot().await;
    assert!(state.nodes.contains_key("10.2.3.4"));
    assert!(state.nodes.contains_key("10.2.3.5%0"));
}

#[tokio::test]
async fn unreferenced_nodes_are_reclaimed_between_apply_and_delete() {
    let device = Arc::new(MockDevice::default());
    let desired = full_desired();
    run_pass(&device, &desired).await;

    // Plant an orphan and a stale pool the next pass must clean up.
    {
        let mut state = device.state.lock().await;
        state
            .nodes
            .insert("10.9.9.9".into(), Node::from_member_address("Test", "10.9.9.9"));
        let stale: Pool = serde_json::from_str(
            r#"{ "name": "old-pool", "partition": "Test" }"#,
        )
        .unwrap();
        state.pools.insert("old-pool".into(), stale);
    }
    device.clear_log().await;

    let summary = run_pass(&device, &desired).await;

    assert_eq!(summary.failed_operations(), 0);
    let log = device.log_entries().await;
    // Reclamation works from a fresh inventory and precedes the delete phase.
    assert_eq!(count(&log, "list node"), 2);
    assert!(
        position(&log, "delete node /Test/10.9.9.9") < position(&log, "delete pool /Test/old-pool"),
        "reclamation must run before the delete phase:\n{log:#?}"
    );

    let state = device.snapshot().await;
    assert!(!state.nodes.contains_key("10.9.9.9"));
    assert!(state.nodes.contains_key("10.2.3.4"));
    assert!(state.nodes.contains_key("10.2.3.5%0"));
    assert!(!state.pools.contains_key("old-pool"));
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn a_failed_operation_is_recorded_and_siblings_proceed() {
    let device = Arc::new(MockDevice::default());
    device.fail_mutations_on("/Test/web-http").await;

    let summary = run_pass(&device, &full_desired()).await;

    assert_eq!(summary.failed_operations(), 1);
    assert_eq!(summary.succeeded_operations(), FULL_DOC_OBJECTS - 1);

    let failure = summary
        .operations
        .iter()
        .find(|op| op.is_failure())
        .unwrap();
    assert_eq!(failure.target, "/Test/web-http");
    assert!(failure.error.as_deref().unwrap().contains("409"));

    // The sibling monitor and every later kind still landed.
    let state = device.snapshot().await;
    assert!(!state.monitors.contains_key("web-http"));
    assert!(state.monitors.contains_key("ping"));
    assert!(state.pools.contains_key("web-pool"));
    assert!(state.virtual_servers.contains_key("web-vs"));
}

#[tokio::test]
async fn a_read_failure_aborts_the_pass_before_any_write() {
    let device = Arc::new(MockDevice::default());
    device.fail_reads_of(ResourceKind::Pool).await;

    let proxy: Arc<dyn DeviceProxy> = Arc::clone(&device) as Arc<dyn DeviceProxy>;
    let error = Deployer::new(proxy).run(&full_desired()).await.unwrap_err();

    assert!(error.is_pass_fatal());
    assert!(matches!(
        error,
        CoreError::Read {
            kind: ResourceKind::Pool,
            ..
        }
    ));
    assert_eq!(device.mutation_count().await, 0);
    assert_eq!(device.snapshot().await.total(), 0);
}

#[tokio::test]
async fn a_failed_inventory_reread_is_recorded_and_planned_deletes_still_run() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;
    {
        let mut state = device.state.lock().await;
        state
            .nodes
            .insert("10.9.9.9".into(), Node::from_member_address("Test", "10.9.9.9"));
    }
    device.clear_log().await;
    // Initial read succeeds; the reclaim re-read fails.
    device.fail_reads_of_after(ResourceKind::Node, 1).await;

    let summary = run_pass(&device, &full_desired()).await;

    assert_eq!(summary.failed_operations(), 1);
    let failure = summary
        .operations
        .iter()
        .find(|op| op.is_failure())
        .unwrap();
    assert!(failure.error.as_deref().unwrap().contains("re-read"));

    // The orphan was planned for deletion off the initial read, so the
    // delete phase still removes it, after the rest of the teardown order.
    let log = device.log_entries().await;
    assert_eq!(count(&log, "delete node /Test/10.9.9.9"), 1);
    assert!(!device.snapshot().await.nodes.contains_key("10.9.9.9"));
}

// ── Updates ─────────────────────────────────────────────────────────

#[tokio::test]
async fn drift_is_corrected_with_full_property_updates() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;

    // Drift: the pool loses its monitor and a member's ratio on-device.
    {
        let mut state = device.state.lock().await;
        let pool = state.pools.get_mut("web-pool").unwrap();
        pool.monitors.clear();
        pool.members[0].ratio = 9;
        pool.load_balancing_mode = LbMode::RatioMember;
    }
    device.clear_log().await;

    let desired = full_desired();
    let summary = run_pass(&device, &desired).await;

    assert_eq!(summary.failed_operations(), 0);
    assert_eq!(summary.operations.len(), 1);
    assert_eq!(summary.operations[0].target, "/Test/web-pool");

    // The update carried the entire desired object, not a patch.
    let state = device.snapshot().await;
    assert_eq!(state.pools["web-pool"], desired.state.pools["web-pool"]);
}

// ── Unmanaged names ─────────────────────────────────────────────────

#[tokio::test]
async fn unmanaged_names_shield_objects_from_update_and_delete() {
    let device = Arc::new(MockDevice::default());
    run_pass(&device, &full_desired()).await;

    // Device-side objects the document does not declare.
    {
        let mut state = device.state.lock().await;
        let legacy: Monitor = serde_json::from_str(
            r#"{ "name": "legacy-mon", "partition": "Test", "type": "tcp" }"#,
        )
        .unwrap();
        state.monitors.insert("legacy-mon".into(), legacy.lenient());
        state
            .nodes
            .insert("10.9.9.9".into(), Node::from_member_address("Test", "10.9.9.9"));
    }
    device.clear_log().await;

    let mut document: serde_json::Value = serde_json::from_str(FULL_DOC).unwrap();
    document["unmanaged"] = serde_json::json!({
        "monitors": ["legacy-mon"],
        "nodes": ["10.9.9.9"]
    });
    let desired = DesiredConfig::from_json(&document.to_string(), "Test").unwrap();

    let summary = run_pass(&device, &desired).await;

    assert!(summary.is_clean());
    assert!(summary.operations.is_empty());
    let state = device.snapshot().await;
    assert!(state.monitors.contains_key("legacy-mon"));
    assert!(state.nodes.contains_key("10.9.9.9"));
}

// ── Validation rejection ────────────────────────────────────────────

#[tokio::test]
async fn a_rejected_monitor_is_excluded_while_the_pass_proceeds() {
    let device = Arc::new(MockDevice::default());
    {
        // The device already holds the object the bad declaration names.
        let mut state = device.state.lock().await;
        let existing: Monitor = serde_json::from_str(
            r#"{ "name": "bad", "partition": "Test", "type": "udp", "interval": 40, "timeout": 12 }"#,
        )
        .unwrap();
        state.monitors.insert("bad".into(), existing.lenient());
    }

    let text = r#"{
        "monitors": [
            { "name": "bad", "type": "udp", "interval": 30, "timeout": 10 },
            { "name": "good", "type": "tcp" }
        ]
    }"#;
    let desired = DesiredConfig::from_json(text, "Test").unwrap();
    let summary = run_pass(&device, &desired).await;

    assert_eq!(summary.rejected.len(), 1);
    assert!(summary.rejected[0].contains("bad"));
    assert_eq!(summary.failed_operations(), 0);

    let state = device.snapshot().await;
    // The rejected declaration neither updated nor deleted its object.
    assert_eq!(state.monitors["bad"].interval, 40);
    assert!(state.monitors.contains_key("good"));
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn within_a_kind_operations_run_bounded_and_isolated() {
    let monitors: Vec<String> = (0..6)
        .map(|i| format!(r#"{{ "name": "m{i}", "type": "tcp" }}"#))
        .collect();
    let text = format!(r#"{{ "monitors": [{}] }}"#, monitors.join(","));
    let desired = DesiredConfig::from_json(&text, "Test").unwrap();

    let device = Arc::new(MockDevice {
        latency: Some(Duration::from_millis(20)),
        ..MockDevice::default()
    });
    let summary = Deployer::new(Arc::clone(&device) as Arc<dyn DeviceProxy>)
        .with_jobs(2)
        .run(&desired)
        .await
        .unwrap();

    assert_eq!(summary.failed_operations(), 0);
    // Kind isolation is asserted inside the mock; here only the bound.
    assert_eq!(device.max_in_flight().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_applies_serialize_behind_the_partition_lock() {
    let gate = Arc::new(Semaphore::new(0));
    let device = Arc::new(MockDevice {
        pool_create_gate: Some(Arc::clone(&gate)),
        ..MockDevice::default()
    });

    let text = r#"{
        "pools": [
            { "name": "web", "members": [{ "address": "10.0.0.1", "port": 80 }] }
        ]
    }"#;
    let desired = DesiredConfig::from_json(text, "Test").unwrap();

    let manager = Arc::new(ServiceManager::new(
        Arc::clone(&device) as Arc<dyn DeviceProxy>,
        "Test",
    ));

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        let desired = desired.clone();
        async move { manager.apply(&desired).await.unwrap() }
    });

    // Wait until the first pass is parked inside create_pool, mid-pass,
    // still holding the partition lock.
    wait_for(&device, "create pool").await;

    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        let desired = desired.clone();
        async move { manager.apply(&desired).await.unwrap() }
    });

    // Give the second pass ample time to misbehave if it could.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let lists = count(&device.log_entries().await, "list");
    assert_eq!(lists, 11, "second pass must queue behind the lock");

    gate.add_permits(1);
    let first_summary = first.await.unwrap();
    let second_summary = second.await.unwrap();

    assert!(first_summary.is_clean());
    assert_eq!(first_summary.operations.len(), 2);
    assert!(
        second_summary.operations.is_empty(),
        "a pass that starts after convergence has nothing to do"
    );
    assert!(device.snapshot().await.pools.contains_key("web"));
}

#[tokio::test]
async fn manager_plan_and_status_never_write() {
    let device = Arc::new(MockDevice::default());
    let manager = ServiceManager::new(Arc::clone(&device) as Arc<dyn DeviceProxy>, "Test");

    let document: ServiceDocument = serde_json::from_str(FULL_DOC).unwrap();
    let desired = manager.desired(document).unwrap();
    let plan = manager.plan(&desired).await.unwrap();

    assert_eq!(plan.operation_count(), FULL_DOC_OBJECTS);
    assert!(!plan.is_converged());
    assert_eq!(device.mutation_count().await, 0);

    let state = manager.status().await.unwrap();
    assert_eq!(state.total(), 0);
    assert_eq!(device.mutation_count().await, 0);
}
