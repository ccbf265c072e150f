//! Collection paths for the managed object families.
//!
//! Everything the engine touches lives under `/mgmt` on the device. LTM
//! traffic objects sit in `tm/ltm`, L2/L3 plumbing in `tm/net`, and iApp
//! instances in `tm/sys/application`.

pub const VIRTUAL: &str = "tm/ltm/virtual";
pub const POOL: &str = "tm/ltm/pool";
pub const NODE: &str = "tm/ltm/node";
pub const POLICY: &str = "tm/ltm/policy";
pub const RULE: &str = "tm/ltm/rule";
pub const VIRTUAL_ADDRESS: &str = "tm/ltm/virtual-address";
pub const DATA_GROUP_INTERNAL: &str = "tm/ltm/data-group/internal";

pub const MONITOR_HTTP: &str = "tm/ltm/monitor/http";
pub const MONITOR_HTTPS: &str = "tm/ltm/monitor/https";
pub const MONITOR_TCP: &str = "tm/ltm/monitor/tcp";
pub const MONITOR_UDP: &str = "tm/ltm/monitor/udp";
pub const MONITOR_GATEWAY_ICMP: &str = "tm/ltm/monitor/gateway-icmp";

pub const ARP: &str = "tm/net/arp";
pub const FDB_TUNNEL: &str = "tm/net/fdb/tunnel";

pub const APP_SERVICE: &str = "tm/sys/application/service";

/// Item identifier in the device's full-path form, `~partition~name`.
///
/// The name is kept verbatim; route-domain suffixes (`10.2.3.5%0`) are part
/// of the identity and get percent-encoded at the URL layer, not here.
pub fn item_id(partition: &str, name: &str) -> String {
    format!("~{partition}~{name}")
}

/// iApp instances nest under their own application folder, so the item path
/// repeats the name with an `.app` component.
pub fn app_service_item_id(partition: &str, name: &str) -> String {
    format!("~{partition}~{name}.app~{name}")
}
