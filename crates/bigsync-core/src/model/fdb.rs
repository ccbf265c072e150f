//! FDB tunnel records: MAC-to-VTEP forwarding entries on overlay tunnels.

use serde::{Deserialize, Serialize};

use crate::model::common::{Identified, MacAddress};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FdbRecord {
    /// The MAC being forwarded.
    pub name: MacAddress,
    /// Tunnel endpoint address the MAC lives behind.
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FdbTunnel {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    /// Forwarding records, kept sorted by MAC.
    #[serde(default)]
    pub records: Vec<FdbRecord>,
}

impl FdbTunnel {
    pub fn normalize(&mut self) {
        self.records.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Identified for FdbTunnel {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn records_sort_by_mac() {
        let mut tunnel: FdbTunnel = serde_json::from_str(
            r#"{
                "name": "vxlan0",
                "records": [
                    { "name": "0a:0b:0c:0d:0e:02", "endpoint": "10.9.0.2" },
                    { "name": "0a:0b:0c:0d:0e:01", "endpoint": "10.9.0.1" }
                ]
            }"#,
        )
        .unwrap();
        tunnel.normalize();
        assert_eq!(tunnel.records[0].endpoint, "10.9.0.1");
    }
}
