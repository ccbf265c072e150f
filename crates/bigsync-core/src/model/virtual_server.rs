//! Virtual servers: the listeners tying everything together.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpProtocol {
    #[default]
    Tcp,
    Udp,
    Any,
}

/// Source address translation applied to client connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceAddressTranslation {
    #[default]
    None,
    Automap,
    Snat {
        pool: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VirtualServer {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    /// Listener address in full-path form, `/Partition/address:port`.
    pub destination: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub ip_protocol: IpProtocol,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Default pool, full path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    /// Referenced profiles by full path, kept sorted. Profile lifecycle is
    /// not managed here.
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Attached L7 policies by full path, kept sorted.
    #[serde(default)]
    pub policies: Vec<String>,
    /// Attached iRules by full path. Order is execution order and is
    /// preserved as declared.
    #[serde(default)]
    pub rules: Vec<String>,
    /// VLANs the listener is restricted to, kept sorted.
    #[serde(default)]
    pub vlans: Vec<String>,
    /// Whether `vlans` is an allow list (`true`) or a deny list (`false`).
    #[serde(default)]
    pub vlans_enabled: bool,
    #[serde(default)]
    pub source_address_translation: SourceAddressTranslation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_source() -> String {
    "0.0.0.0/0".to_owned()
}

fn default_enabled() -> bool {
    true
}

impl VirtualServer {
    pub fn normalize(&mut self) {
        self.profiles.sort_unstable();
        self.policies.sort_unstable();
        self.vlans.sort_unstable();
    }
}

impl Identified for VirtualServer {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn document_defaults() {
        let parsed: VirtualServer = serde_json::from_str(
            r#"{ "name": "vs1", "destination": "/Common/10.0.0.1:80" }"#,
        )
        .unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.source, "0.0.0.0/0");
        assert_eq!(parsed.ip_protocol, IpProtocol::Tcp);
        assert_eq!(
            parsed.source_address_translation,
            SourceAddressTranslation::None
        );
    }

    #[test]
    fn snat_pool_round_trips() {
        let parsed: VirtualServer = serde_json::from_str(
            r#"{
                "name": "vs1",
                "destination": "/Common/10.0.0.1:80",
                "sourceAddressTranslation": { "type": "snat", "pool": "/Common/snat1" }
            }"#,
        )
        .unwrap();
        assert_eq!(
            parsed.source_address_translation,
            SourceAddressTranslation::Snat {
                pool: "/Common/snat1".into()
            }
        );
    }

    #[test]
    fn irule_order_survives_normalization() {
        let mut vs: VirtualServer = serde_json::from_str(
            r#"{
                "name": "vs1",
                "destination": "/Common/10.0.0.1:80",
                "rules": ["/Common/second", "/Common/first"],
                "profiles": ["/Common/tcp", "/Common/http"]
            }"#,
        )
        .unwrap();
        vs.normalize();

        assert_eq!(vs.rules, vec!["/Common/second", "/Common/first"]);
        assert_eq!(vs.profiles, vec!["/Common/http", "/Common/tcp"]);
    }
}
