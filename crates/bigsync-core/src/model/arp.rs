//! Static ARP entries.

use serde::{Deserialize, Serialize};

use crate::model::common::{Identified, MacAddress};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ArpEntry {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    pub ip_address: String,
    pub mac_address: MacAddress,
}

impl Identified for ArpEntry {
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
    fn mac_formatting_differences_compare_equal() {
        let a: ArpEntry = serde_json::from_str(
            r#"{ "name": "10.1.0.5", "ipAddress": "10.1.0.5", "macAddress": "0A-0B-0C-0D-0E-0F" }"#,
        )
        .unwrap();
        let b: ArpEntry = serde_json::from_str(
            r#"{ "name": "10.1.0.5", "ipAddress": "10.1.0.5", "macAddress": "0a:0b:0c:0d:0e:0f" }"#,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_mac_is_a_parse_error() {
        let result: Result<ArpEntry, _> = serde_json::from_str(
            r#"{ "name": "10.1.0.5", "ipAddress": "10.1.0.5", "macAddress": "not-a-mac" }"#,
        );
        assert!(result.is_err());
    }
}
