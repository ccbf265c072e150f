//! Internal data groups: device-resident key/value tables for iRules.

use serde::{Deserialize, Serialize};

use crate::model::common::Identified;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataGroupType {
    String,
    Ip,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DataGroupRecord {
    pub name: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct InternalDataGroup {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(rename = "type")]
    pub dg_type: DataGroupType,
    /// Records, kept sorted by name; the device treats them as a set.
    #[serde(default)]
    pub records: Vec<DataGroupRecord>,
}

impl InternalDataGroup {
    pub fn normalize(&mut self) {
        self.records.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    }
}

impl Identified for InternalDataGroup {
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
    fn record_order_does_not_affect_equality_after_normalize() {
        let mut a: InternalDataGroup = serde_json::from_str(
            r#"{
                "name": "routes",
                "type": "string",
                "records": [
                    { "name": "b", "data": "2" },
                    { "name": "a", "data": "1" }
                ]
            }"#,
        )
        .unwrap();
        let mut b = a.clone();
        b.records.reverse();

        a.normalize();
        b.normalize();
        assert_eq!(a, b);
        assert_eq!(a.records[0].name, "a");
    }
}
