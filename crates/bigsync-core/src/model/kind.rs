//! The managed object kinds.

use serde::Serialize;
use strum::Display;

/// Every kind of object the engine manages. Comparisons across kinds are
/// rejected at the [`Resource`](crate::model::Resource) layer; the apply and
/// delete ordering over kinds lives in [`engine::order`](crate::engine::order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    #[strum(serialize = "monitor")]
    Monitor,
    #[strum(serialize = "node")]
    Node,
    #[strum(serialize = "pool")]
    Pool,
    #[strum(serialize = "l7-policy")]
    L7Policy,
    #[strum(serialize = "irule")]
    #[serde(rename = "irule")]
    IRule,
    #[strum(serialize = "virtual-address")]
    VirtualAddress,
    #[strum(serialize = "virtual-server")]
    VirtualServer,
    #[strum(serialize = "app-service")]
    AppService,
    #[strum(serialize = "internal-data-group")]
    InternalDataGroup,
    #[strum(serialize = "arp-entry")]
    ArpEntry,
    #[strum(serialize = "fdb-tunnel")]
    FdbTunnel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_kebab_case() {
        assert_eq!(ResourceKind::VirtualServer.to_string(), "virtual-server");
        assert_eq!(ResourceKind::IRule.to_string(), "irule");
        assert_eq!(ResourceKind::L7Policy.to_string(), "l7-policy");
    }
}
