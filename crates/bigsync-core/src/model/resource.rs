//! A resource of any managed kind.
//!
//! The typed structs make cross-kind `==` unrepresentable; this enum exists
//! for the places that carry mixed kinds (plans, operation records). It
//! deliberately does not implement `PartialEq`: comparing resources of
//! different kinds is a type error, not `false`, so the only comparison is
//! the fallible [`Resource::same_as`].

use serde::Serialize;

use crate::error::TypeMismatch;
use crate::model::app_service::AppService;
use crate::model::arp::ArpEntry;
use crate::model::common::{Identified, ResourceKey};
use crate::model::data_group::InternalDataGroup;
use crate::model::fdb::FdbTunnel;
use crate::model::irule::IRule;
use crate::model::kind::ResourceKind;
use crate::model::monitor::Monitor;
use crate::model::node::Node;
use crate::model::policy::L7Policy;
use crate::model::pool::Pool;
use crate::model::virtual_address::VirtualAddress;
use crate::model::virtual_server::VirtualServer;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Resource {
    #[serde(rename = "monitor")]
    Monitor(Monitor),
    #[serde(rename = "node")]
    Node(Node),
    #[serde(rename = "pool")]
    Pool(Pool),
    #[serde(rename = "l7-policy")]
    L7Policy(L7Policy),
    #[serde(rename = "irule")]
    IRule(IRule),
    #[serde(rename = "virtual-address")]
    VirtualAddress(VirtualAddress),
    #[serde(rename = "virtual-server")]
    VirtualServer(VirtualServer),
    #[serde(rename = "app-service")]
    AppService(AppService),
    #[serde(rename = "internal-data-group")]
    InternalDataGroup(InternalDataGroup),
    #[serde(rename = "arp-entry")]
    ArpEntry(ArpEntry),
    #[serde(rename = "fdb-tunnel")]
    FdbTunnel(FdbTunnel),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Monitor(_) => ResourceKind::Monitor,
            Self::Node(_) => ResourceKind::Node,
            Self::Pool(_) => ResourceKind::Pool,
            Self::L7Policy(_) => ResourceKind::L7Policy,
            Self::IRule(_) => ResourceKind::IRule,
            Self::VirtualAddress(_) => ResourceKind::VirtualAddress,
            Self::VirtualServer(_) => ResourceKind::VirtualServer,
            Self::AppService(_) => ResourceKind::AppService,
            Self::InternalDataGroup(_) => ResourceKind::InternalDataGroup,
            Self::ArpEntry(_) => ResourceKind::ArpEntry,
            Self::FdbTunnel(_) => ResourceKind::FdbTunnel,
        }
    }

    pub fn key(&self) -> ResourceKey {
        match self {
            Self::Monitor(r) => r.key(),
            Self::Node(r) => r.key(),
            Self::Pool(r) => r.key(),
            Self::L7Policy(r) => r.key(),
            Self::IRule(r) => r.key(),
            Self::VirtualAddress(r) => r.key(),
            Self::VirtualServer(r) => r.key(),
            Self::AppService(r) => r.key(),
            Self::InternalDataGroup(r) => r.key(),
            Self::ArpEntry(r) => r.key(),
            Self::FdbTunnel(r) => r.key(),
        }
    }

    pub fn full_path(&self) -> String {
        self.key().full_path()
    }

    /// Full-property comparison of two resources of the same kind.
    ///
    /// Identity and every managed property participate, so two resources
    /// with equal names but any differing property are not the same.
    /// Comparing different kinds never answers `false`; it is an error.
    pub fn same_as(&self, other: &Self) -> Result<bool, TypeMismatch> {
        match (self, other) {
            (Self::Monitor(a), Self::Monitor(b)) => Ok(a == b),
            (Self::Node(a), Self::Node(b)) => Ok(a == b),
            (Self::Pool(a), Self::Pool(b)) => Ok(a == b),
            (Self::L7Policy(a), Self::L7Policy(b)) => Ok(a == b),
            (Self::IRule(a), Self::IRule(b)) => Ok(a == b),
            (Self::VirtualAddress(a), Self::VirtualAddress(b)) => Ok(a == b),
            (Self::VirtualServer(a), Self::VirtualServer(b)) => Ok(a == b),
            (Self::AppService(a), Self::AppService(b)) => Ok(a == b),
            (Self::InternalDataGroup(a), Self::InternalDataGroup(b)) => Ok(a == b),
            (Self::ArpEntry(a), Self::ArpEntry(b)) => Ok(a == b),
            (Self::FdbTunnel(a), Self::FdbTunnel(b)) => Ok(a == b),
            (left, right) => Err(TypeMismatch {
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Resource {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

impl_from! {
    Monitor => Monitor,
    Node => Node,
    Pool => Pool,
    L7Policy => L7Policy,
    IRule => IRule,
    VirtualAddress => VirtualAddress,
    VirtualServer => VirtualServer,
    AppService => AppService,
    InternalDataGroup => InternalDataGroup,
    ArpEntry => ArpEntry,
    FdbTunnel => FdbTunnel,
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pool(name: &str) -> Pool {
        serde_json::from_str(&format!(r#"{{ "name": "{name}", "partition": "Common" }}"#))
            .unwrap()
    }

    fn virtual_server(name: &str) -> VirtualServer {
        serde_json::from_str(&format!(
            r#"{{ "name": "{name}", "partition": "Common", "destination": "/Common/10.0.0.1:80" }}"#
        ))
        .unwrap()
    }

    #[test]
    fn same_kind_compares_by_full_property_set() {
        let a = Resource::from(pool("web"));
        let b = Resource::from(pool("web"));
        assert!(a.same_as(&b).unwrap());

        let mut different = pool("web");
        different.monitors.push("/Common/http-mon".into());
        assert!(!a.same_as(&Resource::from(different)).unwrap());
    }

    #[test]
    fn cross_kind_comparison_is_an_error_not_false() {
        let pool = Resource::from(pool("web"));
        let vs = Resource::from(virtual_server("web"));

        let err = pool.same_as(&vs).unwrap_err();
        assert_eq!(err.left, ResourceKind::Pool);
        assert_eq!(err.right, ResourceKind::VirtualServer);
    }

    #[test]
    fn kind_and_key_reflect_the_wrapped_resource() {
        let resource = Resource::from(virtual_server("vs1"));
        assert_eq!(resource.kind(), ResourceKind::VirtualServer);
        assert_eq!(resource.full_path(), "/Common/vs1");
    }
}
