//! Kind-level apply ordering.
//!
//! Kinds form a static reference graph: pools point at monitors and nodes,
//! virtual servers point at pools, policies, rules, and addresses. Creates
//! and updates walk [`APPLY_ORDER`] so every referent exists before its
//! referrer; deletes walk the exact reverse so referrers disappear first.

use crate::model::ResourceKind;

/// Create/update order for one pass.
pub const APPLY_ORDER: [ResourceKind; 11] = [
    ResourceKind::Monitor,
    ResourceKind::Node,
    ResourceKind::Pool,
    ResourceKind::L7Policy,
    ResourceKind::IRule,
    ResourceKind::VirtualAddress,
    ResourceKind::VirtualServer,
    ResourceKind::AppService,
    ResourceKind::InternalDataGroup,
    ResourceKind::ArpEntry,
    ResourceKind::FdbTunnel,
];

/// Delete order: the exact reverse of [`APPLY_ORDER`].
pub fn delete_order() -> impl Iterator<Item = ResourceKind> {
    APPLY_ORDER.into_iter().rev()
}

// ── Tests ───────────────────────────────────────────────────────────
