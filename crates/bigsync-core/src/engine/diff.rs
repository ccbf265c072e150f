//! Plan computation: what one pass would change.
//!
//! Both sides are name-keyed sets per kind; the plan is the classic
//! three-way split. Creates and updates carry the full desired resource
//! (the device gets the whole property mapping, never a delta); deletes
//! carry the actual device resource so later phases know everything about
//! what they are removing.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::document::DesiredConfig;
use crate::engine::order::APPLY_ORDER;
use crate::model::{Resource, ResourceKind};
use crate::state::PartitionState;

#[derive(Debug, Clone, Serialize)]
pub struct KindPlan {
    pub kind: ResourceKind,
    pub creates: Vec<Resource>,
    pub updates: Vec<Resource>,
    pub deletes: Vec<Resource>,
}

impl KindPlan {
    fn empty(kind: ResourceKind) -> Self {
        Self {
            kind,
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// Everything one pass would do, kinds held in apply order.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub partition: String,
    pub kinds: Vec<KindPlan>,
}

impl Plan {
    pub fn compute(desired: &DesiredConfig, actual: &PartitionState) -> Self {
        let kinds: Vec<KindPlan> = APPLY_ORDER
            .iter()
            .map(|kind| diff_kind(*kind, desired, actual))
            .collect();
        let plan = Self {
            partition: desired.partition.clone(),
            kinds,
        };
        debug!(
            partition = plan.partition,
            operations = plan.operation_count(),
            "plan computed"
        );
        plan
    }

    /// True when the pass would issue zero device writes.
    pub fn is_converged(&self) -> bool {
        self.kinds.iter().all(KindPlan::is_empty)
    }

    pub fn operation_count(&self) -> usize {
        self.kinds.iter().map(KindPlan::operation_count).sum()
    }

    pub fn for_kind(&self, kind: ResourceKind) -> Option<&KindPlan> {
        self.kinds.iter().find(|plan| plan.kind == kind)
    }
}

fn diff_kind(kind: ResourceKind, desired: &DesiredConfig, actual: &PartitionState) -> KindPlan {
    let unmanaged = desired.unmanaged.for_kind(kind);
    let desired = &desired.state;
    match kind {
        ResourceKind::Monitor => diff_maps(kind, &desired.monitors, &actual.monitors, unmanaged),
        ResourceKind::Node => diff_maps(kind, &desired.nodes, &actual.nodes, unmanaged),
        ResourceKind::Pool => diff_maps(kind, &desired.pools, &actual.pools, unmanaged),
        ResourceKind::L7Policy => {
            diff_maps(kind, &desired.l7_policies, &actual.l7_policies, unmanaged)
        }
        ResourceKind::IRule => diff_maps(kind, &desired.irules, &actual.irules, unmanaged),
        ResourceKind::VirtualAddress => diff_maps(
            kind,
            &desired.virtual_addresses,
            &actual.virtual_addresses,
            unmanaged,
        ),
        ResourceKind::VirtualServer => diff_maps(
            kind,
            &desired.virtual_servers,
            &actual.virtual_servers,
            unmanaged,
        ),
        ResourceKind::AppService => {
            diff_maps(kind, &desired.app_services, &actual.app_services, unmanaged)
        }
        ResourceKind::InternalDataGroup => {
            diff_maps(kind, &desired.data_groups, &actual.data_groups, unmanaged)
        }
        ResourceKind::ArpEntry => diff_maps(kind, &desired.arps, &actual.arps, unmanaged),
        ResourceKind::FdbTunnel => {
            diff_maps(kind, &desired.fdb_tunnels, &actual.fdb_tunnels, unmanaged)
        }
    }
}

/// Unmanaged names are shielded from updates and deletes; a create of a
/// declared object is always legitimate.
fn diff_maps<T>(
    kind: ResourceKind,
    desired: &IndexMap<String, T>,
    actual: &IndexMap<String, T>,
    unmanaged: &HashSet<String>,
) -> KindPlan
where
    T: Clone + PartialEq + Into<Resource>,
{
    let mut plan = KindPlan::empty(kind);
    for (name, want) in desired {
        match actual.get(name) {
            None => plan.creates.push(want.clone().into()),
            Some(have) if have != want && !unmanaged.contains(name) => {
                plan.updates.push(want.clone().into());
            }
            Some(_) => {}
        }
    }
    for (name, have) in actual {
        if !desired.contains_key(name) && !unmanaged.contains(name) {
            plan.deletes.push(have.clone().into());
        }
    }
    plan
}

// ── Tests ───────────────────────────────────────────────────────────
