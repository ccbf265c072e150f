//! The reconciliation pass.
//!
//! One pass walks a fixed sequence of phases: read the partition inventory,
//! diff it against the desired configuration, apply creates and updates in
//! kind order, reclaim orphaned nodes, then apply deletes in reverse kind
//! order. A failed read aborts the pass before anything is written; a
//! failed operation is recorded in the summary and the pass keeps going,
//! so one broken object cannot block the rest of the partition. There are
//! no retries inside a pass; callers re-run passes on a schedule and the
//! next diff picks up whatever is still missing.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info, warn};

use crate::document::DesiredConfig;
use crate::engine::diff::Plan;
use crate::engine::order::{APPLY_ORDER, delete_order};
use crate::engine::orphan::orphaned_nodes;
use crate::error::CoreError;
use crate::model::{Resource, ResourceKind};
use crate::proxy::{DeviceProxy, read_partition};

/// Concurrent device operations per kind unless configured otherwise.
pub const DEFAULT_JOBS: usize = 4;

/// Where a pass currently is. Phases never interleave: each one depends
/// on the side effects of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PassPhase {
    Idle,
    ReadingActual,
    Diffing,
    ApplyingCreatesUpdates,
    ReclaimingOrphans,
    ApplyingDeletes,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OpAction {
    Create,
    Update,
    Delete,
}

/// One attempted device write and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRecord {
    pub kind: ResourceKind,
    pub action: OpAction,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationRecord {
    fn succeeded(kind: ResourceKind, action: OpAction, target: String) -> Self {
        Self {
            kind,
            action,
            target,
            error: None,
        }
    }

    fn failed(kind: ResourceKind, action: OpAction, target: String, error: String) -> Self {
        Self {
            kind,
            action,
            target,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// The outcome of one pass: every attempted operation plus the document
/// declarations that were rejected before the pass ran.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub partition: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub operations: Vec<OperationRecord>,
    pub rejected: Vec<String>,
}

impl PassSummary {
    fn new(partition: &str, started_at: DateTime<Utc>, rejected: Vec<String>) -> Self {
        Self {
            partition: partition.to_owned(),
            started_at,
            finished_at: started_at,
            operations: Vec::new(),
            rejected,
        }
    }

    /// Zero means the pass fully converged.
    pub fn failed_operations(&self) -> usize {
        self.operations.iter().filter(|op| op.is_failure()).count()
    }

    pub fn succeeded_operations(&self) -> usize {
        self.operations.len() - self.failed_operations()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_operations() == 0 && self.rejected.is_empty()
    }
}

/// Runs reconciliation passes against one device partition.
pub struct Deployer {
    proxy: Arc<dyn DeviceProxy>,
    jobs: usize,
}

impl Deployer {
    pub fn new(proxy: Arc<dyn DeviceProxy>) -> Self {
        Self {
            proxy,
            jobs: DEFAULT_JOBS,
        }
    }

    /// Bound on concurrent operations within one kind.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Run one full pass. A read failure aborts with an error and zero
    /// writes; everything after the read lands in the summary.
    pub async fn run(&self, desired: &DesiredConfig) -> Result<PassSummary, CoreError> {
        let started_at = Utc::now();
        let partition = desired.partition.as_str();

        info!(partition, phase = %PassPhase::ReadingActual, "reconciliation pass started");
        let actual = match read_partition(self.proxy.as_ref(), partition).await {
            Ok(state) => state,
            Err(source) => {
                error!(partition, phase = %PassPhase::Failed, error = %source, "pass aborted");
                return Err(source);
            }
        };

        debug!(partition, phase = %PassPhase::Diffing, objects = actual.total(), "diffing");
        let plan = Plan::compute(desired, &actual);

        let rejected = desired.rejected.iter().map(ToString::to_string).collect();
        let mut summary = PassSummary::new(partition, started_at, rejected);

        if plan.is_converged() {
            summary.finished_at = Utc::now();
            info!(partition, phase = %PassPhase::Done, "already converged, zero writes");
            return Ok(summary);
        }

        info!(
            partition,
            phase = %PassPhase::ApplyingCreatesUpdates,
            operations = plan.operation_count(),
            "applying creates and updates"
        );
        for kind in APPLY_ORDER {
            if let Some(kind_plan) = plan.for_kind(kind) {
                self.run_ops(kind, OpAction::Create, &kind_plan.creates, &mut summary)
                    .await;
                self.run_ops(kind, OpAction::Update, &kind_plan.updates, &mut summary)
                    .await;
            }
        }

        info!(partition, phase = %PassPhase::ReclaimingOrphans, "reclaiming orphaned nodes");
        let reclaimed = self.reclaim_orphans(desired, &mut summary).await;

        info!(partition, phase = %PassPhase::ApplyingDeletes, "applying deletes");
        for kind in delete_order() {
            let Some(kind_plan) = plan.for_kind(kind) else {
                continue;
            };
            if kind == ResourceKind::Node {
                // Planned node deletes were attempted by the reclaimer off
                // fresh inventory; touch only what it did not see.
                let remaining: Vec<Resource> = kind_plan
                    .deletes
                    .iter()
                    .filter(|node| !reclaimed.contains(&node.key().name))
                    .cloned()
                    .collect();
                self.run_ops(kind, OpAction::Delete, &remaining, &mut summary)
                    .await;
            } else {
                self.run_ops(kind, OpAction::Delete, &kind_plan.deletes, &mut summary)
                    .await;
            }
        }

        summary.finished_at = Utc::now();
        let failed = summary.failed_operations();
        if failed == 0 {
            info!(
                partition,
                phase = %PassPhase::Done,
                operations = summary.operations.len(),
                "pass converged"
            );
        } else {
            warn!(
                partition,
                phase = %PassPhase::Done,
                failed,
                operations = summary.operations.len(),
                "pass finished with failures"
            );
        }
        Ok(summary)
    }

    /// Delete nodes nothing references any more, off a node inventory taken
    /// after pool creates and updates landed. Returns every node name the
    /// reclaimer attempted, so the delete phase does not touch them again.
    async fn reclaim_orphans(
        &self,
        desired: &DesiredConfig,
        summary: &mut PassSummary,
    ) -> HashSet<String> {
        let inventory = match self.proxy.list_nodes(&desired.partition).await {
            Ok(nodes) => nodes,
            Err(source) => {
                // Creates and updates already landed; aborting now would
                // hide them. Record the miss and let the next pass reclaim.
                warn!(
                    partition = desired.partition,
                    error = %source,
                    "node inventory re-read failed, skipping reclamation"
                );
                summary.operations.push(OperationRecord::failed(
                    ResourceKind::Node,
                    OpAction::Delete,
                    format!("/{}", desired.partition),
                    format!("node inventory re-read failed: {source}"),
                ));
                return HashSet::new();
            }
        };

        let orphans = orphaned_nodes(&inventory, &desired.state.pools, &desired.unmanaged.nodes);
        let reclaimed = orphans.iter().map(|node| node.name.clone()).collect();
        let resources: Vec<Resource> = orphans.into_iter().map(Resource::from).collect();
        self.run_ops(ResourceKind::Node, OpAction::Delete, &resources, summary)
            .await;
        reclaimed
    }

    /// Issue one bounded batch of same-kind operations. Failures are
    /// recorded, never raised.
    async fn run_ops(
        &self,
        kind: ResourceKind,
        action: OpAction,
        resources: &[Resource],
        summary: &mut PassSummary,
    ) {
        if resources.is_empty() {
            return;
        }
        let futures: Vec<_> = resources
            .iter()
            .map(|resource| self.dispatch(action, resource))
            .collect();
        for (index, result) in run_batch(futures, self.jobs).await {
            let target = resources[index].full_path();
            match result {
                Ok(()) => {
                    debug!(%kind, %action, target, "operation succeeded");
                    summary
                        .operations
                        .push(OperationRecord::succeeded(kind, action, target));
                }
                Err(source) => {
                    warn!(%kind, %action, target, error = %source, "operation failed");
                    summary.operations.push(OperationRecord::failed(
                        kind,
                        action,
                        target,
                        source.to_string(),
                    ));
                }
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn dispatch(&self, action: OpAction, resource: &Resource) -> Result<(), CoreError> {
        let proxy = self.proxy.as_ref();
        match (action, resource) {
            (OpAction::Create, Resource::Monitor(r)) => proxy.create_monitor(r).await,
            (OpAction::Update, Resource::Monitor(r)) => proxy.update_monitor(r).await,
            (OpAction::Delete, Resource::Monitor(r)) => {
                proxy
                    .delete_monitor(&r.partition, &r.name, r.monitor_type)
                    .await
            }
            (OpAction::Create, Resource::Node(r)) => proxy.create_node(r).await,
            (OpAction::Update, Resource::Node(r)) => proxy.update_node(r).await,
            (OpAction::Delete, Resource::Node(r)) => {
                proxy.delete_node(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::Pool(r)) => proxy.create_pool(r).await,
            (OpAction::Update, Resource::Pool(r)) => proxy.update_pool(r).await,
            (OpAction::Delete, Resource::Pool(r)) => {
                proxy.delete_pool(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::L7Policy(r)) => proxy.create_l7_policy(r).await,
            (OpAction::Update, Resource::L7Policy(r)) => proxy.update_l7_policy(r).await,
            (OpAction::Delete, Resource::L7Policy(r)) => {
                proxy.delete_l7_policy(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::IRule(r)) => proxy.create_irule(r).await,
            (OpAction::Update, Resource::IRule(r)) => proxy.update_irule(r).await,
            (OpAction::Delete, Resource::IRule(r)) => {
                proxy.delete_irule(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::VirtualAddress(r)) => {
                proxy.create_virtual_address(r).await
            }
            (OpAction::Update, Resource::VirtualAddress(r)) => {
                proxy.update_virtual_address(r).await
            }
            (OpAction::Delete, Resource::VirtualAddress(r)) => {
                proxy.delete_virtual_address(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::VirtualServer(r)) => {
                proxy.create_virtual_server(r).await
            }
            (OpAction::Update, Resource::VirtualServer(r)) => {
                proxy.update_virtual_server(r).await
            }
            (OpAction::Delete, Resource::VirtualServer(r)) => {
                proxy.delete_virtual_server(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::AppService(r)) => proxy.create_app_service(r).await,
            (OpAction::Update, Resource::AppService(r)) => proxy.update_app_service(r).await,
            (OpAction::Delete, Resource::AppService(r)) => {
                proxy.delete_app_service(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::InternalDataGroup(r)) => {
                proxy.create_data_group(r).await
            }
            (OpAction::Update, Resource::InternalDataGroup(r)) => {
                proxy.update_data_group(r).await
            }
            (OpAction::Delete, Resource::InternalDataGroup(r)) => {
                proxy.delete_data_group(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::ArpEntry(r)) => proxy.create_arp(r).await,
            (OpAction::Update, Resource::ArpEntry(r)) => proxy.update_arp(r).await,
            (OpAction::Delete, Resource::ArpEntry(r)) => {
                proxy.delete_arp(&r.partition, &r.name).await
            }
            (OpAction::Create, Resource::FdbTunnel(r)) => proxy.create_fdb_tunnel(r).await,
            (OpAction::Update, Resource::FdbTunnel(r)) => proxy.update_fdb_tunnel(r).await,
            (OpAction::Delete, Resource::FdbTunnel(r)) => {
                proxy.delete_fdb_tunnel(&r.partition, &r.name).await
            }
        }
    }
}

/// Run same-typed futures with bounded concurrency, tagging each result
/// with its input index so failures can be attributed.
async fn run_batch<F>(futures: Vec<F>, limit: usize) -> Vec<(usize, Result<(), CoreError>)>
where
    F: Future<Output = Result<(), CoreError>>,
{
    stream::iter(
        futures
            .into_iter()
            .enumerate()
            .map(|(index, future)| async move { (index, future.await) }),
    )
    .buffer_unordered(limit.max(1))
    .collect()
    .await
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[tokio::test]
    async fn batches_attribute_results_to_their_inputs() {
        let futures: Vec<_> = (0..7)
            .map(|index| async move {
                if index % 3 == 0 {
                    Err(CoreError::Api(ApiError::Status {
                        method: "POST".into(),
                        url: "https://device/mgmt".into(),
                        status: 409,
                        message: format!("conflict on {index}"),
                    }))
                } else {
                    Ok(())
                }
            })
            .collect();

        let mut results = run_batch(futures, 2).await;
        results.sort_by_key(|(index, _)| *index);
        for (index, result) in results {
            assert_eq!(result.is_err(), index % 3 == 0, "future {index}");
        }
    }

    #[tokio::test]
    async fn a_zero_limit_still_makes_progress() {
        let futures = vec![async { Ok(()) }];
        let results = run_batch(futures, 0).await;
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn phases_render_snake_case() {
        assert_eq!(
            PassPhase::ApplyingCreatesUpdates.to_string(),
            "applying_creates_updates"
        );
        assert_eq!(PassPhase::ReclaimingOrphans.to_string(), "reclaiming_orphans");
    }

    #[test]
    fn summary_counts_failures_not_records() {
        let mut summary = PassSummary::new("Test", Utc::now(), Vec::new());
        summary.operations.push(OperationRecord::succeeded(
            ResourceKind::Pool,
            OpAction::Create,
            "/Test/web".into(),
        ));
        summary.operations.push(OperationRecord::failed(
            ResourceKind::Pool,
            OpAction::Delete,
            "/Test/old".into(),
            "409".into(),
        ));
        assert_eq!(summary.failed_operations(), 1);
        assert_eq!(summary.succeeded_operations(), 1);
        assert!(!summary.is_clean());
    }
}
