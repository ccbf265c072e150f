//! Per-partition orchestration.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::document::{DesiredConfig, ServiceDocument};
use crate::engine::deploy::{DEFAULT_JOBS, Deployer, PassSummary};
use crate::engine::diff::Plan;
use crate::error::CoreError;
use crate::proxy::{DeviceProxy, read_partition};
use crate::state::PartitionState;

/// Owns reconciliation for one administrative partition.
///
/// Passes against the same partition must not overlap: the delete phase of
/// one pass racing the create phase of another would tear down objects the
/// other just made. [`ServiceManager::apply`] serializes passes behind a
/// partition-wide lock; `plan` and `status` only read and take no lock.
pub struct ServiceManager {
    proxy: Arc<dyn DeviceProxy>,
    partition: String,
    jobs: usize,
    pass_lock: Mutex<()>,
}

impl ServiceManager {
    pub fn new(proxy: Arc<dyn DeviceProxy>, partition: impl Into<String>) -> Self {
        Self {
            proxy,
            partition: partition.into(),
            jobs: DEFAULT_JOBS,
            pass_lock: Mutex::new(()),
        }
    }

    /// Bound on concurrent device operations within one kind.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Bind a document to this partition, dropping declarations that fail
    /// validation. The result is what [`ServiceManager::apply`] and
    /// [`ServiceManager::plan`] expect.
    pub fn desired(&self, document: ServiceDocument) -> Result<DesiredConfig, CoreError> {
        DesiredConfig::from_document(document, &self.partition)
    }

    /// Run one reconciliation pass. Concurrent callers queue behind the
    /// partition lock, each running a complete pass in turn.
    pub async fn apply(&self, desired: &DesiredConfig) -> Result<PassSummary, CoreError> {
        let _guard = self.pass_lock.lock().await;
        debug!(partition = self.partition, "partition lock acquired");
        Deployer::new(Arc::clone(&self.proxy))
            .with_jobs(self.jobs)
            .run(desired)
            .await
    }

    /// Compute the plan a pass would execute right now, without writing
    /// anything.
    pub async fn plan(&self, desired: &DesiredConfig) -> Result<Plan, CoreError> {
        let actual = read_partition(self.proxy.as_ref(), &self.partition).await?;
        Ok(Plan::compute(desired, &actual))
    }

    /// Read the partition's current inventory.
    pub async fn status(&self) -> Result<PartitionState, CoreError> {
        read_partition(self.proxy.as_ref(), &self.partition).await
    }
}
