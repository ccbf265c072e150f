//! Declarative reconciliation engine for BIG-IP partitions.
//!
//! This crate owns the domain model, the desired/actual diff, and the
//! deployment machinery between `bigsync-api` and consumers (CLI or
//! embedding services):
//!
//! - **[`ServiceDocument`] / [`DesiredConfig`]** — A JSON service document
//!   parsed, validated, and bound to one partition. Declarations that fail
//!   validation are dropped from the desired set (and shielded from the
//!   pass) rather than failing the whole document.
//!
//! - **[`PartitionState`]** — Name-keyed object sets per kind; both the
//!   desired and the device-read side of a diff use this shape.
//!
//! - **[`Plan`]** — The per-kind create/update/delete sets a pass would
//!   execute, computed by full-property comparison. An empty plan means the
//!   partition is converged.
//!
//! - **[`Deployer`] / [`ServiceManager`]** — One reconciliation pass: read
//!   the partition, diff, apply creates and updates in dependency order,
//!   reclaim orphaned nodes, delete leftovers in reverse order. Operation
//!   failures are recorded in the [`PassSummary`], never raised mid-pass.
//!
//! - **[`DeviceProxy`]** — The flat per-kind list/create/update/delete
//!   surface the engine drives; [`RestDeviceProxy`] implements it over
//!   iControl REST, and tests substitute their own.

pub mod document;
pub mod engine;
pub mod error;
pub mod manager;
pub mod model;
pub mod proxy;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use document::{DesiredConfig, DocumentValidation, ServiceDocument, UnmanagedNames};
pub use engine::{
    APPLY_ORDER, DEFAULT_JOBS, Deployer, KindPlan, OpAction, OperationRecord, PassPhase,
    PassSummary, Plan, delete_order,
};
pub use error::{ApiError, CoreError, DocumentError, TypeMismatch, ValidationError};
pub use manager::ServiceManager;
pub use proxy::{DeviceProxy, RestDeviceProxy, read_partition};
pub use state::PartitionState;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AdminState,
    AppService,
    ArpEntry,
    DataGroupRecord,
    FdbRecord,
    FdbTunnel,
    IRule,
    InternalDataGroup,
    IpProtocol,
    L7Action,
    L7Condition,
    L7Policy,
    L7Rule,
    LbMode,
    MacAddress,
    Monitor,
    MonitorType,
    Node,
    Pool,
    PoolMember,
    Resource,
    ResourceKey,
    ResourceKind,
    SourceAddressTranslation,
    VirtualAddress,
    VirtualServer,
};
