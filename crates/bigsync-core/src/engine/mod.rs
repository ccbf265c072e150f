//! Reconciliation: diff the desired configuration against device state and
//! drive the device toward it in dependency order.

pub mod deploy;
pub mod diff;
pub mod order;
pub mod orphan;

pub use deploy::{DEFAULT_JOBS, Deployer, OpAction, OperationRecord, PassPhase, PassSummary};
pub use diff::{KindPlan, Plan};
pub use order::{APPLY_ORDER, delete_order};
