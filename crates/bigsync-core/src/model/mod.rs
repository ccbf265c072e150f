//! Typed domain model for the managed object kinds.
//!
//! Every kind is its own struct with serde-facing defaults; equality and
//! hashing always cover identity plus the full managed property set. The
//! canonical form (sorted sets, computed member names) comes from each
//! type's `normalize`, applied identically to desired and actual state.

pub mod app_service;
pub mod arp;
pub mod common;
pub mod data_group;
pub mod fdb;
pub mod irule;
pub mod kind;
pub mod monitor;
pub mod node;
pub mod policy;
pub mod pool;
pub mod resource;
pub mod virtual_address;
pub mod virtual_server;

pub use app_service::{AppService, IAppTable, IAppVariable};
pub use arp::ArpEntry;
pub use common::{AdminState, Identified, MacAddress, MacAddressError, ResourceKey};
pub use data_group::{DataGroupRecord, DataGroupType, InternalDataGroup};
pub use fdb::{FdbRecord, FdbTunnel};
pub use irule::IRule;
pub use kind::ResourceKind;
pub use monitor::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, Monitor, MonitorType};
pub use node::{Node, NodeAdminState};
pub use policy::{L7Action, L7Condition, L7Match, L7Operand, L7Policy, L7Rule};
pub use pool::{LbMode, Pool, PoolMember};
pub use resource::Resource;
pub use virtual_address::VirtualAddress;
pub use virtual_server::{IpProtocol, SourceAddressTranslation, VirtualServer};
