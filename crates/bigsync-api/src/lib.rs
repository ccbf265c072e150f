//! # bigsync-api
//!
//! Async client for the BIG-IP iControl REST management interface.
//!
//! This crate knows how to talk to the device and nothing about what the
//! objects mean; the domain model and the reconciliation engine live in
//! `bigsync-core`. What it provides:
//!
//! - [`DeviceClient`] — token or basic auth, partition-filtered collection
//!   reads, item create/replace/modify/remove on `~partition~name` paths
//! - [`paths`] — the collection path catalog for the managed families
//! - [`Error`] — transport/status/decode error taxonomy
//!
//! Collections decode into caller-supplied types via serde, so the higher
//! layer picks exactly the fields it manages and drops the rest.

pub mod auth;
pub mod client;
pub mod error;
pub mod paths;

pub use auth::{AuthScheme, Credentials};
pub use client::{Connection, DeviceClient};
pub use error::Error;
