//! Identity and shared value types for managed resources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Resource identity ───────────────────────────────────────────────

/// Identity of a managed object: the administrative partition it lives in
/// plus its name. Names are opaque; a route-domain suffix (`10.2.3.5%0`)
/// is part of the name, never parsed off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub partition: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(partition: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            name: name.into(),
        }
    }

    /// Device full-path form, `/partition/name`.
    pub fn full_path(&self) -> String {
        format!("/{}/{}", self.partition, self.name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.partition, self.name)
    }
}

/// Anything with a `(partition, name)` identity.
pub trait Identified {
    fn name(&self) -> &str;
    fn partition(&self) -> &str;

    fn key(&self) -> ResourceKey {
        ResourceKey::new(self.partition(), self.name())
    }

    fn full_path(&self) -> String {
        format!("/{}/{}", self.partition(), self.name())
    }
}

// ── Administrative state ────────────────────────────────────────────

/// Desired availability of a node or pool member.
///
/// `Disabled` drains new connections but honors persistence; `ForcedOffline`
/// only lets active connections finish. Telemetry states the device reports
/// (`checking`, `down`) normalize onto these three at the wire layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminState {
    #[default]
    Enabled,
    Disabled,
    ForcedOffline,
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::ForcedOffline => "forced-offline",
        };
        f.write_str(label)
    }
}

// ── MAC addresses ───────────────────────────────────────────────────

/// A MAC address, normalized to lowercase colon-separated form so that
/// equality and hashing ignore formatting differences in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = MacAddressError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned = raw.trim().to_ascii_lowercase().replace('-', ":");
        let octets: Vec<&str> = cleaned.split(':').collect();
        if octets.len() != 6
            || octets
                .iter()
                .any(|o| o.len() != 2 || !o.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(MacAddressError {
                raw: raw.to_owned(),
            });
        }
        Ok(Self(cleaned))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The string did not look like a MAC address.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid MAC address `{raw}`")]
pub struct MacAddressError {
    pub raw: String,
}

// ── Tests ───────────────────────────────────────────────────────────
