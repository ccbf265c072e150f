//! Health monitors.
//!
//! All five monitor types share the timing pair: `interval` seconds between
//! probes, `timeout` seconds before a member is marked down. The device API
//! refuses an interval at or above the timeout, while the console accepts
//! any figures an operator types, so construction comes in the same two
//! strictness variants via [`Monitor::strict`] and [`Monitor::lenient`].

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::ValidationError;
use crate::model::common::Identified;

pub const DEFAULT_INTERVAL: u32 = 5;
pub const DEFAULT_TIMEOUT: u32 = 16;

/// Which probe the monitor sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonitorType {
    Http,
    Https,
    Tcp,
    Udp,
    Icmp,
}

impl MonitorType {
    /// ICMP probes have no payload; everything else exchanges send/recv
    /// strings.
    pub fn uses_send_recv(self) -> bool {
        !matches!(self, Self::Icmp)
    }

    fn default_send(self) -> &'static str {
        match self {
            Self::Http | Self::Https => "GET /\r\n",
            Self::Tcp | Self::Udp | Self::Icmp => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Monitor {
    pub name: String,
    #[serde(default)]
    pub partition: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<String>,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT
}

impl Monitor {
    /// Finish construction with device-API validation: an interval at or
    /// above the timeout is rejected the way the REST API rejects it.
    pub fn strict(self) -> Result<Self, ValidationError> {
        let monitor = self.normalized();
        if monitor.interval >= monitor.timeout {
            return Err(ValidationError::MonitorTiming {
                monitor: monitor.full_path(),
                interval: monitor.interval,
                timeout: monitor.timeout,
            });
        }
        Ok(monitor)
    }

    /// Finish construction accepting whatever timing the device console
    /// would; only defaults are injected.
    pub fn lenient(self) -> Self {
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.monitor_type.uses_send_recv() {
            if self.send.is_none() {
                self.send = Some(self.monitor_type.default_send().to_owned());
            }
            if self.recv.is_none() {
                self.recv = Some(String::new());
            }
        } else {
            self.send = None;
            self.recv = None;
        }
        self
    }
}

impl Identified for Monitor {
    fn name(&self) -> &str {
        &self.name
    }
    fn partition(&self) -> &str {
        &self.partition
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn udp(interval: u32, timeout: u32) -> Monitor {
        Monitor {
            name: "udp-mon".into(),
            partition: "Common".into(),
            monitor_type: MonitorType::Udp,
            interval,
            timeout,
            send: None,
            recv: None,
        }
    }

    #[test]
    fn omitted_timing_gets_injected_defaults() {
        let parsed: Monitor =
            serde_json::from_str(r#"{ "name": "m1", "type": "udp" }"#).unwrap();
        let monitor = parsed.strict().unwrap();
        assert_eq!(monitor.interval, 5);
        assert_eq!(monitor.timeout, 16);
        assert_eq!(monitor.send.as_deref(), Some(""));
        assert_eq!(monitor.recv.as_deref(), Some(""));
    }

    #[test]
    fn strict_rejects_interval_at_or_above_timeout() {
        let err = udp(30, 10).strict().unwrap_err();
        match err {
            ValidationError::MonitorTiming {
                interval, timeout, ..
            } => {
                assert_eq!(interval, 30);
                assert_eq!(timeout, 10);
            }
        }
        assert!(udp(16, 16).strict().is_err());
    }

    #[test]
    fn lenient_accepts_console_style_timing() {
        let monitor = udp(30, 10).lenient();
        assert_eq!(monitor.interval, 30);
        assert_eq!(monitor.timeout, 10);
    }

    #[test]
    fn http_monitors_default_to_a_get_probe() {
        let parsed: Monitor =
            serde_json::from_str(r#"{ "name": "web", "type": "http" }"#).unwrap();
        let monitor = parsed.strict().unwrap();
        assert_eq!(monitor.send.as_deref(), Some("GET /\r\n"));
    }

    #[test]
    fn icmp_monitors_carry_no_payload() {
        let parsed: Monitor = serde_json::from_str(
            r#"{ "name": "ping", "type": "icmp", "send": "ignored" }"#,
        )
        .unwrap();
        let monitor = parsed.strict().unwrap();
        assert_eq!(monitor.send, None);
        assert_eq!(monitor.recv, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Monitor, _> =
            serde_json::from_str(r#"{ "name": "m1", "type": "tcp", "intreval": 5 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn equality_covers_every_property() {
        let a = udp(5, 16).lenient();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.recv = Some("UP".into());
        assert_ne!(a, b);
    }
}
