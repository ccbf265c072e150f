//! Transport-level error type.

use thiserror::Error;

/// Errors produced by [`DeviceClient`](crate::DeviceClient) calls.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured base URL could not be parsed or has no host.
    #[error("invalid device URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    /// Login was rejected or returned no usable token.
    #[error("authentication against {url} failed: {reason}")]
    Auth { url: String, reason: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The device answered with a non-success status.
    #[error("{method} {url} returned {status}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request body failed to serialize. Should not happen for the typed
    /// payloads this crate is given.
    #[error("failed to encode request body: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// HTTP status of the device's answer, if it got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}
