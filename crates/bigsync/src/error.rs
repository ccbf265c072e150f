//! CLI error types with miette diagnostics.
//!
//! Maps core, api, and config errors into user-facing diagnostics with
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use bigsync_config::ConfigError;
use bigsync_core::{ApiError, CoreError};

/// Process exit codes.
///
/// Scripts branch on these: 3 from `diff` means drift was found, 4 means
/// the document itself is bad, 1 means the device rejected something.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const DRIFT: i32 = 3;
    pub const DOCUMENT: i32 = 4;
    pub const INTERNAL: i32 = 70;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Document ─────────────────────────────────────────────────────
    #[error("could not read service document {path}")]
    #[diagnostic(
        code(bigsync::document_io),
        help("Check that the file exists and is readable.")
    )]
    DocumentIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("service document is not valid")]
    #[diagnostic(
        code(bigsync::document),
        help(
            "Fix the document and re-run. `bigsync diff` never writes,\n\
             so it is safe for checking a document against the device."
        )
    )]
    Document(#[source] CoreError),

    #[error("{rejected} declaration(s) were rejected by validation")]
    #[diagnostic(
        code(bigsync::rejected),
        help(
            "The pass ran, but the listed declarations were excluded and their\n\
             device-side objects left untouched. Fix the document to manage them."
        )
    )]
    DocumentRejections { rejected: usize },

    // ── Pass outcomes ────────────────────────────────────────────────
    #[error("{failed} of {total} operations failed in partition {partition}")]
    #[diagnostic(
        code(bigsync::pass_failed),
        help(
            "Each failure is recorded in the pass summary above.\n\
             Passes are idempotent; re-run once the cause is fixed."
        )
    )]
    PassFailed {
        partition: String,
        failed: usize,
        total: usize,
    },

    #[error("partition {partition} has drifted: {operations} operation(s) pending")]
    #[diagnostic(code(bigsync::drift))]
    Drift {
        partition: String,
        operations: usize,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bigsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bigsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(
        code(bigsync::config),
        help("Run `bigsync config init` to create a profile, or pass --host.")
    )]
    Config(#[from] ConfigError),

    #[error("invalid value for {field}: {reason}")]
    #[diagnostic(code(bigsync::validation))]
    Validation { field: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("interactive prompt failed: {reason}")]
    #[diagnostic(
        code(bigsync::prompt),
        help("config init and set-credentials need a terminal.")
    )]
    Prompt { reason: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(bigsync::device))]
    Api(#[from] ApiError),

    #[error(transparent)]
    #[diagnostic(code(bigsync::core))]
    Core(CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentIo { .. } | Self::Document(_) | Self::DocumentRejections { .. } => {
                exit_code::DOCUMENT
            }
            Self::PassFailed { .. } | Self::Api(_) | Self::Core(_) => exit_code::FAILED,
            Self::Drift { .. } => exit_code::DRIFT,
            Self::ProfileNotFound { .. }
            | Self::Config(_)
            | Self::Validation { .. }
            | Self::Prompt { .. } => exit_code::USAGE,
            Self::Io(_) | Self::Json(_) => exit_code::INTERNAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Document(_) | CoreError::Validation(_) => Self::Document(err),
            CoreError::Api(api) => Self::Api(api),
            other => Self::Core(other),
        }
    }
}
