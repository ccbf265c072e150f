//! Command handlers: bridge parsed args to the service manager.

pub mod apply;
pub mod config_cmd;
pub mod diff;
pub mod status;

use std::path::Path;

use bigsync_core::{DocumentError, ServiceDocument};

use crate::error::CliError;

/// Read and parse a service document from disk.
pub(crate) fn load_document(path: &Path) -> Result<ServiceDocument, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::DocumentIo {
        path: path.display().to_string(),
        source,
    })?;
    let document = serde_json::from_str(&text)
        .map_err(|source| CliError::Document(DocumentError::Parse { source }.into()))?;
    Ok(document)
}
