//! `bigsync status` — connectivity check plus partition object counts.

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.manager.status().await?;
    let out = output::render_status(&global.format, session.manager.partition(), &state);
    output::print_output(&out, global.quiet);
    Ok(())
}
