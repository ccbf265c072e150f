//! `bigsync diff` — render the pending plan, exit 3 on drift.

use tracing::warn;

use crate::cli::{DiffArgs, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::load_document;

pub async fn handle(
    session: &Session,
    args: DiffArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let document = load_document(&args.document)?;
    let desired = session.manager.desired(document)?;
    for rejection in &desired.rejected {
        warn!(%rejection, "declaration excluded from the plan");
    }

    let plan = session.manager.plan(&desired).await?;
    let out = output::render_plan(&global.format, &plan);
    output::print_output(&out, global.quiet);

    if plan.is_converged() {
        Ok(())
    } else {
        Err(CliError::Drift {
            partition: plan.partition.clone(),
            operations: plan.operation_count(),
        })
    }
}
