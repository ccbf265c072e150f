//! `bigsync apply` — run reconciliation passes.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bigsync_core::{DesiredConfig, PassSummary};

use crate::cli::{ApplyArgs, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::load_document;

pub async fn handle(
    session: &Session,
    args: ApplyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let document = load_document(&args.document)?;
    let desired = session.manager.desired(document)?;
    for rejection in &desired.rejected {
        warn!(%rejection, "declaration excluded from this pass");
    }

    if args.dry_run {
        let plan = session.manager.plan(&desired).await?;
        let out = output::render_plan(&global.format, &plan);
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    if args.watch {
        let every = Duration::from_secs(args.interval.unwrap_or(session.interval_default));
        return watch(session, &desired, every, global).await;
    }

    let summary = session.manager.apply(&desired).await?;
    let out = output::render_summary(&global.format, &summary);
    output::print_output(&out, global.quiet);
    finish(&summary)
}

/// Map a pass outcome to the command result.
///
/// Failed operations outrank rejections: a device that refused writes is
/// the more urgent signal than a document with excluded declarations.
fn finish(summary: &PassSummary) -> Result<(), CliError> {
    let failed = summary.failed_operations();
    if failed > 0 {
        return Err(CliError::PassFailed {
            partition: summary.partition.clone(),
            failed,
            total: summary.operations.len(),
        });
    }
    if !summary.rejected.is_empty() {
        return Err(CliError::DocumentRejections {
            rejected: summary.rejected.len(),
        });
    }
    Ok(())
}

/// Reconcile on an interval until interrupted.
///
/// Pass failures never stop the loop; the next tick retries. Only ctrl-c
/// ends watch mode, and it ends it cleanly with exit 0.
async fn watch(
    session: &Session,
    desired: &DesiredConfig,
    every: Duration,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        partition = session.manager.partition(),
        every = every.as_secs(),
        "watch mode: reconciling until interrupted"
    );

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("watch mode stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                match session.manager.apply(desired).await {
                    Ok(summary) => {
                        let out = output::render_summary(&global.format, &summary);
                        output::print_output(&out, global.quiet);
                    }
                    Err(err) => error!(error = %err, "pass aborted; retrying next tick"),
                }
            }
        }
    }
}
