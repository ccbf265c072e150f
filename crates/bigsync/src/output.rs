//! Output rendering: tables for humans, JSON for scripts.
//!
//! `--format table` paints create/update/delete rows when stdout is a
//! terminal; the JSON formats serialize the engine's own structures so
//! scripts see every recorded field.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use bigsync_core::{APPLY_ORDER, OpAction, PartitionState, PassSummary, Plan, Resource};

use crate::cli::OutputFormat;

// ── Plan ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Object")]
    object: String,
}

pub fn render_plan(format: &OutputFormat, plan: &Plan) -> String {
    match format {
        OutputFormat::Table => plan_table(plan),
        OutputFormat::Json => render_json_pretty(plan),
        OutputFormat::JsonCompact => render_json_compact(plan),
    }
}

fn plan_table(plan: &Plan) -> String {
    if plan.is_converged() {
        return format!("partition {} is converged; nothing to do", plan.partition);
    }

    let color = should_color();
    let mut rows = Vec::new();
    for kind in &plan.kinds {
        for resource in &kind.creates {
            rows.push(plan_row(OpAction::Create, resource, color));
        }
        for resource in &kind.updates {
            rows.push(plan_row(OpAction::Update, resource, color));
        }
        for resource in &kind.deletes {
            rows.push(plan_row(OpAction::Delete, resource, color));
        }
    }

    let table = render_table(&rows);
    format!(
        "{table}\n{} operation(s) pending in partition {}",
        plan.operation_count(),
        plan.partition
    )
}

fn plan_row(action: OpAction, resource: &Resource, color: bool) -> PlanRow {
    PlanRow {
        action: paint(action, &action.to_string(), color),
        kind: resource.kind().to_string(),
        object: resource.full_path(),
    }
}

// ── Pass summary ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Object")]
    object: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

pub fn render_summary(format: &OutputFormat, summary: &PassSummary) -> String {
    match format {
        OutputFormat::Table => summary_table(summary),
        OutputFormat::Json => render_json_pretty(summary),
        OutputFormat::JsonCompact => render_json_compact(summary),
    }
}

fn summary_table(summary: &PassSummary) -> String {
    let elapsed = (summary.finished_at - summary.started_at).num_milliseconds();

    if summary.operations.is_empty() && summary.rejected.is_empty() {
        return format!(
            "partition {} is converged; nothing to do ({elapsed} ms)",
            summary.partition
        );
    }

    let color = should_color();
    let rows: Vec<SummaryRow> = summary
        .operations
        .iter()
        .map(|op| SummaryRow {
            action: paint(op.action, &op.action.to_string(), color),
            kind: op.kind.to_string(),
            object: op.target.clone(),
            outcome: match &op.error {
                None => ok_text(color),
                Some(reason) => fail_text(reason, color),
            },
        })
        .collect();

    let mut out = String::new();
    if !rows.is_empty() {
        out.push_str(&render_table(&rows));
        out.push('\n');
    }
    for rejection in &summary.rejected {
        out.push_str(&format!("rejected: {rejection}\n"));
    }
    out.push_str(&format!(
        "partition {}: {} operation(s), {} failed, {} rejected ({elapsed} ms)",
        summary.partition,
        summary.operations.len(),
        summary.failed_operations(),
        summary.rejected.len(),
    ));
    out
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Count")]
    count: usize,
}

pub fn render_status(format: &OutputFormat, partition: &str, state: &PartitionState) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<CountRow> = APPLY_ORDER
                .iter()
                .map(|kind| CountRow {
                    kind: kind.to_string(),
                    count: state.count(*kind),
                })
                .collect();
            let table = render_table(&rows);
            format!("{table}\npartition {partition}: {} object(s)", state.total())
        }
        OutputFormat::Json => render_json_pretty(&status_value(partition, state)),
        OutputFormat::JsonCompact => render_json_compact(&status_value(partition, state)),
    }
}

fn status_value(partition: &str, state: &PartitionState) -> serde_json::Value {
    let objects: serde_json::Map<String, serde_json::Value> = APPLY_ORDER
        .iter()
        .map(|kind| (kind.to_string(), state.count(*kind).into()))
        .collect();
    serde_json::json!({
        "partition": partition,
        "objects": objects,
        "total": state.total(),
    })
}

// ── Shared helpers ───────────────────────────────────────────────────

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

// ── Color helpers ────────────────────────────────────────────────────

fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

fn paint(action: OpAction, text: &str, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match action {
        OpAction::Create => text.green().to_string(),
        OpAction::Update => text.yellow().to_string(),
        OpAction::Delete => text.red().to_string(),
    }
}

fn ok_text(color: bool) -> String {
    if color {
        "ok".green().to_string()
    } else {
        "ok".to_owned()
    }
}

fn fail_text(reason: &str, color: bool) -> String {
    let text = format!("failed: {reason}");
    if color { text.red().to_string() } else { text }
}
