//! Operator-facing report text. Every function returns the rendered block so
//! callers decide where it goes.

use crate::rollback::RollbackOutcome;
use crate::{CascadeTarget, DeletePlan, ExecutionReport};

use bi_core::ResourceKind;
use bi_core::resource::{resource_id, value_text};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

pub const DRY_RUN_HINT: &str = "To proceed with deletion, run with: --dry-run=false --confirm=DELETE";

pub fn render_no_matches() -> String {
    String::from("No dashboards match the specified filters.\n")
}

pub fn render_abort() -> String {
    String::from("Deletion aborted. Pass --confirm=DELETE to proceed with deletion.\n")
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}

fn dashboard_line(dashboard: &Value) -> String {
    let title = ["dashboard_title", "title"]
        .iter()
        .map(|key| value_text(dashboard.get(*key)))
        .find(|title| !title.is_empty())
        .unwrap_or_else(|| String::from("Unknown"));
    let slug = match dashboard.get("slug") {
        None => String::from("n/a"),
        value => value_text(value),
    };
    let id = resource_id(dashboard).map_or_else(|| String::from("?"), |id| id.to_string());
    format!("  - [ID: {id}] {title} (slug: {slug})")
}

fn cascade_section(
    out: &mut String,
    kind: ResourceKind,
    target: &CascadeTarget,
    context: Option<&BTreeMap<i64, Vec<String>>>,
) {
    let title = kind.title();
    if !target.requested {
        push_line(out, format!("\n{title} (0): (not cascading)"));
        return;
    }

    push_line(out, format!("\n{title} ({}):", target.ids.len()));
    for id in &target.ids {
        let label = target
            .names
            .get(id)
            .map(|name| format!(" {name}"))
            .unwrap_or_default();
        let dashboards = context
            .and_then(|context| context.get(id))
            .map(|titles| match titles.as_slice() {
                [] => String::new(),
                [single] => format!(" (dashboard: {single})"),
                many => format!(" (dashboards: {})", many.join(", ")),
            })
            .unwrap_or_default();
        push_line(out, format!("  - [ID: {id}]{label}{dashboards}"));
    }
}

fn shared_line(out: &mut String, title: &str, uuids: &BTreeSet<String>) {
    if uuids.is_empty() {
        return;
    }
    let joined: Vec<&str> = uuids.iter().map(String::as_str).collect();
    push_line(
        out,
        format!("  {title} ({}): {}", uuids.len(), joined.join(", ")),
    );
}

/// The plan summary shown before anything is deleted.
pub fn render_plan(plan: &DeletePlan, dry_run: bool) -> String {
    let mut out = String::new();
    if dry_run {
        out.push_str("No changes will be made. Assets to be deleted:\n\n");
    } else {
        out.push_str("Assets to be deleted:\n\n");
    }

    push_line(&mut out, format!("Dashboards ({}):", plan.dashboards.len()));
    for dashboard in &plan.dashboards {
        push_line(&mut out, dashboard_line(dashboard));
    }

    cascade_section(
        &mut out,
        ResourceKind::Chart,
        &plan.charts,
        Some(&plan.chart_dashboard_context),
    );
    cascade_section(&mut out, ResourceKind::Dataset, &plan.datasets, None);
    cascade_section(&mut out, ResourceKind::Database, &plan.databases, None);

    if !plan.shared.is_empty() {
        out.push_str("\nShared (skipped):\n");
        shared_line(&mut out, "Charts", &plan.shared.charts);
        shared_line(&mut out, "Datasets", &plan.shared.datasets);
        shared_line(&mut out, "Databases", &plan.shared.databases);
    }

    if !plan.warnings.is_empty() {
        out.push('\n');
        for warning in &plan.warnings {
            push_line(&mut out, format!("Warning: {warning}"));
        }
    }

    if dry_run {
        push_line(&mut out, format!("\n{DRY_RUN_HINT}"));
    }
    out
}

/// Quote a path for a POSIX shell when it needs it.
fn shell_quote(text: &str) -> String {
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if plain {
        return text.to_string();
    }
    format!("'{}'", text.replace('\'', r#"'"'"'"#))
}

pub fn restore_command(path: &Path, kind: ResourceKind) -> String {
    format!(
        "bi-admin restore {} --asset-type {}",
        shell_quote(&path.to_string_lossy()),
        kind
    )
}

pub fn render_backup(path: &Path) -> String {
    format!(
        "\nBackup saved to: {}\nTo restore, run: {}\n\n",
        path.display(),
        restore_command(path, ResourceKind::Dashboard)
    )
}

pub fn render_completed(report: &ExecutionReport) -> String {
    format!("Deleted {} resources.\n", report.succeeded.len())
}

pub fn render_failures(report: &ExecutionReport) -> String {
    let mut out = String::from("Some deletions failed:\n");
    for failure in &report.failed {
        push_line(
            &mut out,
            format!("  {}:{} ({})", failure.kind, failure.id, failure.message),
        );
    }
    push_line(
        &mut out,
        format!(
            "Deleted {} of {} attempted.",
            report.succeeded.len(),
            report.attempted()
        ),
    );
    out
}

pub fn render_rollback_start() -> String {
    String::from("\nBest-effort rollback attempted...\n")
}

fn kind_list(kinds: &[ResourceKind]) -> String {
    kinds
        .iter()
        .map(ResourceKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn unverifiable_warning(kinds: &[ResourceKind]) -> String {
    format!(
        "Warning: unable to verify rollback for: {}.",
        kind_list(kinds)
    )
}

pub fn render_rollback(outcome: &RollbackOutcome, backup: &Path) -> String {
    let mut out = String::new();
    match outcome {
        RollbackOutcome::NotAttempted => {
            push_line(
                &mut out,
                format!(
                    "Rollback not attempted. Restore manually with: {}",
                    restore_command(backup, ResourceKind::Dashboard)
                ),
            );
        }
        RollbackOutcome::Succeeded { unverifiable } => {
            if !unverifiable.is_empty() {
                push_line(&mut out, unverifiable_warning(unverifiable));
            }
            out.push_str("Rollback succeeded.\n");
        }
        RollbackOutcome::ImportFailed { message } => {
            push_line(&mut out, format!("Rollback failed: {message}"));
            push_line(
                &mut out,
                format!(
                    "A backup zip is available for manual restore: {}",
                    backup.display()
                ),
            );
        }
        RollbackOutcome::VerificationFailed {
            kinds,
            unverifiable,
        } => {
            if !unverifiable.is_empty() {
                push_line(&mut out, unverifiable_warning(unverifiable));
            }
            push_line(
                &mut out,
                format!(
                    "Rollback verification failed for: {}. A backup zip is available for manual restore: {}",
                    kind_list(kinds),
                    backup.display()
                ),
            );
        }
    }
    out
}
