//! Cascade planning: selection, dependency extraction, shared protection,
//! resolution and preflight, composed into one [`DeletePlan`].

use crate::preflight::preflight_database_deletion;
use crate::protector::{collect_other_dependencies, protect_shared};
use crate::resolver::{Resolution, resolve_ids};
use crate::selection::select_dashboards;
use crate::{DeleteContext, DeleteResult};

use bi_client::PlatformApi;
use bi_core::bundle::extract_dependencies;
use bi_core::{CascadeDependencies, ResourceKind, SharedUuids};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{info, warn};
use serde_json::Value;

/// Non-fatal findings surfaced to the operator alongside the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// Shared-dependency protection was turned off
    SharedCheckSkipped,
    MissingUuids {
        kind: ResourceKind,
        uuids: Vec<String>,
    },
    /// `kind` could not be resolved, so its cascade and every narrower one was dropped
    ResolutionUnavailable {
        kind: ResourceKind,
        voided: Vec<ResourceKind>,
    },
    /// Datasets the preflight could not tie to a database
    PreflightIncomplete { datasets: Vec<String> },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedCheckSkipped => write!(
                f,
                "Shared dependency check skipped: cascade targets may be used by other dashboards."
            ),
            Self::MissingUuids { kind, uuids } => {
                write!(f, "{} UUIDs not found: {}", kind, uuids.join(", "))
            }
            Self::ResolutionUnavailable { kind, voided } => {
                let kinds: Vec<&str> = voided.iter().map(ResourceKind::as_str).collect();
                write!(
                    f,
                    "Cannot resolve {} ids on this platform version; skipping {} cascade deletion.",
                    kind,
                    kinds.join(", ")
                )
            }
            Self::PreflightIncomplete { datasets } => write!(
                f,
                "Cannot verify all datasets for target databases (no database reference): {}.",
                datasets.join(", ")
            ),
        }
    }
}

/// Resolved targets of one cascading kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeTarget {
    /// Whether the operator opted into this kind
    pub requested: bool,
    pub ids: BTreeSet<i64>,
    pub names: BTreeMap<i64, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub dashboards: Vec<Value>,
    /// The direct selection; never filtered by uuid
    pub dashboard_ids: BTreeSet<i64>,
    pub charts: CascadeTarget,
    pub datasets: CascadeTarget,
    pub databases: CascadeTarget,
    /// Titles of the selected dashboards embedding each chart id
    pub chart_dashboard_context: BTreeMap<i64, Vec<String>>,
    pub shared: SharedUuids,
    pub warnings: Vec<PlanWarning>,
    /// Export of the selected dashboards, reused as the backup
    pub cascade_bundle: Option<Vec<u8>>,
}

impl DeletePlan {
    pub fn target(&self, kind: ResourceKind) -> Option<&CascadeTarget> {
        match kind {
            ResourceKind::Dashboard => None,
            ResourceKind::Chart => Some(&self.charts),
            ResourceKind::Dataset => Some(&self.datasets),
            ResourceKind::Database => Some(&self.databases),
        }
    }

    fn target_mut(&mut self, kind: ResourceKind) -> Option<&mut CascadeTarget> {
        match kind {
            ResourceKind::Dashboard => None,
            ResourceKind::Chart => Some(&mut self.charts),
            ResourceKind::Dataset => Some(&mut self.datasets),
            ResourceKind::Database => Some(&mut self.databases),
        }
    }

    /// Ids scheduled for deletion for `kind`.
    pub fn ids(&self, kind: ResourceKind) -> &BTreeSet<i64> {
        match self.target(kind) {
            Some(target) => &target.ids,
            None => &self.dashboard_ids,
        }
    }

    /// Kinds with at least one id scheduled, in deletion order.
    pub fn scheduled_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::DELETE_ORDER
            .into_iter()
            .filter(|kind| !self.ids(*kind).is_empty())
            .collect()
    }

    pub fn total(&self) -> usize {
        ResourceKind::DELETE_ORDER
            .iter()
            .map(|kind| self.ids(*kind).len())
            .sum()
    }
}

fn record_warning(warnings: &mut Vec<PlanWarning>, warning: PlanWarning) {
    warn!("{warning}");
    warnings.push(warning);
}

/// Build the deletion plan. `None` when no dashboard matches the filters.
///
/// Anything that would base a deletion on incomplete information (a failed
/// listing, export, or preflight) aborts here, before any mutation.
pub async fn plan_deletion(
    api: &dyn PlatformApi,
    context: &DeleteContext,
) -> DeleteResult<Option<DeletePlan>> {
    let cascade = context.cascade;
    cascade.validate()?;

    let Some(selection) = select_dashboards(api, &context.filters).await? else {
        return Ok(None);
    };
    info!("Selected {} dashboards", selection.ids.len());

    let mut warnings = Vec::new();
    let mut dependencies = CascadeDependencies::default();
    let mut cascade_bundle = None;
    let mut shared = SharedUuids::default();

    if cascade.charts {
        let dashboard_ids: Vec<i64> = selection.ids.iter().copied().collect();
        let bundle = api
            .export_bundle(ResourceKind::Dashboard, &dashboard_ids)
            .await?;
        dependencies = extract_dependencies(&bundle)?;
        dependencies.narrow(cascade.datasets, cascade.databases);
        cascade_bundle = Some(bundle);

        if cascade.skip_shared_check {
            record_warning(&mut warnings, PlanWarning::SharedCheckSkipped);
        } else {
            let protected =
                collect_other_dependencies(api, &selection.ids, context.shared_check_batch_size)
                    .await?;
            shared = protect_shared(&mut dependencies, &protected);
        }
    }

    let mut plan = DeletePlan {
        dashboards: selection.dashboards,
        dashboard_ids: selection.ids,
        charts: CascadeTarget::default(),
        datasets: CascadeTarget::default(),
        databases: CascadeTarget::default(),
        chart_dashboard_context: BTreeMap::new(),
        shared,
        warnings: Vec::new(),
        cascade_bundle,
    };

    let mut voided = false;
    for (position, kind) in ResourceKind::CASCADE_KINDS.into_iter().enumerate() {
        let requested = cascade.requested(kind);
        if let Some(target) = plan.target_mut(kind) {
            target.requested = requested;
        }
        if !requested || voided {
            continue;
        }

        let uuids = dependencies.uuids(kind).cloned().unwrap_or_default();
        match resolve_ids(api, kind, &uuids).await? {
            Resolution::Resolved(resolved) => {
                if !resolved.missing.is_empty() {
                    record_warning(
                        &mut warnings,
                        PlanWarning::MissingUuids {
                            kind,
                            uuids: resolved.missing.iter().cloned().collect(),
                        },
                    );
                }
                if kind == ResourceKind::Chart {
                    for (uuid, id) in &resolved.ids_by_uuid {
                        if let Some(titles) = dependencies.chart_dashboard_titles.get(uuid) {
                            plan.chart_dashboard_context
                                .insert(*id, titles.iter().cloned().collect());
                        }
                    }
                }
                if let Some(target) = plan.target_mut(kind) {
                    target.ids = resolved.ids();
                    target.names = resolved.names;
                }
            }
            Resolution::Unavailable => {
                voided = true;
                let voided_kinds = ResourceKind::CASCADE_KINDS[position..]
                    .iter()
                    .copied()
                    .filter(|kind| cascade.requested(*kind))
                    .collect();
                record_warning(
                    &mut warnings,
                    PlanWarning::ResolutionUnavailable {
                        kind,
                        voided: voided_kinds,
                    },
                );
            }
        }
    }

    if cascade.databases && !plan.databases.ids.is_empty() {
        let report =
            preflight_database_deletion(api, &plan.databases.ids, &plan.datasets.ids).await?;
        if !report.unverifiable.is_empty() {
            record_warning(
                &mut warnings,
                PlanWarning::PreflightIncomplete {
                    datasets: report.unverifiable,
                },
            );
        }
    }

    plan.warnings = warnings;
    Ok(Some(plan))
}
