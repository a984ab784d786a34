//! Dashboard selection by filter, with client-side fallback for platforms that
//! refuse some list filters.

use crate::{AbortReason, DeleteResult};

use bi_client::PlatformApi;
use bi_core::filter::filter_locally;
use bi_core::resource::resource_id;
use bi_core::{Filter, Predicate, ResourceKind};

use std::collections::BTreeSet;

use log::{debug, info};
use serde_json::Value;

/// Dashboards matched by the operator's filters.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSelection {
    pub dashboards: Vec<Value>,
    pub ids: BTreeSet<i64>,
}

fn filter_keys(filters: &[Filter]) -> Vec<String> {
    filters.iter().map(|filter| filter.key.clone()).collect()
}

fn carries_keys(resource: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| resource.get(&filter.key).is_some())
}

/// List everything and filter client-side.
///
/// A requested key that no listed resource carries cannot be evaluated, so it
/// is reported as unsupported rather than matching nothing.
async fn fetch_all_and_filter(
    api: &dyn PlatformApi,
    kind: ResourceKind,
    filters: &[Filter],
) -> DeleteResult<Vec<Value>> {
    let resources = api.list_resources(kind, &[]).await?;

    let absent: Vec<String> = filters
        .iter()
        .filter(|filter| !resources.iter().any(|r| r.get(&filter.key).is_some()))
        .map(|filter| filter.key.clone())
        .collect();
    if !resources.is_empty() && !absent.is_empty() {
        return Err(AbortReason::filter_unsupported(
            kind,
            absent,
            "no listed resource carries the key",
        ));
    }

    Ok(filter_locally(resources, filters))
}

/// Fetch resources matching every filter.
///
/// Server-side filtering is tried first. Keys the list endpoint never supports
/// go straight to local filtering, as does a "not allowed to filter" rejection.
/// Any other failure is reported as an unsupported filter.
pub async fn fetch_with_filter_fallback(
    api: &dyn PlatformApi,
    kind: ResourceKind,
    filters: &[Filter],
) -> DeleteResult<Vec<Value>> {
    if filters.iter().any(Filter::is_local_only) {
        debug!("Filtering {} locally", kind.plural());
        return fetch_all_and_filter(api, kind, filters).await;
    }

    let resources = match api.list_resources(kind, filters).await {
        Ok(resources) => resources,
        Err(e) if e.is_filter_not_allowed() => {
            info!("Server rejected {} filters, filtering locally", kind);
            return fetch_all_and_filter(api, kind, filters).await;
        }
        Err(e) => {
            return Err(AbortReason::filter_unsupported(
                kind,
                filter_keys(filters),
                e.to_string(),
            ));
        }
    };

    if resources.is_empty() {
        return Ok(resources);
    }

    // Re-check server results so an ignored predicate cannot widen the selection.
    if resources.iter().all(|resource| carries_keys(resource, filters)) {
        return Ok(filter_locally(resources, filters));
    }

    // Slim payloads omit the filtered fields; contains matches must be redone locally.
    if filters
        .iter()
        .any(|filter| matches!(filter.predicate, Predicate::Contains(_)))
    {
        return fetch_all_and_filter(api, kind, filters).await;
    }

    Ok(resources)
}

/// Select the dashboards to delete. `None` when nothing matches.
pub async fn select_dashboards(
    api: &dyn PlatformApi,
    filters: &[Filter],
) -> DeleteResult<Option<DashboardSelection>> {
    let dashboards: Vec<Value> =
        fetch_with_filter_fallback(api, ResourceKind::Dashboard, filters)
            .await?
            .into_iter()
            .filter(|dashboard| resource_id(dashboard).is_some())
            .collect();
    if dashboards.is_empty() {
        return Ok(None);
    }

    let ids = dashboards.iter().filter_map(resource_id).collect();
    Ok(Some(DashboardSelection { dashboards, ids }))
}
