use crate::DeleteResult;

use bi_client::PlatformApi;
use bi_core::bundle::extract_dependencies;
use bi_core::resource::resource_id;
use bi_core::{CascadeDependencies, ResourceKind, SharedUuids};

use std::collections::BTreeSet;

use log::debug;

/// Dependencies of every dashboard outside the selection.
///
/// Exports go out `batch_size` dashboards at a time and each bundle is
/// extracted on its own, so only one batch is held in memory while every edge
/// still ends up in the union.
pub async fn collect_other_dependencies(
    api: &dyn PlatformApi,
    selected: &BTreeSet<i64>,
    batch_size: usize,
) -> DeleteResult<CascadeDependencies> {
    let other_ids: Vec<i64> = api
        .list_resources(ResourceKind::Dashboard, &[])
        .await?
        .iter()
        .filter_map(resource_id)
        .filter(|id| !selected.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut protected = CascadeDependencies::default();
    for batch in other_ids.chunks(batch_size.max(1)) {
        let bundle = api.export_bundle(ResourceKind::Dashboard, batch).await?;
        protected.union(extract_dependencies(&bundle)?);
    }

    debug!(
        "Collected dependencies of {} other dashboards: {} charts",
        other_ids.len(),
        protected.chart_uuids.len()
    );
    Ok(protected)
}

/// Remove everything `protected` still needs from the candidate sets and
/// return what was removed.
pub fn protect_shared(
    candidates: &mut CascadeDependencies,
    protected: &CascadeDependencies,
) -> SharedUuids {
    let shared = candidates.shared_with(protected);
    candidates.remove_shared(&shared);
    shared
}
