//! Database deletion preflight: no dataset outside the cascade may still point
//! at a database about to be deleted.

use crate::{AbortReason, DeleteResult};

use bi_client::PlatformApi;
use bi_core::resource::{dataset_database_id, display_name, resource_id};
use bi_core::{Filter, FilterValue, ResourceKind};

use std::collections::BTreeSet;

use log::info;
use serde_json::Value;

/// Datasets that could not be checked because they expose no database reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    pub unverifiable: Vec<String>,
}

fn dataset_label(dataset: &Value) -> String {
    match (resource_id(dataset), display_name(ResourceKind::Dataset, dataset)) {
        (Some(id), Some(name)) => format!("{id} ({name})"),
        (Some(id), None) => id.to_string(),
        (None, Some(name)) => name,
        (None, None) => String::from("unknown"),
    }
}

/// Verify that deleting `database_ids` orphans no dataset outside
/// `approved_dataset_ids`.
///
/// Aborts with the offending dataset ids when one is found. An offending
/// dataset listed without an id is named by its label instead. Fetch failures other
/// than a filter rejection abort as well, since the check cannot be trusted.
pub async fn preflight_database_deletion(
    api: &dyn PlatformApi,
    database_ids: &BTreeSet<i64>,
    approved_dataset_ids: &BTreeSet<i64>,
) -> DeleteResult<PreflightReport> {
    let filter = Filter::one_of(
        "database_id",
        database_ids.iter().copied().map(FilterValue::Integer).collect(),
    );

    let (datasets, server_filtered) = match api
        .list_resources(ResourceKind::Dataset, std::slice::from_ref(&filter))
        .await
    {
        Ok(datasets) => (datasets, true),
        Err(e) if e.is_filter_not_allowed() => {
            info!("Server rejected database_id filter, checking datasets locally");
            (api.list_resources(ResourceKind::Dataset, &[]).await?, false)
        }
        Err(e) => return Err(AbortReason::from_client(e)),
    };

    let mut report = PreflightReport::default();
    let mut offending = BTreeSet::new();
    let mut unidentified = Vec::new();
    for dataset in &datasets {
        let references_target = match dataset_database_id(dataset) {
            Some(database_id) => database_ids.contains(&database_id),
            // The server already narrowed the listing to the target databases.
            None if server_filtered => true,
            None => {
                report.unverifiable.push(dataset_label(dataset));
                continue;
            }
        };
        if !references_target {
            continue;
        }
        match resource_id(dataset) {
            Some(id) if approved_dataset_ids.contains(&id) => {}
            Some(id) => {
                offending.insert(id);
            }
            None => unidentified.push(dataset_label(dataset)),
        }
    }

    if !offending.is_empty() || !unidentified.is_empty() {
        return Err(AbortReason::preflight_violation(
            offending.into_iter().collect(),
            unidentified,
        ));
    }
    Ok(report)
}
