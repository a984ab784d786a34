use crate::ResourceKind;

use std::collections::{BTreeMap, BTreeSet};

/// UUID-level dependency graph extracted from dashboard export bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeDependencies {
    pub chart_uuids: BTreeSet<String>,
    pub dataset_uuids: BTreeSet<String>,
    pub database_uuids: BTreeSet<String>,
    pub chart_dataset_map: BTreeMap<String, String>,
    pub dataset_database_map: BTreeMap<String, String>,
    /// Titles of the dashboards embedding each chart
    pub chart_dashboard_titles: BTreeMap<String, BTreeSet<String>>,
}

/// Per-kind uuids that must survive because other dashboards still need them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedUuids {
    pub charts: BTreeSet<String>,
    pub datasets: BTreeSet<String>,
    pub databases: BTreeSet<String>,
}

impl SharedUuids {
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty() && self.datasets.is_empty() && self.databases.is_empty()
    }

    pub fn for_kind(&self, kind: ResourceKind) -> Option<&BTreeSet<String>> {
        match kind {
            ResourceKind::Dashboard => None,
            ResourceKind::Chart => Some(&self.charts),
            ResourceKind::Dataset => Some(&self.datasets),
            ResourceKind::Database => Some(&self.databases),
        }
    }
}

impl CascadeDependencies {
    pub fn uuids(&self, kind: ResourceKind) -> Option<&BTreeSet<String>> {
        match kind {
            ResourceKind::Dashboard => None,
            ResourceKind::Chart => Some(&self.chart_uuids),
            ResourceKind::Dataset => Some(&self.dataset_uuids),
            ResourceKind::Database => Some(&self.database_uuids),
        }
    }

    /// Merge another extraction into this one (used when bundles are fetched in batches).
    pub fn union(&mut self, other: CascadeDependencies) {
        self.chart_uuids.extend(other.chart_uuids);
        self.dataset_uuids.extend(other.dataset_uuids);
        self.database_uuids.extend(other.database_uuids);
        self.chart_dataset_map.extend(other.chart_dataset_map);
        self.dataset_database_map.extend(other.dataset_database_map);
        for (chart_uuid, titles) in other.chart_dashboard_titles {
            self.chart_dashboard_titles
                .entry(chart_uuid)
                .or_default()
                .extend(titles);
        }
    }

    /// Drop the kinds the operator did not opt into.
    pub fn narrow(&mut self, cascade_datasets: bool, cascade_databases: bool) {
        if !cascade_datasets {
            self.dataset_uuids.clear();
            self.dataset_database_map.clear();
        }
        if !cascade_databases {
            self.database_uuids.clear();
        }
    }

    /// Compute what this selection shares with `protected` (everything other
    /// dashboards depend on).
    ///
    /// Protection flows downward: the dataset behind a shared chart is shared, and
    /// so is the database behind any shared dataset, whether or not the raw
    /// intersection flagged them.
    pub fn shared_with(&self, protected: &CascadeDependencies) -> SharedUuids {
        let charts: BTreeSet<String> = self
            .chart_uuids
            .intersection(&protected.chart_uuids)
            .cloned()
            .collect();
        let mut datasets: BTreeSet<String> = self
            .dataset_uuids
            .intersection(&protected.dataset_uuids)
            .cloned()
            .collect();
        let mut databases: BTreeSet<String> = self
            .database_uuids
            .intersection(&protected.database_uuids)
            .cloned()
            .collect();

        for chart_uuid in &charts {
            if let Some(dataset_uuid) = self.chart_dataset_map.get(chart_uuid) {
                datasets.insert(dataset_uuid.clone());
            }
        }
        for dataset_uuid in &datasets {
            if let Some(database_uuid) = self.dataset_database_map.get(dataset_uuid) {
                databases.insert(database_uuid.clone());
            }
        }

        // Only report what was actually a deletion candidate.
        datasets.retain(|uuid| self.dataset_uuids.contains(uuid));
        databases.retain(|uuid| self.database_uuids.contains(uuid));

        SharedUuids {
            charts,
            datasets,
            databases,
        }
    }

    /// Subtract shared uuids from the candidate sets.
    pub fn remove_shared(&mut self, shared: &SharedUuids) {
        self.chart_uuids.retain(|uuid| !shared.charts.contains(uuid));
        let remaining = &self.chart_uuids;
        self.chart_dashboard_titles
            .retain(|uuid, _| remaining.contains(uuid));
        self.dataset_uuids.retain(|uuid| !shared.datasets.contains(uuid));
        self.database_uuids.retain(|uuid| !shared.databases.contains(uuid));
    }
}
