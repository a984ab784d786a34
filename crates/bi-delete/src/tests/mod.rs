mod executor;

use crate::{BackupSettings, CascadeOptions, DeleteContext, ExecutionOptions};

use bi_client::{ClientError, ClientResult, PlatformApi};
use bi_core::bundle::write_bundle;
use bi_core::resource::resource_id;
use bi_core::{Filter, ResourceKind};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

/// A platform request as seen by [`FakePlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(ResourceKind, Vec<String>),
    Export(ResourceKind, Vec<i64>),
    Import(ResourceKind, bool),
    Delete(ResourceKind, i64),
    GetUuids(ResourceKind, Vec<i64>),
}

#[derive(Default)]
struct FakeState {
    resources: BTreeMap<ResourceKind, Vec<Value>>,
    deleted: Vec<(ResourceKind, Value)>,
    calls: Vec<Call>,
}

/// In-memory platform. Deleted resources come back on an acknowledged import.
pub(crate) struct FakePlatform {
    state: Mutex<FakeState>,
    /// Export files per dashboard id, as (path relative to the bundle root, yaml)
    dashboard_files: BTreeMap<i64, Vec<(String, String)>>,
    /// Uuids reported by single-resource exports of non-dashboard kinds
    export_uuids: BTreeMap<(ResourceKind, i64), String>,
    failing_deletes: BTreeSet<(ResourceKind, i64)>,
    failing_lists: BTreeSet<ResourceKind>,
    rejected_filter_keys: BTreeSet<String>,
    slim_filtered_listing: bool,
    import_ack: bool,
    import_error: bool,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            dashboard_files: BTreeMap::new(),
            export_uuids: BTreeMap::new(),
            failing_deletes: BTreeSet::new(),
            failing_lists: BTreeSet::new(),
            rejected_filter_keys: BTreeSet::new(),
            slim_filtered_listing: false,
            import_ack: true,
            import_error: false,
        }
    }

    pub(crate) fn with(self, kind: ResourceKind, resource: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .resources
            .entry(kind)
            .or_default()
            .push(resource);
        self
    }

    pub(crate) fn with_dashboard_files(mut self, id: i64, files: &[(&str, &str)]) -> Self {
        self.dashboard_files.insert(
            id,
            files
                .iter()
                .map(|(path, yaml)| (path.to_string(), yaml.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn with_export_uuid(mut self, kind: ResourceKind, id: i64, uuid: &str) -> Self {
        self.export_uuids.insert((kind, id), uuid.to_string());
        self
    }

    pub(crate) fn failing_delete(mut self, kind: ResourceKind, id: i64) -> Self {
        self.failing_deletes.insert((kind, id));
        self
    }

    pub(crate) fn failing_list(mut self, kind: ResourceKind) -> Self {
        self.failing_lists.insert(kind);
        self
    }

    pub(crate) fn rejecting_filter(mut self, key: &str) -> Self {
        self.rejected_filter_keys.insert(key.to_string());
        self
    }

    /// Filtered listings return only ids, like older list endpoints.
    pub(crate) fn slim_filtered_listing(mut self) -> Self {
        self.slim_filtered_listing = true;
        self
    }

    pub(crate) fn import_ack(mut self, ack: bool) -> Self {
        self.import_ack = ack;
        self
    }

    pub(crate) fn import_error(mut self) -> Self {
        self.import_error = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn deletes(&self) -> Vec<(ResourceKind, i64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(kind, id) => Some((kind, id)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn imports(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Import(..)))
            .count()
    }

    pub(crate) fn ids(&self, kind: ResourceKind) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&kind)
            .map(|resources| resources.iter().filter_map(resource_id).collect())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn dashboard_bundle(&self, ids: &[i64]) -> Vec<u8> {
        let mut entries = vec![(
            String::from("dashboard_export_20240101T000000/metadata.yaml"),
            b"version: 1.0.0\ntype: Dashboard\n".to_vec(),
        )];
        for id in ids {
            for (path, yaml) in self.dashboard_files.get(id).into_iter().flatten() {
                entries.push((
                    format!("dashboard_export_20240101T000000/{path}"),
                    yaml.as_bytes().to_vec(),
                ));
            }
        }
        write_bundle(entries).unwrap()
    }

    fn single_bundle(&self, kind: ResourceKind, ids: &[i64]) -> Vec<u8> {
        let entries = ids.iter().filter_map(|id| {
            self.export_uuids.get(&(kind, *id)).map(|uuid| {
                (
                    format!("{}_export/{}/item_{id}.yaml", kind.as_str(), kind.plural()),
                    format!("uuid: {uuid}\n").into_bytes(),
                )
            })
        });
        write_bundle(entries).unwrap()
    }
}

fn filter_rejected(key: &str) -> ClientError {
    ClientError::api_error(
        400,
        vec![format!("filters: Filter column: {key} not allowed to filter")],
    )
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        filters: &[Filter],
    ) -> ClientResult<Vec<Value>> {
        self.record(Call::List(
            kind,
            filters.iter().map(|filter| filter.key.clone()).collect(),
        ));
        if self.failing_lists.contains(&kind) {
            return Err(ClientError::api_error(500, vec![String::from("Internal error")]));
        }
        if let Some(filter) = filters
            .iter()
            .find(|filter| self.rejected_filter_keys.contains(&filter.key))
        {
            return Err(filter_rejected(&filter.key));
        }

        let state = self.state.lock().unwrap();
        let matching = state
            .resources
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|resource| filters.iter().all(|filter| filter.matches(resource)));
        if self.slim_filtered_listing && !filters.is_empty() {
            return Ok(matching.map(|resource| json!({"id": resource["id"]})).collect());
        }
        Ok(matching.cloned().collect())
    }

    async fn export_bundle(&self, kind: ResourceKind, ids: &[i64]) -> ClientResult<Vec<u8>> {
        self.record(Call::Export(kind, ids.to_vec()));
        match kind {
            ResourceKind::Dashboard => Ok(self.dashboard_bundle(ids)),
            _ => Ok(self.single_bundle(kind, ids)),
        }
    }

    async fn import_bundle(
        &self,
        kind: ResourceKind,
        _bundle: Vec<u8>,
        overwrite: bool,
    ) -> ClientResult<bool> {
        self.record(Call::Import(kind, overwrite));
        if self.import_error {
            return Err(ClientError::api_error(
                422,
                vec![String::from("Error importing dashboard")],
            ));
        }
        if self.import_ack {
            let mut state = self.state.lock().unwrap();
            for (kind, resource) in std::mem::take(&mut state.deleted) {
                state.resources.entry(kind).or_default().push(resource);
            }
        }
        Ok(self.import_ack)
    }

    async fn delete_resource(&self, kind: ResourceKind, id: i64) -> ClientResult<()> {
        self.record(Call::Delete(kind, id));
        if self.failing_deletes.contains(&(kind, id)) {
            return Err(ClientError::api_error(
                422,
                vec![String::from("Cannot delete")],
            ));
        }
        let mut state = self.state.lock().unwrap();
        let resources = state.resources.entry(kind).or_default();
        let Some(position) = resources.iter().position(|r| resource_id(r) == Some(id)) else {
            return Err(ClientError::api_error(404, vec![String::from("Not found")]));
        };
        let resource = resources.remove(position);
        state.deleted.push((kind, resource));
        Ok(())
    }

    async fn get_uuids_for_ids(
        &self,
        kind: ResourceKind,
        ids: &[i64],
    ) -> ClientResult<BTreeMap<i64, String>> {
        self.record(Call::GetUuids(kind, ids.to_vec()));
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.export_uuids
                    .get(&(kind, *id))
                    .map(|uuid| (*id, uuid.clone()))
            })
            .collect())
    }
}

pub(crate) const SALES_DASHBOARD: &str = r#"
dashboard_title: Sales
uuid: dash-1
position:
  CHART-a:
    type: CHART
    meta:
      uuid: chart-1
  CHART-b:
    type: CHART
    meta:
      uuid: chart-2
"#;

pub(crate) const OPS_DASHBOARD: &str = r#"
dashboard_title: Ops
uuid: dash-2
position:
  CHART-c:
    type: CHART
    meta:
      uuid: chart-3
"#;

pub(crate) const REVENUE_CHART: &str = "slice_name: Revenue\nuuid: chart-1\ndataset_uuid: ds-1\n";
pub(crate) const MARGIN_CHART: &str = "slice_name: Margin\nuuid: chart-2\ndataset_uuid: ds-1\n";
pub(crate) const TICKETS_CHART: &str = "slice_name: Tickets\nuuid: chart-3\ndataset_uuid: ds-2\n";
pub(crate) const ORDERS_DATASET: &str = "table_name: orders\nuuid: ds-1\ndatabase_uuid: db-1\n";
pub(crate) const TICKETS_DATASET: &str = "table_name: tickets\nuuid: ds-2\ndatabase_uuid: db-2\n";
pub(crate) const SALES_DATABASE: &str = "database_name: sales_db\nuuid: db-1\n";
pub(crate) const OPS_DATABASE: &str = "database_name: ops_db\nuuid: db-2\n";

/// Two dashboards with disjoint dependency trees:
/// Sales (1) -> charts 11, 12 -> dataset 21 -> database 31, and
/// Ops (2) -> chart 13 -> dataset 22 -> database 32.
pub(crate) fn two_dashboard_platform() -> FakePlatform {
    FakePlatform::new()
        .with(
            ResourceKind::Dashboard,
            json!({"id": 1, "uuid": "dash-1", "dashboard_title": "Sales", "slug": "sales"}),
        )
        .with(
            ResourceKind::Dashboard,
            json!({"id": 2, "uuid": "dash-2", "dashboard_title": "Ops", "slug": "ops"}),
        )
        .with(
            ResourceKind::Chart,
            json!({"id": 11, "uuid": "chart-1", "slice_name": "Revenue"}),
        )
        .with(
            ResourceKind::Chart,
            json!({"id": 12, "uuid": "chart-2", "slice_name": "Margin"}),
        )
        .with(
            ResourceKind::Chart,
            json!({"id": 13, "uuid": "chart-3", "slice_name": "Tickets"}),
        )
        .with(
            ResourceKind::Dataset,
            json!({"id": 21, "uuid": "ds-1", "table_name": "orders", "database_id": 31}),
        )
        .with(
            ResourceKind::Dataset,
            json!({"id": 22, "uuid": "ds-2", "table_name": "tickets", "database_id": 32}),
        )
        .with(
            ResourceKind::Database,
            json!({"id": 31, "uuid": "db-1", "database_name": "sales_db"}),
        )
        .with(
            ResourceKind::Database,
            json!({"id": 32, "uuid": "db-2", "database_name": "ops_db"}),
        )
        .with_dashboard_files(
            1,
            &[
                ("dashboards/Sales_1.yaml", SALES_DASHBOARD),
                ("charts/Revenue_11.yaml", REVENUE_CHART),
                ("charts/Margin_12.yaml", MARGIN_CHART),
                ("datasets/sales_db/orders.yaml", ORDERS_DATASET),
                ("databases/sales_db.yaml", SALES_DATABASE),
            ],
        )
        .with_dashboard_files(
            2,
            &[
                ("dashboards/Ops_2.yaml", OPS_DASHBOARD),
                ("charts/Tickets_13.yaml", TICKETS_CHART),
                ("datasets/ops_db/tickets.yaml", TICKETS_DATASET),
                ("databases/ops_db.yaml", OPS_DATABASE),
            ],
        )
}

pub(crate) fn sales_filter() -> Vec<Filter> {
    vec![Filter::equal("id", bi_core::FilterValue::Integer(1))]
}

pub(crate) fn full_cascade() -> CascadeOptions {
    CascadeOptions {
        charts: true,
        datasets: true,
        databases: true,
        skip_shared_check: false,
    }
}

pub(crate) fn context_with(
    filters: Vec<Filter>,
    cascade: CascadeOptions,
    backup_dir: &Path,
) -> DeleteContext {
    DeleteContext {
        filters,
        cascade,
        execution: ExecutionOptions::default(),
        db_passwords: BTreeMap::new(),
        backup: BackupSettings {
            dir: backup_dir.to_path_buf(),
            prefix: String::from("bi-admin-backup-delete"),
        },
        shared_check_batch_size: 100,
    }
}

/// Confirmed, non-dry-run execution with the given rollback switch.
pub(crate) fn confirmed(rollback: bool) -> ExecutionOptions {
    ExecutionOptions {
        dry_run: false,
        confirm: Some(String::from("DELETE")),
        rollback,
    }
}
