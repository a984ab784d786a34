use crate::ClientResult;

use bi_core::{Filter, ResourceKind};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

/// Operations the deletion engine needs from the platform.
///
/// [`crate::Client`] implements this over HTTP; tests substitute an in-memory
/// platform.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// List every resource of `kind` matching all `filters`, following pages
    /// until the server returns an empty one.
    async fn list_resources(&self, kind: ResourceKind, filters: &[Filter])
    -> ClientResult<Vec<Value>>;

    /// Export `ids` as a single merged bundle.
    async fn export_bundle(&self, kind: ResourceKind, ids: &[i64]) -> ClientResult<Vec<u8>>;

    /// Import a bundle. Returns whether the server acknowledged the import.
    async fn import_bundle(
        &self,
        kind: ResourceKind,
        bundle: Vec<u8>,
        overwrite: bool,
    ) -> ClientResult<bool>;

    async fn delete_resource(&self, kind: ResourceKind, id: i64) -> ClientResult<()>;

    /// Map ids to uuids by exporting each resource on its own. Ids the server
    /// refuses to export are left out of the map.
    async fn get_uuids_for_ids(
        &self,
        kind: ResourceKind,
        ids: &[i64],
    ) -> ClientResult<BTreeMap<i64, String>>;
}
