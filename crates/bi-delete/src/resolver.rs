//! UUID to id resolution.
//!
//! Bundles only reference resources by uuid, while delete calls need the
//! server-local id. Each pass builds a fresh [`UuidIndex`] from the listing; ids
//! are only meaningful within that pass.

use crate::DeleteResult;

use bi_client::{ClientResult, PlatformApi};
use bi_core::ResourceKind;
use bi_core::resource::{display_name, resource_id, resource_uuid};

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

/// Lookup tables for one kind, built from a single listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UuidIndex {
    pub ids_by_uuid: BTreeMap<String, i64>,
    pub names_by_id: BTreeMap<i64, String>,
}

/// Requested uuids that mapped to ids, plus those that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIds {
    pub ids_by_uuid: BTreeMap<String, i64>,
    pub names: BTreeMap<i64, String>,
    /// Already deleted or never existed
    pub missing: BTreeSet<String>,
}

impl ResolvedIds {
    pub fn ids(&self) -> BTreeSet<i64> {
        self.ids_by_uuid.values().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedIds),
    /// No mapping mechanism works for this kind on this platform
    Unavailable,
}

/// Build the uuid index for `kind`, or `None` when no mapping can be had.
///
/// Listing items carrying both id and uuid are used directly. Ids listed without
/// a uuid are recovered through per-resource exports.
pub async fn build_uuid_index(
    api: &dyn PlatformApi,
    kind: ResourceKind,
) -> ClientResult<Option<UuidIndex>> {
    let resources = api.list_resources(kind, &[]).await?;

    let mut index = UuidIndex::default();
    let mut without_uuid = Vec::new();
    for resource in &resources {
        let Some(id) = resource_id(resource) else {
            continue;
        };
        if let Some(name) = display_name(kind, resource) {
            index.names_by_id.insert(id, name);
        }
        match resource_uuid(resource) {
            Some(uuid) => {
                index.ids_by_uuid.insert(uuid, id);
            }
            None => without_uuid.push(id),
        }
    }

    if !without_uuid.is_empty() {
        debug!(
            "{} {} listed without uuid, exporting individually",
            without_uuid.len(),
            kind.plural()
        );
        for (id, uuid) in api.get_uuids_for_ids(kind, &without_uuid).await? {
            index.ids_by_uuid.insert(uuid, id);
        }
    }

    if index.ids_by_uuid.is_empty() {
        return Ok(None);
    }
    Ok(Some(index))
}

/// Resolve `uuids` of `kind` to ids. All-or-nothing: either every uuid is
/// mapped or reported missing, or the whole kind is unavailable.
pub async fn resolve_ids(
    api: &dyn PlatformApi,
    kind: ResourceKind,
    uuids: &BTreeSet<String>,
) -> DeleteResult<Resolution> {
    if uuids.is_empty() {
        return Ok(Resolution::Resolved(ResolvedIds::default()));
    }

    let Some(index) = build_uuid_index(api, kind).await? else {
        return Ok(Resolution::Unavailable);
    };

    let mut resolved = ResolvedIds::default();
    for uuid in uuids {
        match index.ids_by_uuid.get(uuid) {
            Some(&id) => {
                resolved.ids_by_uuid.insert(uuid.clone(), id);
                if let Some(name) = index.names_by_id.get(&id) {
                    resolved.names.insert(id, name.clone());
                }
            }
            None => {
                resolved.missing.insert(uuid.clone());
            }
        }
    }
    Ok(Resolution::Resolved(resolved))
}
