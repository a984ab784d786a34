//! Reading and rewriting platform export bundles.
//!
//! A bundle is a zip archive with a single root directory holding one YAML
//! descriptor per resource, grouped by kind:
//!
//! ```text
//! dashboard_export_20240101T000000/
//!     metadata.yaml
//!     dashboards/Sales_1.yaml
//!     charts/Revenue_7.yaml
//!     datasets/examples/orders.yaml
//!     databases/examples.yaml
//! ```

use crate::{CascadeDependencies, CoreError, CoreResult, ResourceKind};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{Cursor, Read, Write};

use log::debug;
use serde_yaml::Value as YamlValue;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const YAML_EXTENSIONS: [&str; 2] = [".yaml", ".yml"];

/// One parsed resource descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub kind: ResourceKind,
    pub path: String,
    pub config: YamlValue,
}

impl Descriptor {
    pub fn uuid(&self) -> Option<String> {
        yaml_text(self.config.get("uuid"))
    }
}

/// Strip the bundle root directory from an entry path.
pub fn remove_root(path: &str) -> &str {
    path.split_once('/').map_or("", |(_, rest)| rest)
}

fn is_yaml(path: &str) -> bool {
    YAML_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Non-empty scalar rendered as a string.
pub fn yaml_text(value: Option<&YamlValue>) -> Option<String> {
    match value? {
        YamlValue::String(text) if !text.is_empty() => Some(text.clone()),
        YamlValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_yaml(path: &str, data: &[u8]) -> CoreResult<YamlValue> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(YamlValue::Null);
    }
    serde_yaml::from_slice(data).map_err(|e| CoreError::from_yaml(path, e))
}

/// Read every file entry as `(name, bytes)`, skipping directories.
pub fn read_entries(bundle: &[u8]) -> CoreResult<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bundle))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        entries.push((name, data));
    }

    Ok(entries)
}

/// Write entries into a new zip. Later duplicates of a name are dropped.
pub fn write_bundle<I>(entries: I) -> CoreResult<Vec<u8>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut seen = HashSet::new();

    for (name, data) in entries {
        if !seen.insert(name.clone()) {
            debug!("Skipping duplicate bundle entry {name}");
            continue;
        }
        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Parse the descriptors of every supported kind in the bundle.
pub fn read_descriptors(bundle: &[u8]) -> CoreResult<Vec<Descriptor>> {
    let mut descriptors = Vec::new();

    for (name, data) in read_entries(bundle)? {
        let relative = remove_root(&name);
        if !is_yaml(relative) {
            continue;
        }
        let Some(kind) = ResourceKind::from_bundle_path(relative) else {
            continue;
        };
        let config = parse_yaml(&name, &data)?;
        descriptors.push(Descriptor {
            kind,
            path: name,
            config,
        });
    }

    Ok(descriptors)
}

/// Build the uuid dependency graph of a dashboard export.
pub fn extract_dependencies(bundle: &[u8]) -> CoreResult<CascadeDependencies> {
    let mut deps = CascadeDependencies::default();

    for descriptor in read_descriptors(bundle)? {
        match descriptor.kind {
            ResourceKind::Chart => {
                let Some(uuid) = descriptor.uuid() else { continue };
                if let Some(dataset_uuid) = yaml_text(descriptor.config.get("dataset_uuid")) {
                    deps.chart_dataset_map.insert(uuid.clone(), dataset_uuid.clone());
                    deps.dataset_uuids.insert(dataset_uuid);
                }
                deps.chart_uuids.insert(uuid);
            }
            ResourceKind::Dataset => {
                let Some(uuid) = descriptor.uuid() else { continue };
                if let Some(database_uuid) = yaml_text(descriptor.config.get("database_uuid")) {
                    deps.dataset_database_map
                        .insert(uuid.clone(), database_uuid.clone());
                    deps.database_uuids.insert(database_uuid);
                }
                deps.dataset_uuids.insert(uuid);
            }
            ResourceKind::Database => {
                if let Some(uuid) = descriptor.uuid() {
                    deps.database_uuids.insert(uuid);
                }
            }
            ResourceKind::Dashboard => {
                collect_dashboard_chart_titles(&descriptor.config, &mut deps);
            }
        }
    }

    Ok(deps)
}

fn collect_dashboard_chart_titles(config: &YamlValue, deps: &mut CascadeDependencies) {
    let title = yaml_text(config.get("dashboard_title"))
        .or_else(|| yaml_text(config.get("title")))
        .unwrap_or_else(|| String::from("Unknown"));
    let Some(position) = config.get("position").and_then(YamlValue::as_mapping) else {
        return;
    };

    for node in position.values() {
        if node.get("type").and_then(YamlValue::as_str) != Some("CHART") {
            continue;
        }
        let chart_uuid = node.get("meta").and_then(|meta| yaml_text(meta.get("uuid")));
        if let Some(chart_uuid) = chart_uuid {
            deps.chart_dashboard_titles
                .entry(chart_uuid)
                .or_default()
                .insert(title.clone());
        }
    }
}

/// Every uuid in the bundle, grouped by kind.
pub fn extract_uuids_by_kind(bundle: &[u8]) -> CoreResult<BTreeMap<ResourceKind, BTreeSet<String>>> {
    let mut uuids: BTreeMap<ResourceKind, BTreeSet<String>> = BTreeMap::new();
    for descriptor in read_descriptors(bundle)? {
        if let Some(uuid) = descriptor.uuid() {
            uuids.entry(descriptor.kind).or_default().insert(uuid);
        }
    }
    Ok(uuids)
}

/// Uuid of the first descriptor of `kind`, used to map a single-resource export
/// back to its uuid.
pub fn first_uuid_of_kind(bundle: &[u8], kind: ResourceKind) -> CoreResult<Option<String>> {
    Ok(read_descriptors(bundle)?
        .into_iter()
        .filter(|descriptor| descriptor.kind == kind)
        .find_map(|descriptor| descriptor.uuid()))
}

/// Inject connection passwords into database descriptors.
///
/// Exports never carry secrets, so a re-import without this step cannot
/// recreate a working connection. Entries other than matching database
/// descriptors are copied unchanged.
pub fn apply_db_passwords(
    bundle: &[u8],
    passwords: &BTreeMap<String, String>,
) -> CoreResult<Vec<u8>> {
    if passwords.is_empty() {
        return Ok(bundle.to_vec());
    }

    let mut patched = Vec::new();
    for (name, data) in read_entries(bundle)? {
        let relative = remove_root(&name);
        let is_database = ResourceKind::from_bundle_path(relative) == Some(ResourceKind::Database);
        if !(is_database && is_yaml(relative)) {
            patched.push((name, data));
            continue;
        }

        let mut config = parse_yaml(&name, &data)?;
        let password = yaml_text(config.get("uuid"))
            .and_then(|uuid| passwords.get(&uuid))
            .cloned();
        // A uuid was found, so the descriptor is a mapping.
        let data = match password {
            Some(password) => {
                if let Some(mapping) = config.as_mapping_mut() {
                    mapping.insert(
                        YamlValue::String(String::from("password")),
                        YamlValue::String(password),
                    );
                }
                serde_yaml::to_string(&config)
                    .map_err(|e| CoreError::from_yaml(&name, e))?
                    .into_bytes()
            }
            None => data,
        };
        patched.push((name, data));
    }

    write_bundle(patched)
}
