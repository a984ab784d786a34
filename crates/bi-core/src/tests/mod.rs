mod resource;

use crate::bundle::write_bundle;

/// Build an export bundle from `(relative path, yaml)` pairs under a fixed root.
pub(crate) fn bundle_of(entries: &[(&str, &str)]) -> Vec<u8> {
    write_bundle(entries.iter().map(|(path, yaml)| {
        (
            format!("dashboard_export_20240101T000000/{path}"),
            yaml.as_bytes().to_vec(),
        )
    }))
    .unwrap()
}
