use crate::ResourceKind;
use crate::resource::{dataset_database_id, display_name, resource_id, resource_uuid};

use serde_json::json;

#[test]
fn test_display_name_prefers_specific_key() {
    let chart = json!({"id": 1, "slice_name": "Revenue", "name": "ignored"});
    assert_eq!(
        display_name(ResourceKind::Chart, &chart),
        Some("Revenue".to_string())
    );

    let dataset = json!({"id": 2, "table_name": "", "name": "orders"});
    assert_eq!(
        display_name(ResourceKind::Dataset, &dataset),
        Some("orders".to_string())
    );

    assert_eq!(display_name(ResourceKind::Database, &json!({"id": 3})), None);
}

#[test]
fn test_resource_id_and_uuid() {
    let resource = json!({"id": 12, "uuid": "abc"});
    assert_eq!(resource_id(&resource), Some(12));
    assert_eq!(resource_uuid(&resource), Some("abc".to_string()));
    assert_eq!(resource_uuid(&json!({"id": 12, "uuid": ""})), None);
}

#[test]
fn test_dataset_database_id_reads_flat_then_nested() {
    assert_eq!(dataset_database_id(&json!({"database_id": 4})), Some(4));
    assert_eq!(
        dataset_database_id(&json!({"database": {"id": 5, "database_name": "x"}})),
        Some(5)
    );
    assert_eq!(dataset_database_id(&json!({"id": 9})), None);
}
