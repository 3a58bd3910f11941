//! Object metadata tagging as seen by a downstream loader
//!
//! A stage writes an object and tags it; a later stage reads the tags back
//! and derives the warehouse table it loads into.

use serde_json::json;
use stagechain_core::metadata::{
    generate_attributes, Attributes, FieldType, MetadataError, ObjectMetadata, FIELD_NAMES_KEY, FIELD_TYPES_KEY,
    SCHEMA_NAME_KEY, TABLE_NAME_KEY,
};

fn school_fields() -> Vec<(String, FieldType)> {
    vec![
        ("_id".to_string(), FieldType::MongoId),
        ("name".to_string(), FieldType::String),
        ("enrollment".to_string(), FieldType::Integer),
        ("charter".to_string(), FieldType::Boolean),
        ("updated_at".to_string(), FieldType::Timestamp),
    ]
}

#[test]
fn test_tag_then_load() {
    // GIVEN: attributes written next to a stored object
    let mut stored: Attributes = generate_attributes("clever", "schools", school_fields()).unwrap();
    stored.insert("content-type".to_string(), "application/x-ndjson".to_string());

    assert_eq!(stored[FIELD_NAMES_KEY], "_id,name,enrollment,charter,updated_at");
    assert_eq!(stored[FIELD_TYPES_KEY], "mongo_id,string,integer,boolean,timestamp");

    // WHEN: a loader reads them back
    let metadata = ObjectMetadata::from_attributes(&stored).unwrap();
    let table = metadata.to_table_config().unwrap();

    // THEN: the table layout follows the declared field order
    assert_eq!(metadata.fields, school_fields());
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        json!({
            "schema": "clever",
            "table": "schools",
            "columns": [
                {"name": "_id", "column_type": "char(24)"},
                {"name": "name", "column_type": "varchar(256)"},
                {"name": "enrollment", "column_type": "integer"},
                {"name": "charter", "column_type": "boolean"},
                {"name": "updated_at", "column_type": "timestamp"},
            ]
        })
    );
}

#[test]
fn test_field_types_serialize_as_wire_names() {
    let metadata = ObjectMetadata::new("s", "t", [("_id".to_string(), FieldType::MongoId)]);
    let value = serde_json::to_value(&metadata).unwrap();

    assert_eq!(value["fields"], json!([["_id", "mongo_id"]]));
    assert_eq!("mongo_id".parse::<FieldType>().unwrap(), FieldType::MongoId);
    assert_eq!(FieldType::Timestamp.to_string(), "timestamp");
}

#[test]
fn test_untagged_object_is_rejected() {
    let mut attributes = Attributes::new();
    attributes.insert("content-type".to_string(), "text/plain".to_string());

    let err = ObjectMetadata::from_attributes(&attributes).unwrap_err();
    assert_eq!(err, MetadataError::Empty("schema"));
}

#[test]
fn test_mismatched_lists_report_both_sides() {
    let attributes: Attributes = [
        (SCHEMA_NAME_KEY, "clever"),
        (TABLE_NAME_KEY, "schools"),
        (FIELD_NAMES_KEY, "_id,name"),
        (FIELD_TYPES_KEY, "mongo_id"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let err = ObjectMetadata::from_attributes(&attributes).unwrap_err();
    assert_eq!(
        err.to_string(),
        "field configuration mismatch. names: _id,name, types: mongo_id"
    );
}
