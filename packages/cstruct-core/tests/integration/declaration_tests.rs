//! Declaration files loaded from disk.

use std::fs;

use serde_json::json;
use tempfile::tempdir;

use cstruct_core::declaration::load_declarations_file;
use cstruct_core::types::{BaseKind, FieldType, Value};
use cstruct_core::{CStructError, Endianness};

const SENSORS: &str = r#"{
    "structs": [
        { "name": "Reading",
          "options": { "layout": { "endianness": "big", "alignment": 4 } },
          "fields": [ { "name": "channel", "type": "u8" },
                      { "name": "samples", "type": "f32[2,2]" },
                      { "name": "serial", "type": "const<u32>" } ] },
        { "name": "Batch",
          "fields": [ { "name": "count", "type": "u16" },
                      { "name": "readings", "type": "Reading[2]" } ] }
    ]
}"#;

#[test]
fn test_load_compile_and_construct() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sensors.json");
    fs::write(&path, SENSORS)?;

    let registry = load_declarations_file(&path)?;
    let schemas = registry.compile_all()?;
    assert_eq!(schemas.len(), 2);

    let reading = registry.schema("Reading")?;
    assert_eq!(reading.layout().endianness, Endianness::Big);
    assert_eq!(reading.layout().alignment, 4);
    assert_eq!(reading.packed_size(), Some(1 + 16 + 4));

    let batch = registry.schema("Batch")?;
    assert_eq!(batch.packed_offset_of("readings"), Some(2));
    assert_eq!(batch.packed_size(), Some(2 + 2 * 21));

    let batch_type = FieldType::Base(BaseKind::Struct(
        registry.get("Batch").expect("Batch is registered"),
    ));
    let value = Value::from_json(&batch_type, &json!([2, [[1, [0.5], 77]]]))?;
    assert_eq!(
        value.to_string(),
        "Batch(count=2, readings=[Reading(channel=1, samples=[0.5, 0.5, 0.5, 0.5], serial=77), \
         Reading(channel=1, samples=[0.5, 0.5, 0.5, 0.5], serial=77)])"
    );
    Ok(())
}

#[test]
fn test_fingerprint_stable_across_loads() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sensors.json");
    fs::write(&path, SENSORS)?;

    let first = load_declarations_file(&path)?;
    let second = load_declarations_file(&path)?;
    first.compile_all()?;
    second.compile_all()?;

    for name in ["Reading", "Batch"] {
        assert_eq!(
            first.schema(name)?.fingerprint(),
            second.schema(name)?.fingerprint()
        );
    }
    Ok(())
}

#[test]
fn test_invalid_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"structs\": [ { \"fields\": [] } ] }")?;

    assert!(matches!(
        load_declarations_file(&path),
        Err(CStructError::Declaration(_))
    ));
    Ok(())
}

#[test]
fn test_deeply_nested_type_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested.json");
    let type_expr = format!("{}u8{}", "const<".repeat(200_000), ">".repeat(200_000));
    let file = json!({
        "structs": [ { "name": "Deep", "fields": [ { "name": "v", "type": type_expr } ] } ]
    });
    fs::write(&path, file.to_string())?;

    assert!(matches!(
        load_declarations_file(&path),
        Err(CStructError::UnresolvableType { .. })
    ));
    Ok(())
}
