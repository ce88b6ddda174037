//! End-to-end scenarios: declare, compile, nest and construct.

use std::sync::Arc;

use cstruct_core::types::{
    is_supported, resolve, BaseKind, FieldType, Shape, ShapedTypeCache, TypeSpecification,
};
use cstruct_core::{
    cstruct, CStructError, DeclaredType, PrimitiveKind, StructCompiler, StructDecl, StructOptions,
    Value,
};

/// First(x: i32), then Second(y: First[3])
#[test]
fn test_nested_struct_array() -> anyhow::Result<()> {
    let options = StructOptions::default();
    let first = cstruct(StructDecl::new("First").field("x", PrimitiveKind::I32), &options)?;

    let first_schema = first.schema().expect("First is compiled");
    assert_eq!(first_schema.fields().len(), 1);
    assert_eq!(first_schema.fields()[0].name, "x");
    assert_eq!(
        first_schema.fields()[0].spec,
        TypeSpecification {
            base: BaseKind::Primitive(PrimitiveKind::I32),
            shape: Shape::scalar(),
            is_const: false,
        }
    );

    let second = cstruct(
        StructDecl::new("Second").field("y", DeclaredType::from(&first).shaped(&[3])),
        &options,
    )?;
    let second_schema = second.schema().expect("Second is compiled");
    let y = &second_schema.fields()[0];
    assert_eq!(y.spec.base, BaseKind::Struct(first.clone()));
    assert_eq!(y.spec.shape.dims(), &[3]);

    let shaped = match &y.field_type {
        FieldType::Shaped(shaped) => shaped.clone(),
        other => panic!("expected shaped type, got {:?}", other),
    };

    // One instance broadcasts
    let one = first.instantiate(vec![Value::I32(5)])?;
    let array = shaped.construct(vec![Value::Struct(one.clone())])?;
    assert_eq!(array.len(), 3);
    assert!(array.elements().iter().all(|v| *v == Value::Struct(one.clone())));

    // Three instances assign in order
    let items: Vec<Value> = (1..=3)
        .map(|i| first.instantiate(vec![Value::I32(i)]).map(Value::Struct))
        .collect::<Result<_, _>>()?;
    let array = shaped.construct(items.clone())?;
    assert_eq!(array.elements(), items.as_slice());

    // Two is neither
    assert!(matches!(
        shaped.construct(items[..2].to_vec()),
        Err(CStructError::InvalidElementCount {
            expected: 3,
            got: 2,
            ..
        })
    ));

    let value = second.instantiate(vec![Value::Array(array)])?;
    assert_eq!(
        value.to_string(),
        "Second(y=[First(x=1), First(x=2), First(x=3)])"
    );
    Ok(())
}

#[test]
fn test_foreign_type_rejected() {
    let result = cstruct(
        StructDecl::new("Record")
            .field("id", PrimitiveKind::U64)
            .field("label", DeclaredType::foreign::<String>()),
        &StructOptions::default(),
    );
    match result {
        Err(CStructError::UnsupportedField {
            structure, field, ..
        }) => {
            assert_eq!(structure, "Record");
            assert_eq!(field, "label");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_shape_arithmetic() -> anyhow::Result<()> {
    let cache = ShapedTypeCache::new();
    let shape = Shape::new(vec![4, 4])?;
    assert_eq!(shape.element_count(), 16);

    let shaped = match cache.materialize(&BaseKind::Primitive(PrimitiveKind::F32), &shape) {
        FieldType::Shaped(shaped) => shaped,
        other => panic!("expected shaped type, got {:?}", other),
    };

    let broadcast = shaped.construct(vec![Value::F32(1.5)])?;
    assert_eq!(broadcast.len(), 16);
    assert!(broadcast.elements().iter().all(|v| *v == Value::F32(1.5)));

    let values: Vec<Value> = (0..16).map(|i| Value::F32(i as f32)).collect();
    let exact = shaped.construct(values.clone())?;
    assert_eq!(exact.elements(), values.as_slice());

    for n in [2usize, 17] {
        assert!(matches!(
            shaped.construct(vec![Value::F32(0.0); n]),
            Err(CStructError::InvalidElementCount { expected: 16, .. })
        ));
    }
    Ok(())
}

#[test]
fn test_const_shape_composition() -> anyhow::Result<()> {
    let expected = TypeSpecification {
        base: BaseKind::Primitive(PrimitiveKind::U8),
        shape: Shape::new(vec![8])?,
        is_const: true,
    };
    for text in ["const<u8[8]>", "const<u8>[8]"] {
        assert_eq!(resolve(&DeclaredType::parse(text)?)?, expected);
    }

    let with_const_field = cstruct(
        StructDecl::new("Key").field("bytes", DeclaredType::parse("const<u8>[8]")?),
        &StructOptions::default(),
    )?;
    let schema = with_const_field.schema().expect("Key is compiled");
    assert_eq!(schema.fields()[0].spec, expected);
    assert_eq!(schema.packed_size(), Some(8));
    Ok(())
}

#[test]
fn test_transitive_support_follows_redeclaration() -> anyhow::Result<()> {
    let options = StructOptions::default();
    let inner = cstruct(StructDecl::new("Inner").field("a", PrimitiveKind::U16), &options)?;
    let outer = cstruct(
        StructDecl::new("Outer")
            .field("inner", &inner)
            .field("b", PrimitiveKind::U8),
        &options,
    )?;
    assert!(is_supported(&BaseKind::Struct(outer.clone()))?);

    inner.redeclare(StructDecl::new("Inner").field("a", DeclaredType::foreign::<Vec<u8>>()));
    assert!(!is_supported(&BaseKind::Struct(outer.clone()))?);
    assert!(inner.compile(&options).is_err());
    assert!(!is_supported(&BaseKind::Struct(outer.clone()))?);

    inner.redeclare(StructDecl::new("Inner").field("a", PrimitiveKind::U32));
    inner.compile(&options)?;
    assert!(is_supported(&BaseKind::Struct(outer))?);
    Ok(())
}

#[test]
fn test_recompilation_preserves_order() -> anyhow::Result<()> {
    let names = ["w", "h", "d", "a"];
    let mut decl = StructDecl::new("Box");
    for name in names {
        decl = decl.field(name, PrimitiveKind::U32);
    }
    let boxed = decl.declare();
    let compiler = StructCompiler::new();

    let first = compiler.compile(&boxed, &StructOptions::default())?;
    let again = compiler.compile(&boxed, &StructOptions::default())?;
    assert!(Arc::ptr_eq(&first, &again));

    let order: Vec<&str> = again.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(order, names);
    Ok(())
}

#[test]
fn test_indirect_cycle_detected() -> anyhow::Result<()> {
    let options = StructOptions::default();
    let a = cstruct(StructDecl::new("A").field("v", PrimitiveKind::U8), &options)?;
    let b = cstruct(StructDecl::new("B").field("a", &a), &options)?;

    // A now contains B, which contains A
    a.redeclare(StructDecl::new("A").field("b", &b));
    match a.compile(&options) {
        Err(CStructError::CyclicSchema { path }) => {
            assert_eq!(path.first().map(String::as_str), Some("A"));
            assert_eq!(path.last().map(String::as_str), Some("A"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!a.is_compiled());
    Ok(())
}

#[test]
fn test_missing_annotation() {
    let result = cstruct(
        StructDecl::new("Versioned")
            .field("payload", DeclaredType::parse("u8[16]").unwrap())
            .attribute("VERSION", 2u8),
        &StructOptions::default(),
    );
    assert_eq!(
        result.unwrap_err(),
        CStructError::MissingAnnotation {
            structure: "Versioned".to_string(),
            field: "VERSION".to_string(),
        }
    );
}

#[test]
fn test_shape_conflict() {
    let result = cstruct(
        StructDecl::new("Grid").field("cells", DeclaredType::parse("u8[2][3]").unwrap()),
        &StructOptions::default(),
    );
    assert!(matches!(result, Err(CStructError::ShapeConflict { .. })));
}
