//! Concurrent first use: each shaped type is synthesized once and each struct
//! is compiled once, no matter how many threads race for it.

use std::sync::Arc;

use ntest::timeout;
use rayon::prelude::*;

use cstruct_core::types::{BaseKind, FieldType, Shape, ShapedTypeCache};
use cstruct_core::{
    DeclaredType, PrimitiveKind, SchemaRegistry, StructCompiler, StructDecl, StructOptions,
};

#[test]
#[timeout(1000)]
fn test_concurrent_materialization_yields_one_instance() {
    let cache = ShapedTypeCache::new();
    let base = BaseKind::Primitive(PrimitiveKind::U8);
    let shape = Shape::new(vec![4, 4]).unwrap();

    let types: Vec<FieldType> = (0..64)
        .into_par_iter()
        .map(|_| cache.materialize(&base, &shape))
        .collect();

    let first = match &types[0] {
        FieldType::Shaped(shaped) => shaped.clone(),
        other => panic!("expected shaped type, got {:?}", other),
    };
    for ty in &types {
        match ty {
            FieldType::Shaped(shaped) => assert!(Arc::ptr_eq(shaped, &first)),
            other => panic!("expected shaped type, got {:?}", other),
        }
    }
    assert_eq!(cache.len(), 1);
}

#[test]
#[timeout(1000)]
fn test_concurrent_distinct_shapes() {
    let cache = ShapedTypeCache::new();
    let base = BaseKind::Primitive(PrimitiveKind::I16);

    (0..256usize).into_par_iter().for_each(|i| {
        let shape = Shape::new(vec![i % 8 + 2]).unwrap();
        cache.materialize(&base, &shape);
    });

    assert_eq!(cache.len(), 8);
}

#[test]
#[timeout(1000)]
fn test_concurrent_compilation_installs_one_schema() {
    let cache = Arc::new(ShapedTypeCache::new());
    let compiler = StructCompiler::with_cache(cache.clone());
    let sample = StructDecl::new("Sample")
        .field("t", PrimitiveKind::U64)
        .field("channels", DeclaredType::parse("f32[8]").unwrap())
        .declare();

    let schemas: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| compiler.compile(&sample, &StructOptions::default()).unwrap())
        .collect();

    let installed = sample.schema().unwrap();
    assert!(schemas.iter().all(|s| Arc::ptr_eq(s, &installed)));
    assert_eq!(installed.fields().len(), 2);
    assert_eq!(cache.len(), 1);
}

#[test]
#[timeout(1000)]
fn test_concurrent_registry_compilation() {
    let registry = SchemaRegistry::new();
    registry
        .declare(
            StructDecl::new("Vec3").field("xyz", DeclaredType::parse("f32[3]").unwrap()),
            StructOptions::default(),
        )
        .unwrap();
    for i in 0..16 {
        registry
            .declare(
                StructDecl::new(format!("Body{}", i))
                    .field("position", DeclaredType::named("Vec3"))
                    .field("velocity", DeclaredType::named("Vec3")),
                StructOptions::default(),
            )
            .unwrap();
    }

    let names = registry.names();
    names
        .par_iter()
        .chain(names.par_iter())
        .for_each(|name| {
            registry.compile(name).unwrap();
        });

    let vec3 = registry.schema("Vec3").unwrap();
    for i in 0..16 {
        let body = registry.schema(&format!("Body{}", i)).unwrap();
        match &body.fields()[0].spec.base {
            BaseKind::Struct(structure) => {
                assert!(Arc::ptr_eq(&structure.schema().unwrap(), &vec3))
            }
            other => panic!("expected struct base, got {:?}", other),
        }
    }
}
