//! Resolution and compilation benchmark.
//!
//! Measures:
//! - Type-expression parsing and resolution
//! - Shaped-type materialization on a warm cache
//! - Compiling a fresh struct with nested and shaped fields
//! - Running a generated constructor

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cstruct_core::types::{resolve, BaseKind, Shape, ShapedTypeCache};
use cstruct_core::{DeclaredType, PrimitiveKind, StructCompiler, StructDecl, StructOptions, Value};

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for text in ["u8", "f32[4,4]", "const<u8>[8]", "const<i16[2,3,4]>"] {
        let declared = DeclaredType::parse(text).unwrap();
        group.bench_with_input(BenchmarkId::new("parse", text), text, |b, text| {
            b.iter(|| DeclaredType::parse(black_box(text)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("resolve", text), &declared, |b, declared| {
            b.iter(|| resolve(black_box(declared)).unwrap())
        });
    }
    group.finish();
}

fn bench_materialize(c: &mut Criterion) {
    let cache = ShapedTypeCache::new();
    let base = BaseKind::Primitive(PrimitiveKind::U8);
    let shape = Shape::new(vec![4, 4]).unwrap();
    cache.materialize(&base, &shape);

    c.bench_function("materialize_warm", |b| {
        b.iter(|| cache.materialize(black_box(&base), black_box(&shape)))
    });
}

fn bench_compile(c: &mut Criterion) {
    let compiler = StructCompiler::with_cache(Arc::new(ShapedTypeCache::new()));
    let options = StructOptions::default();
    let point = StructDecl::new("Point")
        .field("x", PrimitiveKind::F32)
        .field("y", PrimitiveKind::F32)
        .declare();
    compiler.compile(&point, &options).unwrap();

    let mut group = c.benchmark_group("compile");
    for field_count in [4usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(field_count),
            &field_count,
            |b, &field_count| {
                b.iter(|| {
                    let mut decl = StructDecl::new("Mesh");
                    for i in 0..field_count {
                        decl = match i % 3 {
                            0 => decl.field(format!("f{}", i), PrimitiveKind::U32),
                            1 => decl.field(
                                format!("f{}", i),
                                DeclaredType::from(PrimitiveKind::F32).shaped(&[4, 4]),
                            ),
                            _ => decl.field(format!("f{}", i), DeclaredType::from(&point).shaped(&[3])),
                        };
                    }
                    compiler.compile(&decl.declare(), &options).unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_construct(c: &mut Criterion) {
    let options = StructOptions::default();
    let sample = StructDecl::new("Sample")
        .field("t", PrimitiveKind::U64)
        .field("channels", DeclaredType::parse("f32[16]").unwrap())
        .compile(&options)
        .unwrap();

    c.bench_function("construct_broadcast", |b| {
        b.iter(|| {
            sample
                .instantiate(vec![Value::U64(1), Value::F32(black_box(0.5))])
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_materialize,
    bench_compile,
    bench_construct
);
criterion_main!(benches);
