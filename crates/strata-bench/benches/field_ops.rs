//! Criterion micro-benchmarks for field remapping and codecs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_bench::{ramp_field, reference_grid};
use strata_core::ElementType;
use strata_field::remap::{self, ExportFill};
use strata_field::{grdecl, ExportFormat, ExportTarget, Field};
use strata_grid::IndexOrder;

/// Benchmark: Expand 200K cells to the full volume in natural order.
fn bench_export_3d_natural(c: &mut Criterion) {
    let field = ramp_field(reference_grid(42), ElementType::Float);

    c.bench_function("export_3d_natural_200k", |b| {
        b.iter(|| {
            let full = remap::export_3d(
                field.config(),
                field.data(),
                None,
                IndexOrder::Natural,
                ElementType::Float,
                ExportFill::Zero,
            )
            .unwrap();
            black_box(&full);
        });
    });
}

/// Benchmark: Same expansion in ROFF order, widening to the sentinel fill.
fn bench_export_3d_roff(c: &mut Criterion) {
    let field = ramp_field(reference_grid(42), ElementType::Double);

    c.bench_function("export_3d_roff_200k", |b| {
        b.iter(|| {
            let full = remap::export_3d(
                field.config(),
                field.data(),
                None,
                IndexOrder::Roff,
                ElementType::Float,
                ExportFill::RoffInactive,
            )
            .unwrap();
            black_box(&full);
        });
    });
}

/// Benchmark: Compress a field into a native storage record.
fn bench_native_write(c: &mut Criterion) {
    let field = ramp_field(reference_grid(42), ElementType::Float);

    c.bench_function("native_write_200k", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(1 << 20);
            field.write_to_buffer(&mut buf).unwrap();
            black_box(&buf);
        });
    });
}

/// Benchmark: Decompress the same record back into a field.
fn bench_native_read(c: &mut Criterion) {
    let field = ramp_field(reference_grid(42), ElementType::Float);
    let mut record = Vec::new();
    field.write_to_buffer(&mut record).unwrap();
    let mut target = Field::new(field.config().clone());

    c.bench_function("native_read_200k", |b| {
        b.iter(|| {
            target.read_from_buffer(&mut record.as_slice()).unwrap();
            black_box(target.iget_f64(0));
        });
    });
}

/// Benchmark: Parse a 200K-value GRDECL keyword.
fn bench_grdecl_parse(c: &mut Criterion) {
    let field = ramp_field(reference_grid(42), ElementType::Float);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("poro.grdecl");
    field
        .export(ExportTarget::Path(&path), ExportFormat::Grdecl, false, None)
        .unwrap();
    let text = std::fs::read(&path).unwrap();
    let volume = field.config().volume();

    c.bench_function("grdecl_parse_200k", |b| {
        b.iter(|| {
            let data = grdecl::read_grdecl(&mut text.as_slice(), "PORO", ElementType::Float, volume)
                .unwrap()
                .unwrap();
            black_box(&data);
        });
    });
}

criterion_group!(
    benches,
    bench_export_3d_natural,
    bench_export_3d_roff,
    bench_native_write,
    bench_native_read,
    bench_grdecl_parse,
);
criterion_main!(benches);
