//! Benchmarks for a full residual evaluation.
//!
//! Run with: `cargo bench --bench rhs_bench`
//!
//! Compares pipeline variants and polynomial orders on a periodic Euler
//! problem.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rdfr::{Euler2D, Mesh2D, PipelineVariant, SolverConfig, System, SystemBuilder};
use std::f64::consts::PI;

const GAMMA: f64 = 1.4;

/// Smooth density wave with a uniform drift.
fn setup(order: usize, variant: PipelineVariant, n: usize) -> System {
    let config = SolverConfig::default()
        .with_order(order)
        .with_riemann_difference(0.5)
        .with_pipeline(variant)
        .with_constant("gamma", GAMMA);
    let mesh = Mesh2D::uniform_periodic(0.0, 1.0, 0.0, 1.0, n, n);
    let mut system = SystemBuilder::new(config)
        .build(&mesh.single_partition())
        .unwrap();

    let euler = Euler2D::new(GAMMA);
    system
        .set_solution(0, |x, y, u| {
            let rho = 1.0 + 0.2 * (2.0 * PI * x).sin() * (2.0 * PI * y).sin();
            u.copy_from_slice(&euler.conserved(rho, 0.5, 0.25, 1.0));
        })
        .unwrap();
    system
}

/// Every variant at a fixed order.
fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("rhs_variants");

    for variant in PipelineVariant::ALL {
        let mut system = setup(3, variant, 16);
        group.bench_with_input(BenchmarkId::from_parameter(variant), &variant, |b, _| {
            b.iter(|| system.rhs(black_box(0.0), 0, 1).unwrap());
        });
    }

    group.finish();
}

/// Blended pipeline across orders.
fn bench_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("rhs_orders");

    for order in [1, 2, 3, 4] {
        let mut system = setup(order, PipelineVariant::RdBlended, 16);
        group.bench_with_input(BenchmarkId::new("rd_blended", order), &order, |b, _| {
            b.iter(|| system.rhs(black_box(0.0), 0, 1).unwrap());
        });
    }

    group.finish();
}

/// Scaling with element count.
fn bench_mesh_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("rhs_mesh_size");
    group.sample_size(20);

    for n in [8, 16, 32] {
        let mut system = setup(2, PipelineVariant::RdBlended, n);
        group.bench_with_input(BenchmarkId::new("elements", n * n), &n, |b, _| {
            b.iter(|| system.rhs(black_box(0.0), 0, 1).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_variants, bench_orders, bench_mesh_size);
criterion_main!(benches);
