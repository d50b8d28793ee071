//! Criterion benchmarks for foam dispersion and contour extraction.
//!
//! Measures one `FoamPipeline::update` per strategy over a realistic set of
//! aging foam rows, plus a full fixed tick through the `TestBeach` harness
//! once a break is under way.
//!
//! Run with: cargo bench -p surf_simulation --bench foam_bench --features bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use surf_simulation::bathymetry::FlatBathymetry;
use surf_simulation::config::{FoamConfig, FoamStrategyKind};
use surf_simulation::foam::{FoamPipeline, FoamRow, FoamSegment};
use surf_simulation::test_harness::TestBeach;

/// Rows deposited every 300ms over 6s by a wave crossing a sandbar.
fn aging_rows() -> Vec<FoamRow> {
    (0..20)
        .map(|i| FoamRow {
            progress: 0.4 + i as f32 * 0.02,
            spawn_time: i as f64 * 300.0,
            segments: vec![
                FoamSegment::new(0.1, 0.35, 0.6),
                FoamSegment::new(0.5, 0.9, 0.9),
            ],
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmark: pipeline update per strategy
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("foam_pipeline_update");
    let rows = aging_rows();

    for kind in [
        FoamStrategyKind::Blur,
        FoamStrategyKind::ExpandBounds,
        FoamStrategyKind::Radius,
    ] {
        let config = FoamConfig {
            strategy: kind,
            ..Default::default()
        };
        let mut pipeline = FoamPipeline::new(&config).expect("default foam grid is valid");
        group.bench_with_input(BenchmarkId::from_parameter(format!("{kind:?}")), &kind, |b, _| {
            b.iter(|| {
                pipeline.update(black_box(&rows), 6_000.0, 1.0 / 60.0, &config, true);
                black_box(pipeline.contours().segment_count())
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: full fixed tick while foam is live
// ---------------------------------------------------------------------------

fn bench_full_tick(c: &mut Criterion) {
    let mut beach = TestBeach::new().with_bathymetry(FlatBathymetry { depth: 0.2 });
    // First lull wave spawns at 15s and breaks immediately.
    beach.run_secs(18);

    c.bench_function("surf_fixed_tick_with_foam", |b| {
        b.iter(|| beach.tick(1));
    });
}

criterion_group!(benches, bench_pipeline, bench_full_tick);
criterion_main!(benches);
