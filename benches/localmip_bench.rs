//! Criterion benchmarks for the Local-MIP engine.
//!
//! Uses synthetic weighted set-cover instances so the numbers reflect
//! move selection and incremental bookkeeping only.

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_localmip::localmip::{tight_score, LocalMip, MipConfig};
use u_localmip::model::{MipModel, MipModelBuilder, ObjectiveSense, Sense, VarType};

// ===========================================================================
// Weighted set cover: every element covered by at least one chosen set
// ===========================================================================

fn set_cover(num_sets: usize, num_elems: usize, seed: u64) -> (MipModel, f64) {
    let mut rng = u_numflow::random::create_rng(seed);
    let mut b = MipModelBuilder::new(format!("cover_{}x{}", num_sets, num_elems));
    let sets: Vec<usize> = (0..num_sets)
        .map(|i| b.add_variable(format!("s{}", i), VarType::Binary, 0.0, 1.0))
        .collect();

    for e in 0..num_elems {
        let terms: Vec<(usize, f64)> = (0..3)
            .map(|_| (sets[rng.random_range(0..num_sets)], 1.0))
            .collect();
        b.add_constraint(format!("e{}", e), terms, Sense::Ge, 1.0);
    }

    let costs: Vec<(usize, f64)> = sets
        .iter()
        .map(|&s| (s, rng.random_range(1..=10) as f64))
        .collect();
    let total: f64 = costs.iter().map(|&(_, c)| c).sum();
    b.set_objective(ObjectiveSense::Minimize, costs, 0.0);
    (b.build().expect("valid set cover"), total)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_first_feasible(c: &mut Criterion) {
    let mut group = c.benchmark_group("localmip_first_feasible");
    group.sample_size(10);

    for &(sets, elems) in &[(50usize, 100usize), (200, 400), (500, 1000)] {
        let (model, target) = set_cover(sets, elems, 42);
        let config = MipConfig::default().with_cutoff(Duration::from_secs(5));
        group.bench_with_input(
            BenchmarkId::new(format!("s{}_e{}", sets, elems), sets),
            &(model, config),
            |b, (m, c)| {
                b.iter(|| {
                    let rng = u_numflow::random::create_rng(7);
                    let mut engine = LocalMip::new(m, c, rng).expect("valid config");
                    let status = engine.local_search(Some(target), Instant::now());
                    black_box(status)
                })
            },
        );
    }
    group.finish();
}

fn bench_tight_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("localmip_tight_score");

    for &sets in &[100usize, 1000] {
        let (model, _) = set_cover(sets, sets * 2, 42);
        let config = MipConfig::default();
        let engine = LocalMip::new(&model, &config, u_numflow::random::create_rng(1))
            .expect("valid config");
        let cons: Vec<_> = (0..model.num_cons())
            .map(|i| engine.con_state(i).clone())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(sets), &model, |b, m| {
            b.iter(|| {
                let mut acc = 0i64;
                for var in 0..m.num_vars() {
                    acc += tight_score(black_box(m), &cons, false, var, 1.0).score;
                }
                black_box(acc)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_first_feasible, bench_tight_score);
criterion_main!(benches);
