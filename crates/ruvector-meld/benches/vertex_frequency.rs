//! Benchmarks for window construction and the vertex-frequency pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ruvector_meld::vfc::build_windows;
use ruvector_meld::{Graph, LaplacianGraph, Representation, VertexFrequencyCluster, VfcConfig};

fn block_graph(blocks: usize, size: usize) -> LaplacianGraph {
    let mut edges = Vec::new();
    for b in 0..blocks {
        let base = b * size;
        for i in 0..size {
            edges.push((base + i, base + (i + 1) % size, 1.0));
            edges.push((base + i, base + (i + 4) % size, 0.5));
        }
        edges.push((base, (base + size) % (blocks * size), 0.05));
    }
    LaplacianGraph::from_edges(blocks * size, &edges).unwrap()
}

fn block_signal(blocks: usize, size: usize) -> Vec<f64> {
    (0..blocks * size).map(|i| (i / size) as f64 + 0.1 * ((i * 3) % 7) as f64).collect()
}

fn bench_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("windows");
    group.sample_size(20);

    for n in [40, 120] {
        let operator = block_graph(4, n / 4).diffusion_operator();
        let scales: Vec<u32> = (0..9).map(|i| 1 << i).collect();

        for representation in [Representation::Dense, Representation::Sparse] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", representation), n),
                &operator,
                |bench, op| {
                    bench.iter(|| build_windows(black_box(op), &scales, representation));
                },
            );
        }
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_frequency");
    group.sample_size(10);

    for n in [40, 120] {
        let signal = block_signal(4, n / 4);

        group.bench_with_input(BenchmarkId::new("fit_predict", n), &signal, |bench, s| {
            bench.iter(|| {
                let mut g = block_graph(4, n / 4);
                let mut vfc = VertexFrequencyCluster::new(VfcConfig::with_clusters(4).window_count(5))
                    .unwrap();
                vfc.fit_predict(&mut g, black_box(s), s, 1.0).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_windows, bench_pipeline);
criterion_main!(benches);
