use contagion::Arbitrary;
use contagion::dynamics::engine::Engine;
use contagion::dynamics::rates::Rates;
use contagion::graph::Graph;
use contagion::sampling::lifetime::Exponential;
use contagion::sampling::tree::SumTree;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        sampling_tree_leaves,
        drawing_lifetimes,
        stepping_events,
}

fn sampling_tree_leaves(c: &mut criterion::Criterion) {
    let mut tree = SumTree::new(16);
    let mut rng = SmallRng::seed_from_u64(0);
    for k in 0..16 {
        tree.add(k, rng.random::<f64>() * 10.);
    }
    c.bench_function("sample a 16-leaf sum tree", |b| {
        b.iter(|| tree.sample(rng.random::<f64>()))
    });
}

fn drawing_lifetimes(c: &mut criterion::Criterion) {
    let table = Exponential::default();
    let mut rng = SmallRng::seed_from_u64(0);
    c.bench_function("draw an exponential lifetime", |b| {
        b.iter(|| table.draw(&mut rng, 12.5))
    });
}

fn stepping_events(c: &mut criterion::Criterion) {
    let graph = Arc::new(Graph::random());
    let rates = Rates::new(1., 0.5, f64::INFINITY).unwrap();
    let mut engine = Engine::new(graph, rates, 2.).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    for node in 0..engine.size() / 2 {
        engine.infect(node);
    }
    let live = engine.snapshot();
    c.bench_function("apply one SIS event", |b| {
        b.iter(|| {
            if engine.is_absorbed() {
                engine.restore(&live);
            }
            engine.update_event(&mut rng)
        })
    });
}
