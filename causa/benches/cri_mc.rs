use causa::mc;
use causa::mc::Seed;
use criterion::{criterion_group, criterion_main, Criterion};
use tinyrand::Wyrand;

fn criterion_benchmark(c: &mut Criterion) {
    // sanity check
    let simulation = mc::monte_carlo(6.0, 4.5, 1_000, &[9.5], Seed::Fixed(42));
    assert_eq!(1_000, simulation.samples.len());

    c.bench_function("cri_mc_draw_wyrand", |b| {
        let mut rand = Wyrand::default();
        b.iter(|| mc::draw(10.5, &mut rand));
    });

    c.bench_function("cri_mc_10k_wyrand", |b| {
        let mut rand = Wyrand::default();
        let thresholds = [8.5, 9.5, 10.5, 11.5, 12.5, 13.5];
        b.iter(|| mc::monte_carlo_with(8.28, 4.455, 10_000, &thresholds, &mut rand));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
