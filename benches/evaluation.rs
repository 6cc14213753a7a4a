use centurycore::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;

fn initial_conditions() -> InitialConditions {
    InitialConditions {
        necromass: 250.0,
        ln: 12.0,
        frala: 0.4,
        len0: 4.0,
        pas0: 8.0,
        act0: 15.0,
        resp0: 1.0,
    }
}

/// Synthetic training data generated from known coefficients over 60 days
fn setup_fitness() -> Fitness {
    let model = Century::new(initial_conditions()).unwrap();
    let params = Parameters::from_slice(&[
        0.2, 0.05, 0.03, 0.1, 0.005, 0.3, 0.45, 0.55, 0.3, 0.55, 0.4, 0.05, 0.05,
    ])
    .unwrap();
    let times = Array1::linspace(0.0, 60.0, 31);
    let simulated = model.simulate(&times.to_vec(), &params).unwrap();
    let data = TrainingData::new(times, simulated.active, simulated.respiration).unwrap();
    Fitness::new(model, data)
}

/// Fitness of a single random candidate
fn benchmark_evaluation(c: &mut Criterion) {
    let fitness = setup_fitness();
    let mut rng = seeded(347);
    let values: Vec<f64> = (0..N_PARAMS).map(|_| rng.uniform()).collect();
    let candidate = Parameters::from_slice(&values).unwrap();
    c.bench_function("evaluation", |b| {
        b.iter(|| fitness.evaluate(black_box(&candidate)));
    });
}

/// One generation of a 50 candidate population
fn benchmark_generation(c: &mut Criterion) {
    let config = GeneticConfig {
        population_size: 50,
        ..Default::default()
    };
    let mut algorithm = Genetic::new(setup_fitness(), config, 347).unwrap();
    c.bench_function("generation", |b| {
        b.iter(|| algorithm.next_generation().unwrap());
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .noise_threshold(0.10); // Performance changes less than 10% will be ignored
    targets = benchmark_evaluation, benchmark_generation
}
criterion_main!(benches);
