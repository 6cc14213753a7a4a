use centurycore::prelude::*;
use eyre::Result;
use ndarray::array;

fn initial_conditions() -> InitialConditions {
    InitialConditions {
        necromass: 100.0,
        ln: 5.0,
        frala: 0.3,
        len0: 1.0,
        pas0: 2.0,
        act0: 3.0,
        resp0: 0.0,
    }
}

fn small_settings(population_size: usize, generations: usize) -> Settings {
    let mut settings = Settings::new("unused.csv", initial_conditions());
    settings.genetic.population_size = population_size;
    settings.config.generations = generations;
    settings.config.output = false;
    settings
}

fn training_data() -> TrainingData {
    TrainingData::new(
        array![0.0, 1.0, 2.0, 3.0],
        array![3.0, 9.0, 14.0, 17.0],
        array![0.0, 6.0, 10.0, 13.0],
    )
    .unwrap()
}

/// Smallest end-to-end run: four time points, ten candidates, five generations
#[test]
fn test_end_to_end() -> Result<()> {
    let result = fit_internal(small_settings(10, 5), training_data())?;

    assert_eq!(result.parameters().to_vec().len(), N_PARAMS);
    assert_eq!(result.generations(), 5);
    assert_eq!(result.status(), &Status::MaxGenerations);

    let milestones = result.milestones().milestones();
    assert!(!milestones.is_empty());
    assert_eq!(milestones[0].generation, 0);
    assert_eq!(result.error(), milestones[milestones.len() - 1].error);
    Ok(())
}

#[test]
fn test_milestones_strictly_improve() -> Result<()> {
    let result = fit_internal(small_settings(20, 15), training_data())?;
    let milestones = result.milestones().milestones();
    for pair in milestones.windows(2) {
        assert!(pair[1].error < pair[0].error);
        assert!(pair[1].generation > pair[0].generation);
    }
    assert!(milestones.iter().all(|m| m.error >= 0.0));
    Ok(())
}

#[test]
fn test_same_seed_same_result() -> Result<()> {
    let first = fit_internal(small_settings(10, 4), training_data())?;
    let second = fit_internal(small_settings(10, 4), training_data())?;
    assert_eq!(first.parameters(), second.parameters());
    assert_eq!(first.milestones(), second.milestones());
    Ok(())
}

#[test]
fn test_injected_random_source() -> Result<()> {
    let model = Century::new(initial_conditions())?;
    let fitness = Fitness::new(model, training_data());
    let config = GeneticConfig {
        population_size: 10,
        mutation_rate: 0.0,
        ..Default::default()
    };
    let mut ga = Genetic::with_rng(fitness, config, seeded(7))?;
    let initial = ga.population().clone();
    assert_eq!(initial.dim(), (10, N_PARAMS));

    ga.evaluation()?;
    ga.track_best();
    assert_eq!(ga.milestones().len(), 1);
    let best = ga.error();
    assert_eq!(
        best,
        ga.scores().iter().copied().fold(f64::INFINITY, f64::min)
    );

    // Every gene of the next population comes from the previous one
    ga.reproduction()?;
    ga.mutation();
    for value in ga.population().iter() {
        assert!(initial.iter().any(|v| v == value));
    }
    Ok(())
}

#[test]
fn test_solution_is_best_of_final_population() -> Result<()> {
    let model = Century::new(initial_conditions())?;
    let fitness = Fitness::new(model, training_data());
    let config = GeneticConfig {
        population_size: 10,
        ..Default::default()
    };
    let mut ga = Genetic::new(fitness, config, 99)?;
    ga.fit(3)?;

    let solution = ga.solution()?;
    let best = ga.fitness().evaluate(&solution);
    for row in ga.population().rows() {
        assert!(best <= ga.fitness().evaluate_row(row)?);
    }
    Ok(())
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let settings = small_settings(9, 5);
    assert!(fit_internal(settings, training_data()).is_err());

    let mut settings = small_settings(10, 5);
    settings.initial.necromass = -5.0;
    assert!(fit_internal(settings, training_data()).is_err());
}
