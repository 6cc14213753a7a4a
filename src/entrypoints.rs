use std::time::Instant;

use eyre::{Result, WrapErr};

use crate::algorithms::genetic::Genetic;
use crate::algorithms::Algorithms;
use crate::logger;
use crate::model::parameters::Parameters;
use crate::model::{Century, Trajectories};
use crate::routines::datafile::{read_training_data, TrainingData};
use crate::routines::fitness::Fitness;
use crate::routines::output::FitResult;
use crate::routines::settings::Settings;

/// Primary entrypoint for centurycore
///
/// Reads the training data named in the settings, calibrates the model with
/// the genetic algorithm and, when `config.output` is set, writes
/// `parameters.csv`, `milestones.csv`, `predictions.csv` and `settings.json`
/// to the output folder.
pub fn fit(settings: Settings) -> Result<FitResult> {
    let now = Instant::now();
    settings.validate()?;
    logger::setup_log(&settings)?;
    tracing::info!("Starting centurycore");

    let data = read_training_data(&settings.paths.data)?;
    tracing::info!(
        "Training data contains {} time points, from t = {} to t = {}",
        data.len(),
        data.times()[0],
        data.times()[data.len() - 1]
    );

    match settings.config.output {
        true => {
            settings.write_settings_to_file()?;
            tracing::info!("Output files will be written to {}", settings.paths.output)
        }
        false => {
            tracing::info!("Output files will not be written - set `output = true` in the configuration file to enable output files")
        }
    }

    let result = match run(&settings, data) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!("An error has occurred during model fitting: {}", err);
            return Err(err);
        }
    };

    for (name, value) in result.parameters().named() {
        tracing::info!("{:>10}: {}", name, value);
    }

    if settings.config.output {
        result.write_outputs(&settings.paths.output)?;
    }

    tracing::info!(
        "Program complete after {:.2?}, {} generations, best error {}",
        now.elapsed(),
        result.generations(),
        result.error()
    );
    Ok(result)
}

/// Alternative entrypoint, primarily meant for third-party libraries or APIs
///
/// Runs the calibration on `data` without setting up logging or writing any files.
pub fn fit_internal(settings: Settings, data: TrainingData) -> Result<FitResult> {
    let now = Instant::now();
    settings.validate()?;
    let result = run(&settings, data)?;
    tracing::info!("Total time: {:.2?}", now.elapsed());
    Ok(result)
}

/// Simulate the observables of fitted `parameters` over an arbitrary time grid
pub fn forecast(settings: &Settings, parameters: &Parameters, times: &[f64]) -> Result<Trajectories> {
    let model = Century::new(settings.initial)?.with_solver(settings.solver);
    model
        .simulate(times, parameters)
        .wrap_err("Unable to simulate the requested time grid")
}

fn run(settings: &Settings, data: TrainingData) -> Result<FitResult> {
    let model = Century::new(settings.initial)?.with_solver(settings.solver);
    let fitness = Fitness::new(model, data).with_config(settings.fitness);
    let mut algorithm = Genetic::new(fitness, settings.genetic, settings.config.seed)?;
    tracing::info!(
        "The genetic algorithm will run for {} generations with {} candidates",
        settings.config.generations,
        settings.genetic.population_size
    );
    algorithm.fit(settings.config.generations)
}
