//! Calibration of the CENTURY soil organic matter decomposition model.
//!
//! The six-pool model is integrated with an adaptive ODE solver and its
//! thirteen kinetic coefficients are estimated with a genetic algorithm
//! against observed active pool and respiration series.

pub mod algorithms;
pub mod entrypoints;
pub mod logger;
pub mod model;
pub mod routines {
    pub mod datafile;
    pub mod fitness;
    pub mod output;
    pub mod random;
    pub mod settings;
}
pub mod simulator;

pub mod prelude {
    pub use crate::algorithms::genetic::{crossover, Genetic};
    pub use crate::algorithms::{Algorithms, Status};
    pub use crate::entrypoints::{fit, fit_internal, forecast};
    pub use crate::model::parameters::{Parameters, N_PARAMS, PARAMETER_NAMES};
    pub use crate::model::pools::Pools;
    pub use crate::model::{Century, InitialConditions, ModelConfig, Trajectories};
    pub use crate::routines::datafile::{read_training_data, TrainingData};
    pub use crate::routines::fitness::{Fitness, FitnessConfig, FAILED_FITNESS};
    pub use crate::routines::output::{FitResult, Milestone, MilestoneLog};
    pub use crate::routines::random::{seeded, RandomSource};
    pub use crate::routines::settings::{GeneticConfig, Settings};
    pub use crate::routines::*;
    pub use crate::simulator::{IntegrationError, Solver};
}
