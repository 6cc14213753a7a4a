use eyre::Result;
use ndarray::{Array1, ArrayView1};
use serde_derive::{Deserialize, Serialize};

use crate::model::parameters::Parameters;
use crate::model::{Century, Trajectories};
use crate::routines::datafile::TrainingData;

/// Error assigned to candidates whose simulation fails or degenerates
///
/// It is finite, so it sorts below nothing and above every real score.
pub const FAILED_FITNESS: f64 = f64::MAX;

const NEGATIVE_TOLERANCE: f64 = 1e-6;

/// Options of the fitness evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Pools below `-negative_tolerance` mark a simulation as degenerate
    #[serde(default = "default_negative_tolerance")]
    pub negative_tolerance: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            negative_tolerance: NEGATIVE_TOLERANCE,
        }
    }
}

fn default_negative_tolerance() -> f64 {
    NEGATIVE_TOLERANCE
}

/// Scores candidate [Parameters] against the [TrainingData]
///
/// The score is the largest of the two channel mean squared errors, rounded
/// to the nearest integer. Lower is better and `0` is a perfect fit.
#[derive(Debug, Clone)]
pub struct Fitness {
    model: Century,
    data: TrainingData,
    config: FitnessConfig,
}

impl Fitness {
    pub fn new(model: Century, data: TrainingData) -> Self {
        Self {
            model,
            data,
            config: FitnessConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FitnessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &Century {
        &self.model
    }

    pub fn data(&self) -> &TrainingData {
        &self.data
    }

    /// Simulated observables at the training times
    pub fn simulate(&self, params: &Parameters) -> Option<Trajectories> {
        let times = self.data.times().to_vec();
        let states = match self.model.solve(&times, params) {
            Ok(states) => states,
            Err(err) => {
                tracing::trace!("Simulation failed for {:?}: {}", params, err);
                return None;
            }
        };
        if states
            .iter()
            .any(|s| !s.is_physical(self.config.negative_tolerance))
        {
            tracing::trace!("Degenerate pools for {:?}", params);
            return None;
        }
        Some(Trajectories::from_pools(&states))
    }

    pub fn evaluate(&self, params: &Parameters) -> f64 {
        let trajectories = match self.simulate(params) {
            Some(trajectories) => trajectories,
            None => return FAILED_FITNESS,
        };
        let worst = mse(trajectories.active.view(), self.data.active().view()).max(mse(
            trajectories.respiration.view(),
            self.data.respiration().view(),
        ));
        if worst.is_finite() {
            worst.round_ties_even()
        } else {
            FAILED_FITNESS
        }
    }

    /// Evaluate one row of a population matrix
    pub fn evaluate_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        let params = Parameters::from_row(row)?;
        Ok(self.evaluate(&params))
    }
}

/// Mean squared error between two series of equal length
pub fn mse(simulated: ArrayView1<f64>, observed: ArrayView1<f64>) -> f64 {
    let diff: Array1<f64> = &simulated - &observed;
    diff.mapv(|d| d * d).sum() / diff.len() as f64
}
