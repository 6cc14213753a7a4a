use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use serde_derive::{Deserialize, Serialize};

use crate::routines::output::FitResult;

pub mod genetic;

/// File whose presence requests a stop at the next generation boundary
pub const STOP_FILE: &str = "stop";

/// Generation loop shared by the optimizers
///
/// A generation is only ever observed whole: the loop checks for a stop
/// request between generations, never inside one.
pub trait Algorithms {
    fn generation(&self) -> usize;
    fn inc_generation(&mut self) -> usize;
    fn status(&self) -> &Status;
    fn set_status(&mut self, status: Status);
    fn initialize(&mut self) -> Result<()> {
        // If a stop file exists in the current directory, remove it
        if Path::new(STOP_FILE).exists() {
            tracing::info!("Removing existing stop file prior to run");
            fs::remove_file(STOP_FILE).wrap_err("Unable to remove previous stop file")?;
        }
        self.set_status(Status::InProgress);
        Ok(())
    }
    fn evaluation(&mut self) -> Result<()>;
    fn track_best(&mut self);
    fn reproduction(&mut self) -> Result<()>;
    fn mutation(&mut self);
    fn logs(&self);
    fn next_generation(&mut self) -> Result<()> {
        let span = tracing::info_span!("", "{}", format!("Generation {}", self.generation()));
        let _enter = span.enter();
        self.evaluation()?;
        self.track_best();
        self.reproduction()?;
        self.mutation();
        self.logs();
        self.inc_generation();
        Ok(())
    }
    fn stop_requested(&self) -> bool {
        Path::new(STOP_FILE).exists()
    }
    /// Run `generations` generations, or fewer if a stop is requested
    fn fit(&mut self, generations: usize) -> Result<FitResult> {
        self.initialize()?;
        for _ in 0..generations {
            if self.stop_requested() {
                tracing::warn!("Stop file detected - stopping at generation {}", self.generation());
                self.set_status(Status::ManualStop);
                break;
            }
            self.next_generation()?;
        }
        if *self.status() == Status::InProgress {
            self.set_status(Status::MaxGenerations);
        }
        self.into_result()
    }

    #[allow(clippy::wrong_self_convention)]
    fn into_result(&self) -> Result<FitResult>;
}

/// Represents the status of the algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Algorithm is starting up
    Starting,
    /// Algorithm is currently running
    InProgress,
    /// Algorithm ran the requested number of generations
    MaxGenerations,
    /// Algorithm was manually stopped by user
    ManualStop,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Starting => write!(f, "Starting"),
            Status::InProgress => write!(f, "In progress"),
            Status::MaxGenerations => write!(f, "Maximum generations reached"),
            Status::ManualStop => write!(f, "Manual stop requested"),
        }
    }
}
