use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use eyre::{bail, Result, WrapErr};
use serde_derive::{Deserialize, Serialize};

use crate::algorithms::Status;
use crate::model::parameters::{Parameters, N_PARAMS, PARAMETER_NAMES};
use crate::model::Trajectories;
use crate::routines::datafile::TrainingData;

/// A new best error, found at `generation`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub generation: usize,
    pub error: f64,
}

/// Append-only record of every improvement of the best error
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MilestoneLog {
    milestones: Vec<Milestone>,
}

impl MilestoneLog {
    pub fn new() -> Self {
        Self {
            milestones: Vec::new(),
        }
    }

    pub fn push(&mut self, generation: usize, error: f64) {
        self.milestones.push(Milestone { generation, error });
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn last(&self) -> Option<&Milestone> {
        self.milestones.last()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    pub fn write(&self, folder: &str) -> Result<()> {
        tracing::debug!("Writing milestones...");
        let outputfile = OutputFile::new(folder, "milestones.csv")?;
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_writer(outputfile.file());
        for milestone in &self.milestones {
            writer.serialize(milestone)?;
        }
        writer.flush()?;
        tracing::debug!("Milestones written to {:?}", outputfile.relative_path());
        Ok(())
    }
}

/// Outcome of a calibration run
#[derive(Debug, Clone)]
pub struct FitResult {
    parameters: Parameters,
    error: f64,
    generations: usize,
    status: Status,
    milestones: MilestoneLog,
    data: TrainingData,
    predictions: Option<Trajectories>,
}

impl FitResult {
    pub fn new(
        parameters: Parameters,
        error: f64,
        generations: usize,
        status: Status,
        milestones: MilestoneLog,
        data: TrainingData,
        predictions: Option<Trajectories>,
    ) -> Self {
        Self {
            parameters,
            error,
            generations,
            status,
            milestones,
            data,
            predictions,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Best error seen during the run
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Number of generations completed
    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn milestones(&self) -> &MilestoneLog {
        &self.milestones
    }

    /// Simulated observables of the best parameters at the training times
    pub fn predictions(&self) -> Option<&Trajectories> {
        self.predictions.as_ref()
    }

    pub fn write_outputs(&self, folder: &str) -> Result<()> {
        tracing::debug!("Writing outputs to {}", folder);
        write_parameters(&self.parameters, folder)?;
        self.milestones.write(folder)?;
        self.write_predictions(folder)?;
        Ok(())
    }

    /// Write the observed and simulated trajectories side by side
    pub fn write_predictions(&self, folder: &str) -> Result<()> {
        let predictions = match &self.predictions {
            Some(predictions) => predictions,
            None => {
                tracing::warn!("The best parameters could not be simulated, skipping predictions");
                return Ok(());
            }
        };
        let outputfile = OutputFile::new(folder, "predictions.csv")?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(outputfile.file());
        writer.write_record([
            "time",
            "active_obs",
            "active_pred",
            "respiration_obs",
            "respiration_pred",
        ])?;
        for i in 0..self.data.len() {
            writer.write_record(&[
                self.data.times()[i].to_string(),
                self.data.active()[i].to_string(),
                predictions.active[i].to_string(),
                self.data.respiration()[i].to_string(),
                predictions.respiration[i].to_string(),
            ])?;
        }
        writer.flush()?;
        tracing::debug!("Predictions written to {:?}", outputfile.relative_path());
        Ok(())
    }
}

/// Write `parameters.csv` with one `parameter,value` row per coefficient
pub fn write_parameters(parameters: &Parameters, folder: &str) -> Result<()> {
    let outputfile = OutputFile::new(folder, "parameters.csv")?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(outputfile.file());
    writer.write_record(["parameter", "value"])?;
    for (name, value) in parameters.named() {
        writer.write_record(&[name.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    tracing::debug!("Parameters written to {:?}", outputfile.relative_path());
    Ok(())
}

/// Read parameters written by [write_parameters]
pub fn read_parameters(path: impl AsRef<Path>) -> Result<Parameters> {
    let path = path.as_ref();
    let file =
        File::open(path).wrap_err_with(|| format!("Unable to open the parameter file {:?}", path))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut values = Vec::with_capacity(N_PARAMS);
    for (i, record) in reader.deserialize::<(String, f64)>().enumerate() {
        let (name, value) = record.wrap_err_with(|| format!("Malformed row in {:?}", path))?;
        match PARAMETER_NAMES.get(i) {
            Some(expected) if name.trim() == *expected => values.push(value),
            Some(expected) => bail!(
                "Expected parameter {} at row {}, found {}",
                expected,
                i + 1,
                name
            ),
            None => bail!("Unexpected extra parameter {} in {:?}", name, path),
        }
    }
    Parameters::from_slice(&values)
}

/// A file in the output folder, created along with its parent directories
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    relative_path: PathBuf,
}

impl OutputFile {
    pub fn new(folder: &str, file_name: &str) -> Result<Self> {
        let relative_path = Path::new(&folder).join(file_name);

        if let Some(parent) = relative_path.parent() {
            create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directories for {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&relative_path)
            .wrap_err_with(|| format!("Failed to open file: {:?}", relative_path))?;

        Ok(OutputFile {
            file,
            relative_path,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_owned(self) -> File {
        self.file
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}
