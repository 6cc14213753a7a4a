use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use eyre::{bail, Result, WrapErr};
use ndarray::{Array1, Array2, Axis};
use ndarray_csv::Array2Reader;

/// Observed time series used to calibrate the model
///
/// Holds a strictly increasing time grid and the active pool and respiration
/// measurements taken at each time point.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    times: Array1<f64>,
    active: Array1<f64>,
    respiration: Array1<f64>,
}

impl TrainingData {
    pub fn new(times: Array1<f64>, active: Array1<f64>, respiration: Array1<f64>) -> Result<Self> {
        if times.is_empty() {
            bail!("Training data must contain at least one time point");
        }
        if active.len() != times.len() || respiration.len() != times.len() {
            bail!(
                "Training data length mismatch: {} times, {} active values, {} respiration values",
                times.len(),
                active.len(),
                respiration.len()
            );
        }
        if let Some(bad) = times
            .iter()
            .chain(active.iter())
            .chain(respiration.iter())
            .find(|v| !v.is_finite())
        {
            bail!("Training data contains a non-finite value: {}", bad);
        }
        for (i, window) in times.windows(2).into_iter().enumerate() {
            if window[1] <= window[0] {
                bail!(
                    "Training times must be strictly increasing, found {} after {} at row {}",
                    window[1],
                    window[0],
                    i + 1
                );
            }
        }
        Ok(Self {
            times,
            active,
            respiration,
        })
    }

    /// Build the training data from a matrix with columns `time, active, respiration`
    pub fn from_matrix(matrix: &Array2<f64>) -> Result<Self> {
        if matrix.ncols() != 3 {
            bail!(
                "Training data requires 3 columns (time, active, respiration), found {}",
                matrix.ncols()
            );
        }
        Self::new(
            matrix.column(0).to_owned(),
            matrix.column(1).to_owned(),
            matrix.column(2).to_owned(),
        )
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn active(&self) -> &Array1<f64> {
        &self.active
    }

    pub fn respiration(&self) -> &Array1<f64> {
        &self.respiration
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn to_matrix(&self) -> Array2<f64> {
        ndarray::stack(
            Axis(1),
            &[self.times.view(), self.active.view(), self.respiration.view()],
        )
        .unwrap_or_else(|_| Array2::zeros((0, 3)))
    }
}

/// Read training data from a headerless CSV file with columns `time, active, respiration`
pub fn read_training_data(path: impl AsRef<Path>) -> Result<TrainingData> {
    let path = path.as_ref();
    let file = File::open(path)
        .wrap_err_with(|| format!("Unable to open the training data file {:?}", path))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);
    let matrix: Array2<f64> = reader
        .deserialize_array2_dynamic()
        .wrap_err_with(|| format!("Malformed training data in {:?}", path))?;
    TrainingData::from_matrix(&matrix).wrap_err_with(|| format!("Invalid training data in {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_valid_data() {
        let data = TrainingData::new(
            array![0.0, 1.0, 2.0],
            array![1.0, 2.0, 3.0],
            array![0.0, 0.5, 1.0],
        )
        .unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.to_matrix().row(1).to_vec(), vec![1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let result = TrainingData::new(array![0.0, 1.0], array![1.0], array![0.0, 0.5]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unordered_times() {
        let result = TrainingData::new(
            array![0.0, 2.0, 1.0],
            array![1.0, 2.0, 3.0],
            array![0.0, 0.5, 1.0],
        );
        assert!(result.is_err());
        let result = TrainingData::new(array![0.0, 0.0], array![1.0, 2.0], array![0.0, 0.5]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty() {
        let result = TrainingData::new(array![], array![], array![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_matrix_requires_three_columns() {
        let matrix = array![[0.0, 1.0], [1.0, 2.0]];
        assert!(TrainingData::from_matrix(&matrix).is_err());
    }
}
