use eyre::{bail, Result};
use ndarray::ArrayView1;
use serde_derive::{Deserialize, Serialize};

/// Number of coefficients estimated for the CENTURY model
pub const N_PARAMS: usize = 13;

/// Canonical names of the coefficients, in genome order
pub const PARAMETER_NAMES: [&str; N_PARAMS] = [
    "Kmet", "Kest", "Kminl", "Khumac", "Kminp", "ResEL", "ResEA", "ResMet", "ResLA", "ResPA",
    "PartEst", "PartLen", "PartAct",
];

/// The kinetic and partitioning coefficients of the CENTURY model
///
/// - `k*`: first-order rate constants of the estate, metabolic, slow, active and passive pools
/// - `res_*`: fraction of each flux respired to the atmosphere
/// - `part_*`: fraction of each flux routed to a specific destination pool
///
/// No range is enforced on any coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Parameters {
    pub kmet: f64,
    pub kest: f64,
    pub kminl: f64,
    pub khumac: f64,
    pub kminp: f64,
    pub res_el: f64,
    pub res_ea: f64,
    pub res_met: f64,
    pub res_la: f64,
    pub res_pa: f64,
    pub part_est: f64,
    pub part_len: f64,
    pub part_act: f64,
}

impl Parameters {
    /// Build a parameter vector from its values in genome order
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() != N_PARAMS {
            bail!(
                "Expected {} parameter values, got {}",
                N_PARAMS,
                values.len()
            );
        }
        Ok(Self {
            kmet: values[0],
            kest: values[1],
            kminl: values[2],
            khumac: values[3],
            kminp: values[4],
            res_el: values[5],
            res_ea: values[6],
            res_met: values[7],
            res_la: values[8],
            res_pa: values[9],
            part_est: values[10],
            part_len: values[11],
            part_act: values[12],
        })
    }

    /// Build a parameter vector from one row of a population matrix
    pub fn from_row(row: ArrayView1<f64>) -> Result<Self> {
        Self::from_slice(&row.to_vec())
    }

    /// Values in genome order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.kmet,
            self.kest,
            self.kminl,
            self.khumac,
            self.kminp,
            self.res_el,
            self.res_ea,
            self.res_met,
            self.res_la,
            self.res_pa,
            self.part_est,
            self.part_len,
            self.part_act,
        ]
    }

    /// Pairs of `(name, value)` in genome order
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        PARAMETER_NAMES.iter().copied().zip(self.to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_keeps_order() {
        let values: Vec<f64> = (0..N_PARAMS).map(|i| i as f64 / 10.0).collect();
        let params = Parameters::from_slice(&values).unwrap();
        assert_eq!(params.kmet, 0.0);
        assert_eq!(params.kminp, 0.4);
        assert_eq!(params.part_act, 1.2);
        assert_eq!(params.to_vec(), values);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(Parameters::from_slice(&[0.1; 12]).is_err());
        assert!(Parameters::from_slice(&[0.1; 14]).is_err());
    }

    #[test]
    fn test_named() {
        let params = Parameters {
            khumac: 0.5,
            ..Default::default()
        };
        let named = params.named();
        assert_eq!(named.len(), N_PARAMS);
        assert_eq!(named[3], ("Khumac", 0.5));
        assert_eq!(named[12].0, "PartAct");
    }
}
