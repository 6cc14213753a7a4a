pub mod parameters;
pub mod pools;

use eyre::{bail, Result};
use ndarray::Array1;
use serde_derive::{Deserialize, Serialize};

use crate::simulator::{integrate, IntegrationError, Solver};
use parameters::Parameters;
use pools::Pools;

/// Initial conditions of a decomposition experiment
///
/// All seven values are required. The Spanish keys (`necromasa`, `leno`,
/// `paso`, `acto`, `respo`) are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Total initial necromass
    #[serde(alias = "necromasa")]
    pub necromass: f64,
    /// Lignin to nitrogen ratio
    pub ln: f64,
    /// Structural fraction ratio, drives the texture factor
    pub frala: f64,
    #[serde(alias = "leno")]
    pub len0: f64,
    #[serde(alias = "paso")]
    pub pas0: f64,
    #[serde(alias = "acto")]
    pub act0: f64,
    #[serde(alias = "respo")]
    pub resp0: f64,
}

impl InitialConditions {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("necromass", self.necromass),
            ("ln", self.ln),
            ("frala", self.frala),
            ("len0", self.len0),
            ("pas0", self.pas0),
            ("act0", self.act0),
            ("resp0", self.resp0),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                bail!("Initial condition '{}' must be finite, got {}", name, value);
            }
        }
        for (name, value) in [
            ("necromass", self.necromass),
            ("len0", self.len0),
            ("pas0", self.pas0),
            ("act0", self.act0),
            ("resp0", self.resp0),
        ] {
            if value < 0.0 {
                bail!("Initial mass '{}' cannot be negative, got {}", name, value);
            }
        }
        Ok(())
    }
}

/// Coefficients derived once from the [InitialConditions]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelConfig {
    fs: f64,
    ftex: f64,
    initial: Pools,
}

impl ModelConfig {
    pub fn new(ic: &InitialConditions) -> Self {
        let fs = 0.85 - 0.018 * ic.ln;
        let ftex = 0.85 - 0.68 * ic.frala;
        Self {
            fs,
            ftex,
            initial: Pools {
                est: ic.necromass * (1.0 - fs),
                met: ic.necromass * fs,
                len: ic.len0,
                act: ic.act0,
                pas: ic.pas0,
                resp: ic.resp0,
            },
        }
    }

    /// Fraction of the necromass partitioned to the metabolic pool
    pub fn fs(&self) -> f64 {
        self.fs
    }

    /// Texture dependent respiration fraction of the active pool
    pub fn ftex(&self) -> f64 {
        self.ftex
    }

    pub fn initial_state(&self) -> &Pools {
        &self.initial
    }
}

/// Simulated observables over a time grid
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectories {
    pub active: Array1<f64>,
    pub respiration: Array1<f64>,
}

impl Trajectories {
    pub fn from_pools(states: &[Pools]) -> Self {
        Self {
            active: states.iter().map(|s| s.act).collect(),
            respiration: states.iter().map(|s| s.resp).collect(),
        }
    }
}

/// Rates of change of the six pools under first-order kinetics
///
/// Mass leaving the system is accounted in `resp`, so the six rates always sum to zero.
pub fn derivative(state: &Pools, ftex: f64, p: &Parameters) -> Pools {
    let est_out = state.est * p.kest;
    let met_out = state.met * p.kmet;
    let len_out = state.len * p.kminl;
    let act_out = state.act * p.khumac;
    let pas_out = state.pas * p.kminp;

    Pools {
        est: -est_out,
        met: -met_out,
        len: (1.0 - p.res_el) * p.part_est * est_out + (1.0 - ftex - p.part_act) * act_out
            - len_out,
        act: (1.0 - p.res_ea) * (1.0 - p.part_est) * est_out
            + (1.0 - p.res_met) * met_out
            + (1.0 - p.res_la - p.part_len) * len_out
            + (1.0 - p.res_pa) * pas_out
            - act_out,
        pas: p.part_act * act_out + p.part_len * len_out - pas_out,
        resp: p.res_el * p.part_est * est_out
            + p.res_ea * (1.0 - p.part_est) * est_out
            + ftex * act_out
            + p.res_met * met_out
            + p.res_la * len_out
            + p.res_pa * pas_out,
    }
}

/// The CENTURY decomposition model for one experiment
#[derive(Debug, Clone)]
pub struct Century {
    config: ModelConfig,
    solver: Solver,
}

impl Century {
    pub fn new(ic: InitialConditions) -> Result<Self> {
        ic.validate()?;
        Ok(Self {
            config: ModelConfig::new(&ic),
            solver: Solver::default(),
        })
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Right-hand side of the ODE system, autonomous in `t`
    pub fn derivative(&self, state: &Pools, _t: f64, params: &Parameters) -> Pools {
        derivative(state, self.config.ftex, params)
    }

    /// State of all six pools at every point of `times`
    pub fn solve(&self, times: &[f64], params: &Parameters) -> Result<Vec<Pools>, IntegrationError> {
        let ftex = self.config.ftex;
        integrate(
            self.config.initial_state(),
            times,
            params,
            |state: &Pools, _t: f64, p: &Parameters| derivative(state, ftex, p),
            &self.solver,
        )
    }

    /// Active pool and respiration trajectories over `times`
    pub fn simulate(
        &self,
        times: &[f64],
        params: &Parameters,
    ) -> Result<Trajectories, IntegrationError> {
        let states = self.solve(times, params)?;
        Ok(Trajectories::from_pools(&states))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ic() -> InitialConditions {
        InitialConditions {
            necromass: 1000.0,
            ln: 10.0,
            frala: 0.5,
            len0: 5.0,
            pas0: 10.0,
            act0: 20.0,
            resp0: 0.0,
        }
    }

    #[test]
    fn test_model_config() {
        let config = ModelConfig::new(&ic());
        assert!((config.fs() - 0.67).abs() < 1e-12);
        assert!((config.ftex() - 0.51).abs() < 1e-12);
        let initial = config.initial_state();
        assert!((initial.est - 330.0).abs() < 1e-9);
        assert!((initial.met - 670.0).abs() < 1e-9);
        assert_eq!(initial.len, 5.0);
        assert_eq!(initial.pas, 10.0);
        assert_eq!(initial.act, 20.0);
        assert_eq!(initial.resp, 0.0);
    }

    #[test]
    fn test_validate_initial_conditions() {
        let mut bad = ic();
        bad.necromass = -1.0;
        assert!(Century::new(bad).is_err());
        let mut bad = ic();
        bad.ln = f64::NAN;
        assert!(Century::new(bad).is_err());
        assert!(Century::new(ic()).is_ok());
    }

    #[test]
    fn test_single_flux() {
        // Only the metabolic pool decays, fully into the active pool
        let state = Pools {
            met: 10.0,
            ..Default::default()
        };
        let params = Parameters {
            kmet: 0.5,
            ..Default::default()
        };
        let rates = derivative(&state, 0.3, &params);
        assert_eq!(rates.met, -5.0);
        assert_eq!(rates.act, 5.0);
        assert_eq!(rates.resp, 0.0);
        assert_eq!(rates.total(), 0.0);
    }

    #[test]
    fn test_simulate_shapes() {
        let model = Century::new(ic()).unwrap();
        let params = Parameters {
            kmet: 0.05,
            kest: 0.01,
            khumac: 0.02,
            res_met: 0.4,
            ..Default::default()
        };
        let trajectories = model.simulate(&[0.0, 1.0, 2.0, 3.0], &params).unwrap();
        assert_eq!(trajectories.active.len(), 4);
        assert_eq!(trajectories.respiration.len(), 4);
        assert_eq!(trajectories.active[0], 20.0);
        assert!(trajectories.respiration[3] > trajectories.respiration[0]);
    }
}
