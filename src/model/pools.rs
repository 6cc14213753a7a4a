use ode_solvers::Vector6;
use serde_derive::{Deserialize, Serialize};

/// State vector handed to the ODE solver
pub type State = Vector6<f64>;

/// Position of the active pool in [State]
pub const ACTIVE_INDEX: usize = 3;
/// Position of the respiration sink in [State]
pub const RESPIRATION_INDEX: usize = 5;

/// Mass held in each of the six compartments
///
/// - `est`: structural material from the estate
/// - `met`: metabolic material from the estate
/// - `len`: slow (leachate) pool
/// - `act`: active pool
/// - `pas`: passive pool
/// - `resp`: cumulative respiration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pools {
    pub est: f64,
    pub met: f64,
    pub len: f64,
    pub act: f64,
    pub pas: f64,
    pub resp: f64,
}

impl Pools {
    pub fn to_state(&self) -> State {
        State::new(self.est, self.met, self.len, self.act, self.pas, self.resp)
    }

    pub fn from_state(state: &State) -> Self {
        Self {
            est: state[0],
            met: state[1],
            len: state[2],
            act: state[ACTIVE_INDEX],
            pas: state[4],
            resp: state[RESPIRATION_INDEX],
        }
    }

    pub fn total(&self) -> f64 {
        self.est + self.met + self.len + self.act + self.pas + self.resp
    }

    /// True when every pool is finite and not below `-tolerance`
    pub fn is_physical(&self, tolerance: f64) -> bool {
        [self.est, self.met, self.len, self.act, self.pas, self.resp]
            .iter()
            .all(|v| v.is_finite() && *v >= -tolerance)
    }
}
