use std::fmt;

use ode_solvers::dop_shared::IntegrationError as StepperError;
use ode_solvers::Dopri5;
use serde_derive::{Deserialize, Serialize};

use crate::model::parameters::Parameters;
use crate::model::pools::{Pools, State};

const RTOL: f64 = 1e-6;
const ATOL: f64 = 1e-8;
const MAX_SPAN: f64 = 100.0;
/// Times a stiff stretch may be halved before giving up
const MAX_SPLITS: u32 = 16;

type Time = f64;

/// Settings of the adaptive Dormand-Prince stepper
///
/// Grid intervals longer than `max_span` are integrated in equal pieces no
/// longer than `max_span`. A piece on which the stepper reports stiffness is
/// halved and integrated again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solver {
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    #[serde(default = "default_max_span")]
    pub max_span: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            rtol: RTOL,
            atol: ATOL,
            max_span: MAX_SPAN,
        }
    }
}

fn default_max_span() -> f64 {
    MAX_SPAN
}

fn default_rtol() -> f64 {
    RTOL
}

fn default_atol() -> f64 {
    ATOL
}

/// Reasons an integration over a time grid can fail
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationError {
    /// The time grid holds no points
    EmptyGrid,
    /// `times[index]` is not strictly greater than `times[index - 1]`
    UnorderedGrid { index: usize },
    /// `times[index]` is infinite or NaN
    NonFiniteTime { index: usize },
    /// The stepper gave up (stiffness, step size underflow or step budget)
    Solver { time: f64, reason: String },
    /// The stepper finished without an output at the requested time
    MissingOutput { time: f64 },
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationError::EmptyGrid => write!(f, "the time grid is empty"),
            IntegrationError::UnorderedGrid { index } => {
                write!(f, "the time grid is not strictly increasing at index {}", index)
            }
            IntegrationError::NonFiniteTime { index } => {
                write!(f, "the time grid holds a non-finite value at index {}", index)
            }
            IntegrationError::Solver { time, reason } => {
                write!(f, "the solver failed before t = {}: {}", time, reason)
            }
            IntegrationError::MissingOutput { time } => {
                write!(f, "the solver produced no output at t = {}", time)
            }
        }
    }
}

impl std::error::Error for IntegrationError {}

// Each piece is integrated on a local axis starting at zero, `offset` maps
// it back to the grid time.
struct Model<'a, F> {
    derivative: &'a F,
    params: &'a Parameters,
    offset: Time,
}

impl<F> ode_solvers::System<Time, State> for Model<'_, F>
where
    F: Fn(&Pools, Time, &Parameters) -> Pools,
{
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        let rates = (self.derivative)(&Pools::from_state(y), self.offset + t, self.params);
        *dy = rates.to_state();
    }
}

/// Integrate `derivative` from `initial` and report the state at every point of `times`
///
/// The first entry is `initial` itself, taken to hold at `times[0]`.
/// Each interval between consecutive grid points is solved with an adaptive
/// Dormand-Prince 5(4) stepper. Stretches where the stepper detects stiffness
/// are bisected until it gets through them.
pub fn integrate<F>(
    initial: &Pools,
    times: &[f64],
    params: &Parameters,
    derivative: F,
    solver: &Solver,
) -> Result<Vec<Pools>, IntegrationError>
where
    F: Fn(&Pools, Time, &Parameters) -> Pools,
{
    validate_grid(times)?;

    let mut states = Vec::with_capacity(times.len());
    states.push(*initial);
    let mut x = initial.to_state();

    for window in times.windows(2) {
        let (ti, tf) = (window[0], window[1]);
        let pieces = ((tf - ti) / solver.max_span).ceil().max(1.0) as usize;
        let width = (tf - ti) / pieces as f64;
        for piece in 0..pieces {
            let start = ti + piece as f64 * width;
            let span = if piece + 1 == pieces { tf - start } else { width };
            x = advance(&derivative, params, x, start, span, solver, 0)?;
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(IntegrationError::Solver {
                time: tf,
                reason: "non-finite state".to_string(),
            });
        }
        states.push(Pools::from_state(&x));
    }
    Ok(states)
}

/// State after integrating `span` time units from `x`, held at time `start`
fn advance<F>(
    derivative: &F,
    params: &Parameters,
    x: State,
    start: Time,
    span: Time,
    solver: &Solver,
    splits: u32,
) -> Result<State, IntegrationError>
where
    F: Fn(&Pools, Time, &Parameters) -> Pools,
{
    let model = Model {
        derivative,
        params,
        offset: start,
    };
    let mut stepper = Dopri5::new(model, 0.0, span, span, x, solver.rtol, solver.atol);
    match stepper.integrate() {
        Ok(_) => state_at(stepper.x_out(), stepper.y_out(), span, start + span),
        Err(StepperError::StiffnessDetected { .. }) if splits < MAX_SPLITS => {
            tracing::trace!(
                "Stiffness detected between t = {} and t = {}, splitting",
                start,
                start + span
            );
            let half = span / 2.0;
            let middle = advance(derivative, params, x, start, half, solver, splits + 1)?;
            advance(
                derivative,
                params,
                middle,
                start + half,
                span - half,
                solver,
                splits + 1,
            )
        }
        Err(err) => Err(IntegrationError::Solver {
            time: start + span,
            reason: format!("{:?}", err),
        }),
    }
}

fn validate_grid(times: &[f64]) -> Result<(), IntegrationError> {
    if times.is_empty() {
        return Err(IntegrationError::EmptyGrid);
    }
    if let Some(index) = times.iter().position(|t| !t.is_finite()) {
        return Err(IntegrationError::NonFiniteTime { index });
    }
    for (index, window) in times.windows(2).enumerate() {
        if window[1] <= window[0] {
            return Err(IntegrationError::UnorderedGrid { index: index + 1 });
        }
    }
    Ok(())
}

// Dense output is requested every `span`, so the stepper reports the local
// start and end. Pick the output closest to `span`.
fn state_at(xs: &[Time], ys: &[State], span: Time, time: Time) -> Result<State, IntegrationError> {
    let tolerance = 1e-9 * span.abs().max(1.0);
    xs.iter()
        .zip(ys)
        .filter(|(x, _)| (*x - span).abs() <= tolerance)
        .last()
        .map(|(_, y)| *y)
        .ok_or(IntegrationError::MissingOutput { time })
}
