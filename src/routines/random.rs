use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of the random draws made by the genetic algorithm
///
/// Every [RngCore] is a source. Tests can supply their own sequence.
pub trait RandomSource {
    /// A uniform draw in `[0, 1)`
    fn uniform(&mut self) -> f64;
    /// A uniform index in `[0, upper)`, `upper` must be positive
    fn index(&mut self, upper: usize) -> usize;
}

impl<R: RngCore> RandomSource for R {
    fn uniform(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn index(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// Reproducible generator for a given seed
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
