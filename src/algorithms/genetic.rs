use eyre::Result;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;

use crate::algorithms::{Algorithms, Status};
use crate::model::parameters::{Parameters, N_PARAMS};
use crate::routines::fitness::{Fitness, FAILED_FITNESS};
use crate::routines::output::{FitResult, MilestoneLog};
use crate::routines::random::{seeded, RandomSource};
use crate::routines::settings::GeneticConfig;

/// Genetic algorithm searching the CENTURY parameter space
///
/// Each generation the population is scored, the best error is tracked,
/// parent pairs are picked by tournament, recombined with one-point
/// crossover and finally mutated in blocks of `gen_len` coefficients.
pub struct Genetic<R: RandomSource = StdRng> {
    fitness: Fitness,
    config: GeneticConfig,
    rng: R,
    generation: usize,
    error: f64,
    population: Array2<f64>,
    scores: Array1<f64>,
    milestones: MilestoneLog,
    status: Status,
}

impl Genetic<StdRng> {
    pub fn new(fitness: Fitness, config: GeneticConfig, seed: u64) -> Result<Self> {
        Self::with_rng(fitness, config, seeded(seed))
    }
}

impl<R: RandomSource> Genetic<R> {
    /// Build the optimizer with a caller supplied source of randomness
    ///
    /// The initial population is drawn here, uniformly in `[0, 1)`.
    pub fn with_rng(fitness: Fitness, config: GeneticConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let population =
            Array2::from_shape_fn((config.population_size, N_PARAMS), |_| rng.uniform());
        Ok(Self {
            fitness,
            config,
            rng,
            generation: 0,
            error: f64::INFINITY,
            population,
            scores: Array1::from_elem(config.population_size, FAILED_FITNESS),
            milestones: MilestoneLog::new(),
            status: Status::Starting,
        })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    /// Best error found so far, infinite before the first evaluation
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn population(&self) -> &Array2<f64> {
        &self.population
    }

    /// Scores of the population as evaluated at the start of the last generation
    pub fn scores(&self) -> &Array1<f64> {
        &self.scores
    }

    pub fn milestones(&self) -> &MilestoneLog {
        &self.milestones
    }

    /// Pick a parent pair by tournament
    ///
    /// `tournament_size` candidates are drawn uniformly with replacement and
    /// the two with the lowest score are returned, as row indices.
    pub fn choose_parents(&mut self) -> (usize, usize) {
        let n = self.population.nrows();
        let mut pool: Vec<usize> = (0..self.config.tournament_size())
            .map(|_| self.rng.index(n))
            .collect();
        pool.sort_by(|a, b| self.scores[*a].total_cmp(&self.scores[*b]));
        (pool[0], pool[1])
    }

    /// The next population, built from `population_size / 2` parent pairs
    pub fn select_offspring(&mut self) -> Array2<f64> {
        let mut offspring = Array2::zeros(self.population.raw_dim());
        for pair in 0..self.config.population_size / 2 {
            let (first, second) = self.choose_parents();
            let point = self.rng.index(N_PARAMS);
            let (a, b) = crossover(
                self.population.row(first),
                self.population.row(second),
                point,
            );
            offspring.row_mut(2 * pair).assign(&a);
            offspring.row_mut(2 * pair + 1).assign(&b);
        }
        offspring
    }

    /// The best individual of the current population
    ///
    /// Every individual is scored again rather than reusing the stored scores.
    pub fn solution(&self) -> Result<Parameters> {
        let mut best = 0;
        let mut min_value = f64::INFINITY;
        for (i, row) in self.population.rows().into_iter().enumerate() {
            let value = self.fitness.evaluate_row(row)?;
            if value < min_value {
                min_value = value;
                best = i;
            }
        }
        Parameters::from_row(self.population.row(best))
    }
}

/// One-point crossover
///
/// The first child takes `parent1[..point]` followed by `parent2[point..]`,
/// the second child the mirror image.
pub fn crossover(
    parent1: ArrayView1<f64>,
    parent2: ArrayView1<f64>,
    point: usize,
) -> (Array1<f64>, Array1<f64>) {
    let first = parent1
        .iter()
        .take(point)
        .chain(parent2.iter().skip(point))
        .copied()
        .collect();
    let second = parent2
        .iter()
        .take(point)
        .chain(parent1.iter().skip(point))
        .copied()
        .collect();
    (first, second)
}

impl<R: RandomSource> Algorithms for Genetic<R> {
    fn generation(&self) -> usize {
        self.generation
    }

    fn inc_generation(&mut self) -> usize {
        self.generation += 1;
        self.generation
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn evaluation(&mut self) -> Result<()> {
        let scores = self
            .population
            .rows()
            .into_iter()
            .map(|row| self.fitness.evaluate_row(row))
            .collect::<Result<Vec<f64>>>()?;
        let failed = scores.iter().filter(|s| **s == FAILED_FITNESS).count();
        if failed == scores.len() {
            tracing::warn!("Every candidate of generation {} failed to simulate", self.generation);
        } else if failed > 0 {
            tracing::debug!(
                "{}/{} candidates failed to simulate",
                failed,
                scores.len()
            );
        }
        self.scores = Array1::from(scores);
        Ok(())
    }

    fn track_best(&mut self) {
        let best = self.scores.iter().copied().fold(f64::INFINITY, f64::min);
        if best < self.error && best >= 0.0 {
            self.error = best;
            self.milestones.push(self.generation, best);
            tracing::info!("New best error {} at generation {}", best, self.generation);
        }
    }

    fn reproduction(&mut self) -> Result<()> {
        self.population = self.select_offspring();
        Ok(())
    }

    fn mutation(&mut self) {
        let gen_len = self.config.gen_len;
        for mut row in self.population.rows_mut() {
            if self.rng.uniform() < self.config.mutation_rate {
                let start = self.rng.index(N_PARAMS - gen_len + 1);
                for j in start..start + gen_len {
                    row[j] = self.rng.uniform();
                }
            }
        }
    }

    fn logs(&self) {
        tracing::info!(
            "Generation {} finished, best error: {}",
            self.generation,
            self.error
        );
    }

    fn into_result(&self) -> Result<FitResult> {
        let parameters = self.solution()?;
        let predictions = self.fitness.simulate(&parameters);
        Ok(FitResult::new(
            parameters,
            self.error,
            self.generation,
            self.status.clone(),
            self.milestones.clone(),
            self.fitness.data().clone(),
            predictions,
        ))
    }
}
