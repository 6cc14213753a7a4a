use config::Config as eConfig;
use eyre::{bail, Result, WrapErr};
use serde_derive::{Deserialize, Serialize};

use crate::model::parameters::N_PARAMS;
use crate::model::InitialConditions;
use crate::routines::fitness::FitnessConfig;
use crate::routines::output::OutputFile;
use crate::simulator::Solver;

/// Settings of a calibration run
///
/// Read from a TOML file with [read], or built in code with [Settings::new].
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Settings {
    pub paths: Paths,
    #[serde(default)]
    pub config: Config,
    pub initial: InitialConditions,
    #[serde(default)]
    pub genetic: GeneticConfig,
    #[serde(default)]
    pub solver: Solver,
    #[serde(default)]
    pub fitness: FitnessConfig,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Paths {
    /// Headerless CSV with columns `time, active, respiration`
    pub data: String,
    #[serde(default = "default_output")]
    pub output: String,
    /// Log file name, written inside the output folder
    pub log: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Config {
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub output: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generations: default_generations(),
            seed: default_seed(),
            output: default_true(),
            log_level: default_log_level(),
        }
    }
}

/// Hyperparameters of the genetic algorithm
///
/// - `population_size`: number of candidates, must be even
/// - `selection_rate`: fraction of the population drawn for each parent tournament
/// - `mutation_rate`: probability that an individual is mutated each generation
/// - `gen_len`: number of consecutive coefficients redrawn by a mutation
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq)]
pub struct GeneticConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_selection_rate")]
    pub selection_rate: f64,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_gen_len")]
    pub gen_len: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            selection_rate: default_selection_rate(),
            mutation_rate: default_mutation_rate(),
            gen_len: default_gen_len(),
        }
    }
}

impl GeneticConfig {
    /// Number of candidates drawn for each parent pair
    pub fn tournament_size(&self) -> usize {
        (self.population_size as f64 * self.selection_rate) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 || self.population_size % 2 != 0 {
            bail!(
                "The population size must be an even number of at least 2, got {}",
                self.population_size
            );
        }
        if !(0.0..=1.0).contains(&self.selection_rate) {
            bail!(
                "The selection rate must be within [0, 1], got {}",
                self.selection_rate
            );
        }
        if self.tournament_size() < 2 {
            bail!(
                "A population of {} with selection rate {} draws {} candidates per tournament, at least 2 are needed",
                self.population_size,
                self.selection_rate,
                self.tournament_size()
            );
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            bail!(
                "The mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            );
        }
        if self.gen_len == 0 || self.gen_len > N_PARAMS {
            bail!(
                "The mutation block length must be within [1, {}], got {}",
                N_PARAMS,
                self.gen_len
            );
        }
        Ok(())
    }
}

impl Settings {
    /// Default settings for the given training data file and initial conditions
    pub fn new(data: impl Into<String>, initial: InitialConditions) -> Self {
        Self {
            paths: Paths {
                data: data.into(),
                output: default_output(),
                log: None,
            },
            config: Config::default(),
            initial,
            genetic: GeneticConfig::default(),
            solver: Solver::default(),
            fitness: FitnessConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.initial
            .validate()
            .wrap_err("Invalid initial conditions")?;
        self.genetic
            .validate()
            .wrap_err("Invalid genetic algorithm configuration")?;
        if self.solver.rtol <= 0.0 || self.solver.atol <= 0.0 {
            bail!("Solver tolerances must be positive");
        }
        if !(self.solver.max_span > 0.0) {
            bail!(
                "The solver span must be positive, got {}",
                self.solver.max_span
            );
        }
        Ok(())
    }

    /// Write the settings as JSON to `settings.json` in the output folder
    pub fn write_settings_to_file(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        let outputfile = OutputFile::new(&self.paths.output, "settings.json")?;
        std::io::Write::write_all(&mut outputfile.file(), serialized.as_bytes())?;
        Ok(())
    }
}

/// Read and validate settings from a TOML file
///
/// Values can be overridden with environment variables prefixed by `CENTURY`,
/// using `__` between sections, e.g. `CENTURY__CONFIG__GENERATIONS=100`.
pub fn read(path: impl AsRef<str>) -> Result<Settings> {
    let path = path.as_ref();
    let parsed = eConfig::builder()
        .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
        .add_source(config::Environment::with_prefix("CENTURY").separator("__"))
        .build()
        .wrap_err_with(|| format!("Unable to read the settings file {}", path))?;

    let settings: Settings = parsed
        .try_deserialize()
        .wrap_err_with(|| format!("Unable to parse the settings in {}", path))?;
    settings.validate()?;
    Ok(settings)
}

// *********************************
// Default values for deserializing
// *********************************
fn default_true() -> bool {
    true
}

fn default_output() -> String {
    "outputs/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_generations() -> usize {
    500
}

fn default_seed() -> u64 {
    347
}

fn default_population_size() -> usize {
    200
}

fn default_selection_rate() -> f64 {
    0.3
}

fn default_mutation_rate() -> f64 {
    0.01
}

fn default_gen_len() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_genetic_config() {
        let config = GeneticConfig::default();
        assert_eq!(config.population_size, 200);
        assert_eq!(config.tournament_size(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_genetic_config() {
        let odd = GeneticConfig {
            population_size: 11,
            ..Default::default()
        };
        assert!(odd.validate().is_err());

        let tiny_tournament = GeneticConfig {
            population_size: 4,
            selection_rate: 0.3,
            ..Default::default()
        };
        assert!(tiny_tournament.validate().is_err());

        let long_block = GeneticConfig {
            gen_len: N_PARAMS + 1,
            ..Default::default()
        };
        assert!(long_block.validate().is_err());

        let bad_mutation = GeneticConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(bad_mutation.validate().is_err());
    }

    #[test]
    fn test_solver_span_must_be_positive() {
        let initial = InitialConditions {
            necromass: 10.0,
            ln: 1.0,
            frala: 0.1,
            len0: 0.0,
            pas0: 0.0,
            act0: 1.0,
            resp0: 0.0,
        };
        let mut settings = Settings::new("data.csv", initial);
        assert!(settings.validate().is_ok());
        settings.solver.max_span = 0.0;
        assert!(settings.validate().is_err());
        settings.solver.max_span = f64::NAN;
        assert!(settings.validate().is_err());
    }
}
