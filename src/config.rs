//! Run configuration.
//!
//! One immutable `Config` is built at startup (YAML file plus CLI
//! overrides), validated, and passed by reference into the trainers and
//! operators. There is no ambient run state.

use crate::dataset::Dataset;
use crate::error::EvoError;
use crate::genetic::{ChildPolicy, SelectionPolicy};
use crate::neural::{CrossoverOperator, InitPolicy, MutationConfig};
use crate::swarm::SwarmParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub run: RunConfig,
    pub genetic: GeneticConfig,
    pub swarm: SwarmParams,
    pub fitness: FitnessConfig,
}

/// Network shape and initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Hidden-layer widths. Required and non-empty for a run.
    pub topology: Vec<usize>,
    /// Input count; may be inferred from a dataset's feature columns.
    pub n_inputs: Option<usize>,
    /// Output count; may be inferred from a dataset's label set.
    pub n_outputs: Option<usize>,
    pub init: InitPolicy,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            topology: vec![8],
            n_inputs: None,
            n_outputs: None,
            init: InitPolicy::default(),
        }
    }
}

/// Population and loop bounds, shared by both trainers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Fraction of the population surviving selection, in (0, 1).
    pub survival_fraction: f32,
    /// Fraction of a dataset used for training, in (0, 1).
    pub train_fraction: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 100,
            survival_fraction: 0.3,
            train_fraction: 0.7,
        }
    }
}

/// Genetic operator policies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub selection: SelectionPolicy,
    pub crossover: CrossoverOperator,
    pub child_policy: ChildPolicy,
    pub mutation: MutationConfig,
}

/// Where fitness comes from. The two sources are mutually exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessConfig {
    /// Classification accuracy against a labeled dataset file.
    Dataset {
        path: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    /// An external scoring command, averaged over repeated runs.
    External {
        command: String,
        #[serde(default = "default_samples")]
        samples: usize,
    },
}

fn validate_draw(what: &str, policy: InitPolicy) -> Result<(), EvoError> {
    let bound = match policy {
        InitPolicy::Uniform { bound } => bound,
        InitPolicy::SignedExponential { scale } => scale,
    };
    if bound <= 0.0 {
        return Err(EvoError::Configuration(format!(
            "{} bound must be > 0, got {}",
            what, bound
        )));
    }
    Ok(())
}

fn default_delimiter() -> char {
    ','
}

fn default_samples() -> usize {
    3
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self::Dataset {
            path: PathBuf::from("dataset.csv"),
            delimiter: default_delimiter(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EvoError> {
        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            EvoError::Configuration(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EvoError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| EvoError::Configuration(e.to_string()))?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), EvoError> {
        let fail = |msg: String| Err(EvoError::Configuration(msg));

        if self.run.population_size == 0 {
            return fail("population_size must be > 0".to_string());
        }
        if self.run.generations == 0 {
            return fail("generations must be > 0".to_string());
        }
        if !(0.0 < self.run.survival_fraction && self.run.survival_fraction < 1.0) {
            return fail(format!(
                "survival_fraction must be in (0, 1), got {}",
                self.run.survival_fraction
            ));
        }
        if (self.run.survival_fraction * self.run.population_size as f32) as usize == 0 {
            return fail(format!(
                "survival_fraction {} of population {} leaves no survivors",
                self.run.survival_fraction, self.run.population_size
            ));
        }
        if !(0.0 < self.run.train_fraction && self.run.train_fraction < 1.0) {
            return fail(format!(
                "train_fraction must be in (0, 1), got {}",
                self.run.train_fraction
            ));
        }

        if self.network.topology.is_empty() {
            return fail("topology must be specified".to_string());
        }
        if self.network.topology.contains(&0) {
            return fail("topology entries must be > 0".to_string());
        }
        if self.network.n_inputs == Some(0) {
            return fail("n_inputs must be > 0".to_string());
        }
        if self.network.n_outputs == Some(0) {
            return fail("n_outputs must be > 0".to_string());
        }
        validate_draw("init", self.network.init)?;
        validate_draw("mutation draw", self.genetic.mutation.draw)?;

        match &self.fitness {
            FitnessConfig::Dataset { path, .. } => {
                if path.as_os_str().is_empty() {
                    return fail("dataset path must be specified".to_string());
                }
            }
            FitnessConfig::External { command, samples } => {
                if command.is_empty() {
                    return fail("external command must be specified".to_string());
                }
                if *samples == 0 {
                    return fail("samples must be > 0".to_string());
                }
                if self.network.n_inputs.is_none() || self.network.n_outputs.is_none() {
                    return fail(
                        "n_inputs and n_outputs are required with an external scorer".to_string(),
                    );
                }
            }
        }

        if self.swarm.inertia <= 0.0 {
            return fail(format!("inertia must be > 0, got {}", self.swarm.inertia));
        }
        if !(0.0 < self.swarm.damping && self.swarm.damping <= 1.0) {
            return fail(format!(
                "damping must be in (0, 1], got {}",
                self.swarm.damping
            ));
        }
        if self.swarm.cognitive < 0.0 || self.swarm.social < 0.0 {
            return fail("acceleration coefficients must be >= 0".to_string());
        }

        Ok(())
    }

    /// Input/output counts, from the config or inferred from a dataset.
    pub fn resolve_dimensions(
        &self,
        dataset: Option<&Dataset>,
    ) -> Result<(usize, usize), EvoError> {
        let n_inputs = match (self.network.n_inputs, dataset) {
            (Some(n), _) => n,
            (None, Some(ds)) => ds.n_features(),
            (None, None) => {
                return Err(EvoError::Configuration(
                    "n_inputs must be specified".to_string(),
                ))
            }
        };
        let n_outputs = match (self.network.n_outputs, dataset) {
            (Some(n), _) => n,
            (None, Some(ds)) => ds.labels().len(),
            (None, None) => {
                return Err(EvoError::Configuration(
                    "n_outputs must be specified".to_string(),
                ))
            }
        };
        Ok((n_inputs, n_outputs))
    }
}
