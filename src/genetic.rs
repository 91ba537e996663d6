//! Genetic population and the generational loop.
//!
//! One generation is select-then-reproduce: the population is culled to a
//! survivor pool, then refilled by crossover. Fitness is computed the
//! moment a network's weights are finalized, never lazily.

use crate::config::Config;
use crate::error::EvoError;
use crate::fitness::{evaluate_or, FitnessSource};
use crate::neural::Network;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Worst score a genetic organism can hold; also the fallback for an
/// isolated evaluation failure.
const WORST_FITNESS: f32 = 0.0;

/// How survivors are chosen each generation.
///
/// The two policies apply different selection pressure and are not
/// interchangeable mid-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Sample survivors without replacement, weighted by `fitness / sum`.
    #[default]
    Proportionate,
    /// Keep the top `cutoff` by fitness.
    Truncation,
}

/// Which crossover child joins the population.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildPolicy {
    /// The higher-fitness child of the pair.
    #[default]
    Fitter,
    /// Always the first child, ignoring the comparison.
    First,
}

/// One genetic population member.
#[derive(Clone, Debug)]
pub struct Organism {
    pub net: Network,
    /// Generation-scoped unique id, `<generation>-<index>.net`.
    pub name: String,
    pub fitness: f32,
}

/// The genetic trainer: population state plus the generational loop.
pub struct GeneticTrainer {
    pub population: Vec<Organism>,
    pub generation: usize,
    config: Config,
    n_inputs: usize,
    n_outputs: usize,
    fitness: Box<dyn FitnessSource>,
    rng: ChaCha8Rng,
}

impl GeneticTrainer {
    /// Build and evaluate the initial population.
    pub fn new(
        config: Config,
        n_inputs: usize,
        n_outputs: usize,
        fitness: Box<dyn FitnessSource>,
        seed: u64,
    ) -> Result<Self, EvoError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let nets = (0..config.run.population_size)
            .map(|_| {
                Network::random(
                    &config.network.topology,
                    n_inputs,
                    n_outputs,
                    config.network.init,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<Network>, EvoError>>()?;

        let scores: Vec<f32> = nets
            .par_iter()
            .map(|net| evaluate_or(fitness.as_ref(), net, WORST_FITNESS))
            .collect();

        let population = nets
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (net, fitness))| Organism {
                net,
                name: format!("0-{}.net", i),
                fitness,
            })
            .collect();

        Ok(Self {
            population,
            generation: 0,
            config,
            n_inputs,
            n_outputs,
            fitness,
            rng,
        })
    }

    /// Survivor count per generation.
    pub fn cutoff(&self) -> usize {
        (self.config.run.survival_fraction * self.config.run.population_size as f32) as usize
    }

    /// Run one generation: select survivors, refill by crossover.
    pub fn step(&mut self) -> Result<(), EvoError> {
        let survivors = self.select()?;
        self.population = survivors;
        self.reproduce()?;
        self.generation += 1;
        Ok(())
    }

    /// Run `generations` full generations.
    pub fn run(&mut self, generations: usize) -> Result<(), EvoError> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }

    fn select(&mut self) -> Result<Vec<Organism>, EvoError> {
        let cutoff = self.cutoff();
        let mut pool = std::mem::take(&mut self.population);

        match self.config.genetic.selection {
            SelectionPolicy::Truncation => {
                pool.sort_by(|a, b| {
                    b.fitness
                        .partial_cmp(&a.fitness)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                pool.truncate(cutoff);
                Ok(pool)
            }
            SelectionPolicy::Proportionate => {
                let mut survivors = Vec::with_capacity(cutoff);
                for _ in 0..cutoff {
                    let weights: Vec<f32> = pool.iter().map(|o| o.fitness).collect();
                    let dist = WeightedIndex::new(&weights)
                        .map_err(|_| EvoError::DegenerateDistribution)?;
                    let picked = dist.sample(&mut self.rng);
                    survivors.push(pool.swap_remove(picked));
                }
                Ok(survivors)
            }
        }
    }

    /// Refill the population to its configured size.
    ///
    /// Each parent pair contributes exactly one organism: both crossover
    /// children are evaluated and one is kept per the child policy.
    fn reproduce(&mut self) -> Result<(), EvoError> {
        let survivor_count = self.population.len();
        let weights: Vec<f32> = self.population.iter().map(|o| o.fitness).collect();
        let parent_dist =
            WeightedIndex::new(&weights).map_err(|_| EvoError::DegenerateDistribution)?;

        let next_generation = self.generation + 1;
        let mut child_index = 0;

        while self.population.len() < self.config.run.population_size {
            let first = parent_dist.sample(&mut self.rng);
            let second = parent_dist.sample(&mut self.rng);
            debug_assert!(first < survivor_count && second < survivor_count);

            let (mut child1, mut child2) = {
                let parent1 = &self.population[first].net;
                let parent2 = &self.population[second].net;
                parent1.crossover(parent2, self.config.genetic.crossover, &mut self.rng)?
            };

            if self.config.genetic.mutation.enabled {
                child1.mutate(&self.config.genetic.mutation, &mut self.rng)?;
                child2.mutate(&self.config.genetic.mutation, &mut self.rng)?;
            }

            let score1 = evaluate_or(self.fitness.as_ref(), &child1, WORST_FITNESS);
            let score2 = evaluate_or(self.fitness.as_ref(), &child2, WORST_FITNESS);

            let (net, fitness) = match self.config.genetic.child_policy {
                ChildPolicy::Fitter if score2 > score1 => (child2, score2),
                _ => (child1, score1),
            };

            self.population.push(Organism {
                net,
                name: format!("{}-{}.net", next_generation, child_index),
                fitness,
            });
            child_index += 1;
        }

        Ok(())
    }

    /// The current best organism.
    pub fn best(&self) -> &Organism {
        self.population
            .iter()
            .max_by(|a, b| {
                a.fitness
                    .partial_cmp(&b.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("population is never empty")
    }

    /// Mean fitness across the population.
    pub fn mean_fitness(&self) -> f32 {
        let total: f32 = self.population.iter().map(|o| o.fitness).sum();
        total / self.population.len() as f32
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }
}
