//! Particle swarm optimization over network weights or plain vectors.
//!
//! The swarm is fixed-size and velocity-driven; there is no selection or
//! death. Each generation runs three phases: move every particle against
//! the frozen global best, evaluate all fitness in parallel, then apply
//! personal/global best updates in one sequential pass.

use crate::error::EvoError;
use crate::neural::Network;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Which way fitness improves. Fixed per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    /// Strict improvement check.
    #[inline]
    pub fn improves(self, new: f32, old: f32) -> bool {
        match self {
            Self::Maximize => new > old,
            Self::Minimize => new < old,
        }
    }

    /// The score every candidate beats.
    pub fn worst(self) -> f32 {
        match self {
            Self::Maximize => f32::NEG_INFINITY,
            Self::Minimize => f32::INFINITY,
        }
    }
}

/// Granularity of the r1/r2 draws in the velocity rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomDraw {
    /// One r1/r2 pair per particle per update.
    PerParticle,
    /// Fresh r1/r2 per weight component; more exploratory.
    #[default]
    PerWeight,
}

/// PSO coefficients for a run.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwarmParams {
    /// Inertia weight `w`.
    #[serde(default = "default_inertia")]
    pub inertia: f32,
    /// Geometric inertia decay per generation, `w <- w * damping`.
    #[serde(default = "default_damping")]
    pub damping: f32,
    /// Attraction to the personal best, `c1`.
    #[serde(default = "default_accel")]
    pub cognitive: f32,
    /// Attraction to the global best, `c2`.
    #[serde(default = "default_accel")]
    pub social: f32,
    #[serde(default)]
    pub draw: RandomDraw,
    #[serde(default)]
    pub direction: Direction,
}

fn default_inertia() -> f32 {
    0.7968
}

fn default_damping() -> f32 {
    1.0
}

fn default_accel() -> f32 {
    1.4962
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            inertia: default_inertia(),
            damping: default_damping(),
            cognitive: default_accel(),
            social: default_accel(),
            draw: RandomDraw::default(),
            direction: Direction::default(),
        }
    }
}

/// Anything a particle can occupy: a network's weight tensor or a plain
/// real vector. Position, velocity, and both best-trackers always share
/// one shape, and the flat view keeps every update index-aligned.
pub trait SwarmPosition: Clone + Send + Sync {
    fn to_flat(&self) -> Vec<f32>;
    fn assign_flat(&mut self, flat: &[f32]) -> Result<(), EvoError>;
    fn zeroed_like(&self) -> Self;
}

impl SwarmPosition for Network {
    fn to_flat(&self) -> Vec<f32> {
        Network::to_flat(self)
    }

    fn assign_flat(&mut self, flat: &[f32]) -> Result<(), EvoError> {
        Network::assign_flat(self, flat)
    }

    fn zeroed_like(&self) -> Self {
        Network::zeroed_like(self)
    }
}

impl SwarmPosition for Vec<f32> {
    fn to_flat(&self) -> Vec<f32> {
        self.clone()
    }

    fn assign_flat(&mut self, flat: &[f32]) -> Result<(), EvoError> {
        if flat.len() != self.len() {
            return Err(EvoError::DimensionMismatch {
                expected: self.len(),
                found: flat.len(),
            });
        }
        self.copy_from_slice(flat);
        Ok(())
    }

    fn zeroed_like(&self) -> Self {
        vec![0.0; self.len()]
    }
}

/// One swarm member.
#[derive(Clone, Debug)]
pub struct Particle<P> {
    pub position: P,
    pub velocity: P,
    pub best_position: P,
    pub best_fitness: f32,
    pub fitness: f32,
}

/// Best position any particle has found so far. Monotone in the run's
/// configured direction.
#[derive(Clone, Debug)]
pub struct GlobalBest<P> {
    pub position: P,
    pub fitness: f32,
}

/// The swarm trainer: particle state plus the generational loop.
pub struct SwarmTrainer<P, F>
where
    P: SwarmPosition,
    F: Fn(&P) -> Result<f32, EvoError> + Sync,
{
    pub particles: Vec<Particle<P>>,
    pub global_best: GlobalBest<P>,
    pub generation: usize,
    /// Current inertia, decayed once per generation.
    pub inertia: f32,
    params: SwarmParams,
    objective: F,
    rng: ChaCha8Rng,
}

fn score_or<P, F>(objective: &F, position: &P, worst: f32) -> f32
where
    P: SwarmPosition,
    F: Fn(&P) -> Result<f32, EvoError> + Sync,
{
    match objective(position) {
        Ok(score) => score,
        Err(e) => {
            log::warn!("evaluation failed, scoring {}: {}", worst, e);
            worst
        }
    }
}

impl<P, F> SwarmTrainer<P, F>
where
    P: SwarmPosition,
    F: Fn(&P) -> Result<f32, EvoError> + Sync,
{
    /// Build a swarm from initial positions: zero velocity, personal best
    /// at the start position, global best from the best starter.
    pub fn new(
        positions: Vec<P>,
        params: SwarmParams,
        objective: F,
        seed: u64,
    ) -> Result<Self, EvoError> {
        if positions.is_empty() {
            return Err(EvoError::Configuration(
                "swarm population_size must be > 0".to_string(),
            ));
        }

        let worst = params.direction.worst();
        let scores: Vec<f32> = positions
            .par_iter()
            .map(|p| score_or(&objective, p, worst))
            .collect();

        let particles: Vec<Particle<P>> = positions
            .into_iter()
            .zip(scores)
            .map(|(position, fitness)| Particle {
                velocity: position.zeroed_like(),
                best_position: position.clone(),
                best_fitness: fitness,
                fitness,
                position,
            })
            .collect();

        let mut global_best = GlobalBest {
            position: particles[0].position.clone(),
            fitness: particles[0].fitness,
        };
        for particle in &particles[1..] {
            if params.direction.improves(particle.fitness, global_best.fitness) {
                global_best.position = particle.position.clone();
                global_best.fitness = particle.fitness;
            }
        }

        Ok(Self {
            particles,
            global_best,
            generation: 0,
            inertia: params.inertia,
            params,
            objective,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Run one generation.
    pub fn step(&mut self) -> Result<(), EvoError> {
        let gbest = self.global_best.position.to_flat();

        // phase 1: move every particle against the frozen global best
        for particle in &mut self.particles {
            let mut position = particle.position.to_flat();
            let mut velocity = particle.velocity.to_flat();
            let pbest = particle.best_position.to_flat();

            let (w, c1, c2) = (self.inertia, self.params.cognitive, self.params.social);
            match self.params.draw {
                RandomDraw::PerParticle => {
                    let r1: f32 = self.rng.gen();
                    let r2: f32 = self.rng.gen();
                    for i in 0..velocity.len() {
                        velocity[i] = w * velocity[i]
                            + c1 * r1 * (pbest[i] - position[i])
                            + c2 * r2 * (gbest[i] - position[i]);
                        position[i] += velocity[i];
                    }
                }
                RandomDraw::PerWeight => {
                    for i in 0..velocity.len() {
                        let r1: f32 = self.rng.gen();
                        let r2: f32 = self.rng.gen();
                        velocity[i] = w * velocity[i]
                            + c1 * r1 * (pbest[i] - position[i])
                            + c2 * r2 * (gbest[i] - position[i]);
                        position[i] += velocity[i];
                    }
                }
            }

            particle.velocity.assign_flat(&velocity)?;
            particle.position.assign_flat(&position)?;
        }

        // phase 2: parallel evaluation
        let worst = self.params.direction.worst();
        let objective = &self.objective;
        let scores: Vec<f32> = self
            .particles
            .par_iter()
            .map(|p| score_or(objective, &p.position, worst))
            .collect();

        // phase 3: sequential single-writer best updates
        let direction = self.params.direction;
        for (particle, score) in self.particles.iter_mut().zip(scores) {
            particle.fitness = score;
            if direction.improves(score, particle.best_fitness) {
                particle.best_position = particle.position.clone();
                particle.best_fitness = score;

                if direction.improves(score, self.global_best.fitness) {
                    self.global_best.position = particle.position.clone();
                    self.global_best.fitness = score;
                }
            }
        }

        self.inertia *= self.params.damping;
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
}
