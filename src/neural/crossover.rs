//! Genetic crossover between networks of identical shape.
//!
//! Both operators produce two freshly-allocated, complementary children:
//! every weight position is sourced from exactly one parent, and the
//! second child takes the opposite parent at every position.

use crate::error::EvoError;
use crate::neural::Network;
use rand::Rng;

/// Which crossover operator a run uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverOperator {
    /// One split point over the canonical flat weight order.
    #[default]
    SinglePoint,
    /// A fair coin per weight position.
    Uniform,
}

impl Network {
    /// Cross two parents with the configured operator.
    pub fn crossover<R: Rng>(
        &self,
        other: &Self,
        operator: CrossoverOperator,
        rng: &mut R,
    ) -> Result<(Self, Self), EvoError> {
        match operator {
            CrossoverOperator::SinglePoint => self.crossover_single_point(other, rng),
            CrossoverOperator::Uniform => self.crossover_uniform(other, rng),
        }
    }

    /// Single-point crossover with the split drawn uniformly from
    /// `[1, weight_count() - 1]`.
    pub fn crossover_single_point<R: Rng>(
        &self,
        other: &Self,
        rng: &mut R,
    ) -> Result<(Self, Self), EvoError> {
        self.check_compatible(other)?;
        let split = rng.gen_range(1..self.weight_count());
        self.crossover_single_point_at(other, split)
    }

    /// Single-point crossover at a caller-chosen split index.
    ///
    /// The split is the only randomness in the operator, so injecting it
    /// makes the result fully reproducible.
    pub fn crossover_single_point_at(
        &self,
        other: &Self,
        split: usize,
    ) -> Result<(Self, Self), EvoError> {
        self.check_compatible(other)?;

        let total = self.weight_count();
        if split == 0 || split >= total {
            return Err(EvoError::Configuration(format!(
                "crossover split must be in [1, {}], got {}",
                total - 1,
                split
            )));
        }

        let flat1 = self.to_flat();
        let flat2 = other.to_flat();

        let mut child1 = Vec::with_capacity(total);
        let mut child2 = Vec::with_capacity(total);
        for idx in 0..total {
            if idx < split {
                child1.push(flat1[idx]);
                child2.push(flat2[idx]);
            } else {
                child1.push(flat2[idx]);
                child2.push(flat1[idx]);
            }
        }

        self.children_from_flats(child1, child2)
    }

    /// Uniform crossover: each position independently inherits from a
    /// coin-flipped parent, mirrored across the two children.
    pub fn crossover_uniform<R: Rng>(
        &self,
        other: &Self,
        rng: &mut R,
    ) -> Result<(Self, Self), EvoError> {
        self.check_compatible(other)?;

        let flat1 = self.to_flat();
        let flat2 = other.to_flat();

        let total = self.weight_count();
        let mut child1 = Vec::with_capacity(total);
        let mut child2 = Vec::with_capacity(total);
        for idx in 0..total {
            if rng.gen_bool(0.5) {
                child1.push(flat1[idx]);
                child2.push(flat2[idx]);
            } else {
                child1.push(flat2[idx]);
                child2.push(flat1[idx]);
            }
        }

        self.children_from_flats(child1, child2)
    }

    fn check_compatible(&self, other: &Self) -> Result<(), EvoError> {
        if !self.same_shape(other) {
            return Err(EvoError::TopologyMismatch {
                left: self.shape_signature(),
                right: other.shape_signature(),
            });
        }
        Ok(())
    }

    fn children_from_flats(
        &self,
        flat1: Vec<f32>,
        flat2: Vec<f32>,
    ) -> Result<(Self, Self), EvoError> {
        let child1 = Self::from_flat(&self.topology, self.n_inputs, self.n_outputs, &flat1)?;
        let child2 = Self::from_flat(&self.topology, self.n_inputs, self.n_outputs, &flat2)?;
        Ok((child1, child2))
    }
}
