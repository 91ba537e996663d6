//! In-place weight mutation.

use crate::error::EvoError;
use crate::neural::{InitPolicy, Network};
use rand::Rng;

/// Denominator `L` of the per-weight hit probability `1/L`.
///
/// A live count keeps the expected number of mutations per individual at
/// one regardless of network size; a fixed constant decouples mutation
/// pressure from the shape.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationDenominator {
    /// The network's current `weight_count()`.
    Live,
    /// A fixed constant.
    Fixed(usize),
}

impl Default for MutationDenominator {
    fn default() -> Self {
        Self::Live
    }
}

/// Mutation settings for a run.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MutationConfig {
    /// Whether the generational loop mutates crossover children at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub denominator: MutationDenominator,
    /// Distribution of the mutation factor.
    #[serde(default = "default_draw")]
    pub draw: InitPolicy,
}

fn default_enabled() -> bool {
    true
}

fn default_draw() -> InitPolicy {
    InitPolicy::Uniform { bound: 2.5 }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            denominator: MutationDenominator::default(),
            draw: default_draw(),
        }
    }
}

impl Network {
    /// Mutate weights in place.
    ///
    /// Each weight is hit independently with probability `1/L`. A hit
    /// scales a nonzero weight by a drawn factor and replaces a zero
    /// weight with the factor itself, so a zeroed position can re-enter
    /// the search. Never changes the layer dimensions.
    pub fn mutate<R: Rng>(&mut self, config: &MutationConfig, rng: &mut R) -> Result<(), EvoError> {
        let denominator = match config.denominator {
            MutationDenominator::Live => self.weight_count(),
            MutationDenominator::Fixed(n) => n,
        };
        if denominator == 0 {
            return Err(EvoError::Configuration(
                "mutation denominator must be > 0".to_string(),
            ));
        }
        let rate = 1.0 / denominator as f32;
        let draw = config.draw;

        for layer in &mut self.layers {
            layer.weights.mapv_inplace(|w| mutate_one(w, rate, draw, rng));
            layer.biases.mapv_inplace(|b| mutate_one(b, rate, draw, rng));
        }
        Ok(())
    }
}

fn mutate_one<R: Rng>(weight: f32, rate: f32, draw: InitPolicy, rng: &mut R) -> f32 {
    if rng.gen::<f32>() >= rate {
        return weight;
    }

    let factor = draw.sample(rng);
    if weight != 0.0 {
        weight * factor
    } else {
        factor
    }
}
