//! # evonet
//!
//! Population-based neuroevolution for small feed-forward networks.
//!
//! ## Features
//!
//! - **Genetic training**: single-point/uniform crossover, in-place
//!   mutation, proportionate or truncation selection
//! - **Particle swarm training**: inertia-damped velocity updates over
//!   network weights or plain vectors
//! - **Pluggable fitness**: dataset classification accuracy or an
//!   external scoring command
//! - **Reproducible**: seeded random number generation throughout
//! - **Configurable**: YAML configuration files
//!
//! ## Quick Start
//!
//! ```rust
//! use evonet::neural::{InitPolicy, Network};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let net = Network::random(&[5, 5], 4, 3, InitPolicy::default(), &mut rng).unwrap();
//!
//! let outputs = net.forward(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//! assert_eq!(outputs.len(), 3);
//! ```
//!
//! ## Swarm optimization
//!
//! ```rust
//! use evonet::swarm::{Direction, SwarmParams, SwarmTrainer};
//! use rand::{Rng, SeedableRng};
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let positions: Vec<Vec<f32>> = (0..20)
//!     .map(|_| (0..5).map(|_| rng.gen_range(-100.0..100.0)).collect())
//!     .collect();
//!
//! let params = SwarmParams {
//!     direction: Direction::Minimize,
//!     ..SwarmParams::default()
//! };
//! let sphere = |v: &Vec<f32>| -> Result<f32, evonet::EvoError> {
//!     Ok(v.iter().map(|x| x * x).sum())
//! };
//!
//! let mut swarm = SwarmTrainer::new(positions, params, sphere, 7).unwrap();
//! swarm.run(50).unwrap();
//! ```

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fitness;
pub mod genetic;
pub mod neural;
pub mod stats;
pub mod swarm;

// Re-export main types
pub use config::Config;
pub use error::EvoError;
pub use genetic::{GeneticTrainer, Organism};
pub use neural::Network;
pub use swarm::SwarmTrainer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
