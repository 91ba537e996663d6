//! Network representation and the operators that evolve it.
//!
//! - Dense layer storage with a deterministic forward pass
//! - Single-point and uniform crossover
//! - In-place weight mutation
//! - Flat text persistence

mod network;
mod crossover;
mod mutation;
pub mod encoding;

pub use crossover::CrossoverOperator;
pub use mutation::{MutationConfig, MutationDenominator};
pub use network::{InitPolicy, Layer, Network};
