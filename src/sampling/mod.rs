//! Sampling module - Markov chains and the VMC training loop.

mod traits;
mod accumulator;
mod metropolis;
mod importance;
mod gibbs;
mod chain;
mod vmc;

pub use traits::{Hamiltonian, ChainStep};
pub use accumulator::{Accumulators, Estimates};
pub use metropolis::Metropolis;
pub use importance::ImportanceSampling;
pub use gibbs::Gibbs;
pub use chain::ChainKind;
pub use vmc::{SamplerParams, CycleStats, TrainingResult, Sampler};
