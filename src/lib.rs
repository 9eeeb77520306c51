//! NQS VMC - variational Monte Carlo training of neural-network quantum states.
//!
//! A restricted Boltzmann machine ansatz is optimized towards the ground state
//! of a trapped-particle Hamiltonian by alternating Markov-chain sampling under
//! the current wavefunction with stochastic-gradient parameter updates.

pub mod error;
pub mod wavefunction;
pub mod systems;
pub mod sampling;
pub mod optimizer;
pub mod analysis;
pub mod io;

// Re-export commonly used types at crate root
pub use error::{VmcError, Result};
pub use wavefunction::{QuantumState, ConditionalSampling, GaussianBinaryRbm, GaussianOrbital};
pub use systems::HarmonicOscillator;
pub use sampling::{Hamiltonian, ChainStep, ChainKind, Metropolis, ImportanceSampling, Gibbs, Accumulators, Estimates, Sampler, SamplerParams, CycleStats, TrainingResult};
pub use optimizer::{Optimizer, OptimizerKind, Sgd, Asgd};
pub use analysis::{blocking, read_samples, BlockingResult};
pub use io::RunConfig;
