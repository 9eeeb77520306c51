//! Wavefunction module - trainable ansätze for VMC.

mod traits;
mod rbm;
mod gaussian;

pub use traits::{QuantumState, ConditionalSampling};
pub use rbm::GaussianBinaryRbm;
pub use gaussian::GaussianOrbital;
