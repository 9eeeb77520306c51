//! Systems module - Hamiltonians for VMC training.

mod harmonic;

pub use harmonic::HarmonicOscillator;
