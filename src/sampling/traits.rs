//! Traits for Monte Carlo sampling.

use nalgebra::DVector;
use rand::RngCore;

use crate::error::Result;

/// Local energy and its parameter-gradient component for a state `S`.
///
/// `gibbs_factor` is the chain variance factor of the sampler driving the
/// chain; it must be forwarded unchanged to the state's derivative methods.
pub trait Hamiltonian<S: ?Sized> {
    /// Local energy E_L at the state's current configuration.
    fn local_energy(&self, state: &S, gibbs_factor: f64) -> Result<f64>;

    /// Oᵢ = ∂ ln Ψ / ∂θᵢ at the state's current configuration.
    fn local_energy_gradient(&self, state: &S, gibbs_factor: f64) -> Result<DVector<f64>>;
}

/// One transition of the Markov chain.
pub trait ChainStep<S: ?Sized> {
    /// Correction factor threaded into every local-energy evaluation.
    fn variance_factor(&self) -> f64;

    /// Propose and resolve one move. Returns whether the configuration
    /// was changed.
    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool>;
}

impl<S: ?Sized, C: ChainStep<S> + ?Sized> ChainStep<S> for Box<C> {
    fn variance_factor(&self) -> f64 {
        (**self).variance_factor()
    }

    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool> {
        (**self).step(state, rng)
    }
}
