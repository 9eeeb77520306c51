//! Wave function traits for VMC training.
//!
//! `QuantumState` is the trainable ansatz the sampler moves through
//! configuration space. The `factor` argument taken by the derivative
//! methods is the chain variance factor: the model represents Ψ = F^factor,
//! where F is the ansatz written out in its natural form.

use std::io::Write;

use nalgebra::DVector;
use rand::RngCore;

use crate::error::Result;

pub trait QuantumState {
    /// Number of variational parameters.
    fn n_params(&self) -> usize;

    /// Current parameter values as one flat vector.
    fn params(&self) -> DVector<f64>;

    /// Replace all parameters and refresh cached quantities.
    fn set_params(&mut self, params: &DVector<f64>) -> Result<()>;

    /// Current configuration (all particle coordinates, flattened).
    fn configuration(&self) -> &DVector<f64>;

    /// Move to a new configuration and refresh cached quantities.
    fn set_configuration(&mut self, x: DVector<f64>) -> Result<()>;

    /// Number of spatial dimensions per particle.
    fn n_dimensions(&self) -> usize;

    /// Recompute the auxiliary field and the cached amplitude from the
    /// current parameters and configuration.
    fn refresh(&mut self);

    /// Cached ln F at the current configuration.
    fn log_amplitude(&self) -> f64;

    /// ln F at an arbitrary configuration.
    fn log_amplitude_of(&self, x: &DVector<f64>) -> f64;

    /// |Ψ(x) / Ψ(current)|² for the proposal `x`, with Ψ = F.
    fn amplitude_ratio(&self, x: &DVector<f64>) -> f64 {
        (2.0 * (self.log_amplitude_of(x) - self.log_amplitude())).exp()
    }

    /// ∇ₓ ln Ψ at an arbitrary configuration.
    fn log_gradient_at(&self, x: &DVector<f64>, factor: f64) -> DVector<f64>;

    /// ∇ₓ ln Ψ at the current configuration.
    fn log_gradient(&self, factor: f64) -> DVector<f64> {
        self.log_gradient_at(self.configuration(), factor)
    }

    /// ∂² ln Ψ / ∂xᵢ² for every coordinate at the current configuration.
    fn log_laplacian(&self, factor: f64) -> DVector<f64>;

    /// Oᵢ = ∂ ln Ψ / ∂θᵢ at the current configuration.
    fn param_log_derivatives(&self, factor: f64) -> DVector<f64>;

    /// Write the parameters in a human readable layout.
    fn dump_params(&self, out: &mut dyn Write) -> Result<()> {
        let line: Vec<String> = self.params().iter().map(|p| p.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
        Ok(())
    }

    /// Numerical ∇ₓ ln Ψ using central difference.
    fn numerical_log_gradient(&self, factor: f64, h: f64) -> DVector<f64> {
        let x = self.configuration();
        DVector::from_fn(x.len(), |i, _| {
            let mut x_fwd = x.clone();
            let mut x_bwd = x.clone();
            x_fwd[i] += h;
            x_bwd[i] -= h;
            factor * (self.log_amplitude_of(&x_fwd) - self.log_amplitude_of(&x_bwd)) / (2.0 * h)
        })
    }

    /// Numerical ∂² ln Ψ / ∂xᵢ² using central difference.
    fn numerical_log_laplacian(&self, factor: f64, h: f64) -> DVector<f64> {
        let x = self.configuration();
        let center = self.log_amplitude_of(x);
        DVector::from_fn(x.len(), |i, _| {
            let mut x_fwd = x.clone();
            let mut x_bwd = x.clone();
            x_fwd[i] += h;
            x_bwd[i] -= h;
            factor * (self.log_amplitude_of(&x_fwd) - 2.0 * center + self.log_amplitude_of(&x_bwd))
                / (h * h)
        })
    }
}

/// Ansätze whose marginal |Ψ|² = F comes from a joint distribution over
/// visible and hidden units, allowing exact block resampling.
pub trait ConditionalSampling: QuantumState {
    /// Draw the hidden units from p(h | x).
    fn sample_hidden(&mut self, rng: &mut dyn RngCore);

    /// Draw a new configuration from p(x | h) and refresh cached quantities.
    fn sample_visible(&mut self, rng: &mut dyn RngCore) -> Result<()>;
}
