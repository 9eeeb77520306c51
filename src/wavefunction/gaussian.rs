//! Single-parameter Gaussian trial function F(x) = exp(-α Σᵢ xᵢ²).
//!
//! For the harmonic oscillator with frequency ω the exact ground state is
//! α = ω/2, which makes this a reference model for checking the sampler.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::traits::QuantumState;
use crate::error::{Result, VmcError};

#[derive(Clone, Debug)]
pub struct GaussianOrbital {
    alpha: f64,
    n_dimensions: usize,
    x: DVector<f64>,
    log_psi: f64,
}

impl GaussianOrbital {
    pub fn new(alpha: f64, n_particles: usize, n_dimensions: usize, seed: u64) -> Result<Self> {
        if n_particles == 0 || n_dimensions == 0 {
            return Err(VmcError::InvalidParameter(
                "particles and dimensions must be positive".into(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let x = DVector::from_fn(n_particles * n_dimensions, |_, _| rng.gen_range(-0.5..0.5));
        let mut orbital = Self { alpha, n_dimensions, x, log_psi: 0.0 };
        orbital.refresh();
        Ok(orbital)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// ⟨E⟩ for the harmonic oscillator at this α, sampled from |F|².
    pub fn exact_energy(&self, omega: f64) -> f64 {
        let m = self.x.len() as f64;
        m * (self.alpha / 2.0 + omega * omega / (8.0 * self.alpha))
    }
}

impl QuantumState for GaussianOrbital {
    fn n_params(&self) -> usize {
        1
    }

    fn params(&self) -> DVector<f64> {
        DVector::from_element(1, self.alpha)
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != 1 {
            return Err(VmcError::DimensionMismatch { expected: 1, found: params.len() });
        }
        self.alpha = params[0];
        self.refresh();
        Ok(())
    }

    fn configuration(&self) -> &DVector<f64> {
        &self.x
    }

    fn set_configuration(&mut self, x: DVector<f64>) -> Result<()> {
        if x.len() != self.x.len() {
            return Err(VmcError::DimensionMismatch { expected: self.x.len(), found: x.len() });
        }
        self.x = x;
        self.refresh();
        Ok(())
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn refresh(&mut self) {
        self.log_psi = self.log_amplitude_of(&self.x);
    }

    fn log_amplitude(&self) -> f64 {
        self.log_psi
    }

    fn log_amplitude_of(&self, x: &DVector<f64>) -> f64 {
        -self.alpha * x.norm_squared()
    }

    fn log_gradient_at(&self, x: &DVector<f64>, factor: f64) -> DVector<f64> {
        x * (-2.0 * self.alpha * factor)
    }

    fn log_laplacian(&self, factor: f64) -> DVector<f64> {
        DVector::from_element(self.x.len(), -2.0 * self.alpha * factor)
    }

    fn param_log_derivatives(&self, factor: f64) -> DVector<f64> {
        DVector::from_element(1, -factor * self.x.norm_squared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_numerical_derivatives() {
        let orbital = GaussianOrbital::new(0.7, 2, 3, 11).unwrap();
        let grad = orbital.log_gradient(1.0);
        let num_grad = orbital.numerical_log_gradient(1.0, 1e-5);
        assert_relative_eq!(grad, num_grad, epsilon = 1e-6);

        let lap = orbital.log_laplacian(1.0);
        let num_lap = orbital.numerical_log_laplacian(1.0, 1e-4);
        assert_relative_eq!(lap, num_lap, epsilon = 1e-4);
    }

    #[test]
    fn test_exact_energy_minimum() {
        let orbital = GaussianOrbital::new(0.5, 1, 1, 0).unwrap();
        assert_relative_eq!(orbital.exact_energy(1.0), 0.5);
        let off = GaussianOrbital::new(0.4, 1, 1, 0).unwrap();
        assert!(off.exact_energy(1.0) > 0.5);
    }
}
