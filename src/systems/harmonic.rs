//! Isotropic harmonic oscillator trap, optionally with Coulomb repulsion.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::sampling::Hamiltonian;
use crate::wavefunction::QuantumState;

/// H = Σᵢ (-½∇ᵢ² + ½ω² rᵢ²) + Σ_{p<q} 1/r_pq
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct HarmonicOscillator {
    pub omega: f64,
    /// Include the Coulomb repulsion between particles
    pub interacting: bool,
}

impl HarmonicOscillator {
    pub fn new(omega: f64, interacting: bool) -> Self {
        Self { omega, interacting }
    }

    fn interaction_energy(&self, x: &DVector<f64>, n_dimensions: usize) -> Result<f64> {
        let n_particles = x.len() / n_dimensions;
        let mut energy = 0.0;
        for p in 0..n_particles {
            for q in (p + 1)..n_particles {
                let rp = x.rows(p * n_dimensions, n_dimensions);
                let rq = x.rows(q * n_dimensions, n_dimensions);
                let r = (rp - rq).norm();
                if r < f64::EPSILON {
                    return Err(VmcError::Degenerate(format!(
                        "particles {p} and {q} coincide"
                    )));
                }
                energy += 1.0 / r;
            }
        }
        Ok(energy)
    }
}

impl<S: QuantumState + ?Sized> Hamiltonian<S> for HarmonicOscillator {
    fn local_energy(&self, state: &S, gibbs_factor: f64) -> Result<f64> {
        let x = state.configuration();
        let grad = state.log_gradient(gibbs_factor);
        let lap = state.log_laplacian(gibbs_factor);

        let kinetic = -0.5 * (grad.norm_squared() + lap.sum());
        let potential = 0.5 * self.omega * self.omega * x.norm_squared();
        let mut energy = kinetic + potential;
        if self.interacting {
            energy += self.interaction_energy(x, state.n_dimensions())?;
        }
        Ok(energy)
    }

    fn local_energy_gradient(&self, state: &S, gibbs_factor: f64) -> Result<DVector<f64>> {
        Ok(state.param_log_derivatives(gibbs_factor))
    }
}
