//! Cycle-scoped Monte Carlo accumulators and the estimators derived from
//! them.

use nalgebra::DVector;

/// Running sums over the post-burn-in samples of one optimization cycle.
#[derive(Clone, Debug)]
pub struct Accumulators {
    energy: f64,
    energy_squared: f64,
    /// Σ Oᵢ
    grad: DVector<f64>,
    /// Σ E_L·Oᵢ
    energy_grad: DVector<f64>,
    effective_samples: usize,
    accepted_samples: usize,
}

/// Cycle averages.
#[derive(Clone, Debug)]
pub struct Estimates {
    pub energy: f64,
    pub energy_squared: f64,
    pub variance: f64,
    pub accepted_ratio: f64,
    pub mean_grad: DVector<f64>,
    pub mean_energy_grad: DVector<f64>,
    pub effective_samples: usize,
    pub accepted_samples: usize,
}

impl Accumulators {
    pub fn new(n_params: usize) -> Self {
        Self {
            energy: 0.0,
            energy_squared: 0.0,
            grad: DVector::zeros(n_params),
            energy_grad: DVector::zeros(n_params),
            effective_samples: 0,
            accepted_samples: 0,
        }
    }

    pub fn reset(&mut self) {
        self.energy = 0.0;
        self.energy_squared = 0.0;
        self.grad.fill(0.0);
        self.energy_grad.fill(0.0);
        self.effective_samples = 0;
        self.accepted_samples = 0;
    }

    pub fn push(&mut self, energy: f64, grad: &DVector<f64>, realized: bool) {
        self.energy += energy;
        self.energy_squared += energy * energy;
        self.grad += grad;
        self.energy_grad.axpy(energy, grad, 1.0);
        self.effective_samples += 1;
        if realized {
            self.accepted_samples += 1;
        }
    }

    pub fn effective_samples(&self) -> usize {
        self.effective_samples
    }

    pub fn accepted_samples(&self) -> usize {
        self.accepted_samples
    }

    /// Averages over the accumulated samples, or `None` if nothing was
    /// accumulated.
    pub fn finalize(&self) -> Option<Estimates> {
        if self.effective_samples == 0 {
            return None;
        }
        let n = self.effective_samples as f64;
        let energy = self.energy / n;
        let energy_squared = self.energy_squared / n;
        Some(Estimates {
            energy,
            energy_squared,
            variance: energy_squared - energy * energy,
            accepted_ratio: self.accepted_samples as f64 / n,
            mean_grad: &self.grad / n,
            mean_energy_grad: &self.energy_grad / n,
            effective_samples: self.effective_samples,
            accepted_samples: self.accepted_samples,
        })
    }
}

impl Estimates {
    /// ∂⟨E⟩/∂θ = 2(⟨E_L O⟩ - ⟨E_L⟩⟨O⟩)
    pub fn gradient(&self) -> DVector<f64> {
        (&self.mean_energy_grad - &self.mean_grad * self.energy) * 2.0
    }
}
