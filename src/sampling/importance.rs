//! Importance-sampled Metropolis-Hastings chain step.
//!
//! Proposals follow the Langevin equation with drift F = 2∇ln Ψ:
//!
//!   x'ᵢ = xᵢ + D·Fᵢ(x)·Δt + ξ·√Δt,   ξ ~ N(0, 1),  D = ½
//!
//! and acceptance uses the Fokker-Planck Green's function ratio.

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use serde::{Deserialize, Serialize};

use super::traits::ChainStep;
use crate::error::Result;
use crate::wavefunction::QuantumState;

const DIFFUSION: f64 = 0.5;

#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct ImportanceSampling {
    pub time_step: f64,
}

impl ImportanceSampling {
    pub fn new(time_step: f64) -> Self {
        Self { time_step }
    }

    /// ln G(to ← from) for the single moved coordinate, up to a constant.
    fn log_green(&self, to: f64, from: f64, drift_from: f64) -> f64 {
        let shift = to - from - DIFFUSION * self.time_step * drift_from;
        -shift * shift / (4.0 * DIFFUSION * self.time_step)
    }
}

impl<S: QuantumState + ?Sized> ChainStep<S> for ImportanceSampling {
    fn variance_factor(&self) -> f64 {
        1.0
    }

    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool> {
        let n = state.configuration().len();
        let i = rng.gen_range(0..n);

        let x = state.configuration().clone();
        let drift_old = 2.0 * state.log_gradient_at(&x, 1.0)[i];
        let xi: f64 = rng.sample(StandardNormal);

        let mut trial = x.clone();
        trial[i] += DIFFUSION * drift_old * self.time_step + xi * self.time_step.sqrt();
        let drift_new = 2.0 * state.log_gradient_at(&trial, 1.0)[i];

        let log_green_ratio = self.log_green(x[i], trial[i], drift_new)
            - self.log_green(trial[i], x[i], drift_old);
        let acceptance_ratio = log_green_ratio.exp() * state.amplitude_ratio(&trial);

        if rng.gen::<f64>() < acceptance_ratio {
            state.set_configuration(trial)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
