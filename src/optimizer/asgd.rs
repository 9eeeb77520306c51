//! Adaptive stochastic gradient descent.
//!
//! The step size γ = a / (t + A) grows while successive gradients agree
//! and shrinks when they point in opposite directions:
//!
//!   t ← max(t + f(-∇ₖ·∇ₖ₋₁), 0)
//!   f(x) = f_min + (f_max - f_min) / (1 - (f_max / f_min)·exp(-x/ω))

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::sgd::check_gradient;
use super::traits::Optimizer;
use crate::error::Result;
use crate::wavefunction::QuantumState;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Asgd {
    pub a: f64,
    pub big_a: f64,
    pub f_max: f64,
    pub f_min: f64,
    pub omega: f64,
    #[serde(skip)]
    t: f64,
    #[serde(skip)]
    prev_gradient: Option<DVector<f64>>,
}

impl Default for Asgd {
    fn default() -> Self {
        Self {
            a: 0.01,
            big_a: 20.0,
            f_max: 2.0,
            f_min: -0.5,
            omega: 1.0,
            t: 0.0,
            prev_gradient: None,
        }
    }
}

impl Asgd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step-size numerator `a`.
    pub fn with_a(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// Set the step-size offset `A`.
    pub fn with_big_a(mut self, big_a: f64) -> Self {
        self.big_a = big_a;
        self
    }

    fn f(&self, x: f64) -> f64 {
        self.f_min + (self.f_max - self.f_min) / (1.0 - (self.f_max / self.f_min) * (-x / self.omega).exp())
    }

    /// Step size used by the most recent update.
    pub fn step_size(&self) -> f64 {
        self.a / (self.t + self.big_a)
    }
}

impl<S: QuantumState + ?Sized> Optimizer<S> for Asgd {
    fn update(&mut self, state: &mut S, gradient: &DVector<f64>, _cycle: usize) -> Result<()> {
        check_gradient(state, gradient)?;
        self.t = match &self.prev_gradient {
            Some(prev) => (self.t + self.f(-gradient.dot(prev))).max(0.0),
            None => self.big_a,
        };
        let params = state.params() - gradient * self.step_size();
        self.prev_gradient = Some(gradient.clone());
        state.set_params(&params)
    }
}
