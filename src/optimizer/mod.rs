//! Optimizer module - parameter update rules driven by the VMC gradient.

mod traits;
mod sgd;
mod asgd;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

pub use traits::Optimizer;
pub use sgd::Sgd;
pub use asgd::Asgd;

use crate::error::Result;
use crate::wavefunction::QuantumState;

/// Runtime selection of the update rule.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd(Sgd),
    Asgd(Asgd),
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::Sgd(Sgd::new(0.1))
    }
}

impl<S: QuantumState + ?Sized> Optimizer<S> for OptimizerKind {
    fn update(&mut self, state: &mut S, gradient: &DVector<f64>, cycle: usize) -> Result<()> {
        match self {
            OptimizerKind::Sgd(sgd) => sgd.update(state, gradient, cycle),
            OptimizerKind::Asgd(asgd) => asgd.update(state, gradient, cycle),
        }
    }
}
