//! Plain stochastic gradient descent.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::traits::Optimizer;
use crate::error::{Result, VmcError};
use crate::wavefunction::QuantumState;

/// θ ← θ - η·∇E
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

pub(crate) fn check_gradient<S: QuantumState + ?Sized>(state: &S, gradient: &DVector<f64>) -> Result<()> {
    if gradient.len() != state.n_params() {
        return Err(VmcError::DimensionMismatch {
            expected: state.n_params(),
            found: gradient.len(),
        });
    }
    Ok(())
}

impl<S: QuantumState + ?Sized> Optimizer<S> for Sgd {
    fn update(&mut self, state: &mut S, gradient: &DVector<f64>, _cycle: usize) -> Result<()> {
        check_gradient(state, gradient)?;
        let params = state.params() - gradient * self.learning_rate;
        state.set_params(&params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefunction::GaussianOrbital;
    use approx::assert_relative_eq;

    #[test]
    fn test_descends_along_gradient() {
        let mut state = GaussianOrbital::new(0.8, 1, 1, 0).unwrap();
        let mut sgd = Sgd::new(0.1);
        sgd.update(&mut state, &DVector::from_element(1, 2.0), 0).unwrap();
        assert_relative_eq!(state.alpha(), 0.6, epsilon = 1e-14);
    }

    #[test]
    fn test_rejects_wrong_gradient_length() {
        let mut state = GaussianOrbital::new(0.8, 1, 1, 0).unwrap();
        let mut sgd = Sgd::new(0.1);
        assert!(sgd.update(&mut state, &DVector::zeros(2), 0).is_err());
        assert_relative_eq!(state.alpha(), 0.8);
    }
}
