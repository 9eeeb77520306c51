//! Brute-force Metropolis chain step.

use rand::{Rng, RngCore};

use serde::{Deserialize, Serialize};

use super::traits::ChainStep;
use crate::error::Result;
use crate::wavefunction::QuantumState;

/// Moves one randomly chosen coordinate by a uniform displacement in
/// `[-step_length/2, step_length/2)` and accepts with probability
/// min(1, |Ψ(x')/Ψ(x)|²).
#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct Metropolis {
    pub step_length: f64,
}

impl Metropolis {
    pub fn new(step_length: f64) -> Self {
        Self { step_length }
    }
}

impl<S: QuantumState + ?Sized> ChainStep<S> for Metropolis {
    fn variance_factor(&self) -> f64 {
        1.0
    }

    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool> {
        let n = state.configuration().len();
        let i = rng.gen_range(0..n);

        let mut trial = state.configuration().clone();
        trial[i] += self.step_length * (rng.gen::<f64>() - 0.5);

        let acceptance_ratio = state.amplitude_ratio(&trial);
        if rng.gen::<f64>() < acceptance_ratio {
            state.set_configuration(trial)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefunction::GaussianOrbital;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_moves_at_most_one_coordinate() {
        let mut state = GaussianOrbital::new(0.5, 3, 2, 4).unwrap();
        let mut chain = Metropolis::new(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let before = state.configuration().clone();
            let moved = chain.step(&mut state, &mut rng).unwrap();
            let changed = before
                .iter()
                .zip(state.configuration().iter())
                .filter(|(a, b)| a != b)
                .count();
            if moved {
                assert!(changed <= 1);
            } else {
                assert_eq!(changed, 0);
            }
        }
    }

    #[test]
    fn test_acceptance_is_neither_zero_nor_total() {
        let mut state = GaussianOrbital::new(0.5, 1, 1, 4).unwrap();
        let mut chain = Metropolis::new(2.0);
        let mut rng = StdRng::seed_from_u64(2);
        let accepted = (0..2000)
            .filter(|_| chain.step(&mut state, &mut rng).unwrap())
            .count();
        assert!(accepted > 200 && accepted < 2000, "accepted {}", accepted);
    }
}
