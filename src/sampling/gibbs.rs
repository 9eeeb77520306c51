//! Gibbs chain step: exact block resampling from the RBM conditionals.
//!
//! The sampled density is the RBM marginal F(x) itself, so the wavefunction
//! is Ψ = √F and every derivative of ln Ψ picks up a factor ½.

use rand::RngCore;

use super::traits::ChainStep;
use crate::error::Result;
use crate::wavefunction::ConditionalSampling;

#[derive(Copy, Clone, Debug, Default)]
pub struct Gibbs;

impl<S: ConditionalSampling + ?Sized> ChainStep<S> for Gibbs {
    fn variance_factor(&self) -> f64 {
        0.5
    }

    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool> {
        state.sample_hidden(rng);
        state.sample_visible(rng)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefunction::{GaussianBinaryRbm, QuantumState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_step_is_realized() {
        let mut rbm = GaussianBinaryRbm::new(2, 2, 2, 1.0, 0.1, 3).unwrap();
        let mut chain = Gibbs;
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let before = rbm.configuration().clone();
            assert!(chain.step(&mut rbm, &mut rng).unwrap());
            assert_ne!(&before, rbm.configuration());
        }
        assert_eq!(ChainStep::<GaussianBinaryRbm>::variance_factor(&chain), 0.5);
    }
}
