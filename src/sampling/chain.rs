//! Runtime selection of the chain step.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::gibbs::Gibbs;
use super::importance::ImportanceSampling;
use super::metropolis::Metropolis;
use super::traits::ChainStep;
use crate::error::Result;
use crate::wavefunction::ConditionalSampling;

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainKind {
    Metropolis(Metropolis),
    Importance(ImportanceSampling),
    Gibbs,
}

impl Default for ChainKind {
    fn default() -> Self {
        ChainKind::Metropolis(Metropolis::new(0.5))
    }
}

impl<S: ConditionalSampling + ?Sized> ChainStep<S> for ChainKind {
    fn variance_factor(&self) -> f64 {
        match self {
            ChainKind::Metropolis(m) => ChainStep::<S>::variance_factor(m),
            ChainKind::Importance(i) => ChainStep::<S>::variance_factor(i),
            ChainKind::Gibbs => ChainStep::<S>::variance_factor(&Gibbs),
        }
    }

    fn step(&mut self, state: &mut S, rng: &mut dyn RngCore) -> Result<bool> {
        match self {
            ChainKind::Metropolis(m) => m.step(state, rng),
            ChainKind::Importance(i) => i.step(state, rng),
            ChainKind::Gibbs => Gibbs.step(state, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefunction::GaussianBinaryRbm;

    #[test]
    fn test_kind_from_yaml() {
        let kind: ChainKind = serde_yaml::from_str("kind: metropolis\nstep_length: 0.8\n").unwrap();
        assert!(matches!(kind, ChainKind::Metropolis(Metropolis { step_length }) if step_length == 0.8));
        let kind: ChainKind = serde_yaml::from_str("kind: gibbs\n").unwrap();
        assert_eq!(ChainStep::<GaussianBinaryRbm>::variance_factor(&kind), 0.5);
        let kind: ChainKind = serde_yaml::from_str("kind: importance\ntime_step: 0.01\n").unwrap();
        assert_eq!(ChainStep::<GaussianBinaryRbm>::variance_factor(&kind), 1.0);
    }
}
