//! YAML run configuration.
//!
//! ```yaml
//! system:
//!   n_particles: 2
//!   n_dimensions: 2
//!   omega: 1.0
//!   interacting: false
//! wavefunction:
//!   n_hidden: 2
//!   sigma: 1.0
//!   init_spread: 0.001
//!   seed: 2024
//! sampler:
//!   kind: importance
//!   time_step: 0.45
//! optimizer:
//!   kind: sgd
//!   learning_rate: 0.2
//! run:
//!   n_samples: 100000
//!   n_cycles: 50
//!   seed: 1
//!   summary_file: summary.dat
//!   blocks_file: blocks.dat
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::optimizer::OptimizerKind;
use crate::sampling::{ChainKind, SamplerParams};
use crate::systems::HarmonicOscillator;
use crate::wavefunction::GaussianBinaryRbm;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SystemConfig {
    pub n_particles: usize,
    pub n_dimensions: usize,
    pub omega: f64,
    pub interacting: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self { n_particles: 1, n_dimensions: 1, omega: 1.0, interacting: false }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WavefunctionConfig {
    pub n_hidden: usize,
    pub sigma: f64,
    /// Standard deviation of the initial parameters
    pub init_spread: f64,
    pub seed: u64,
}

impl Default for WavefunctionConfig {
    fn default() -> Self {
        Self { n_hidden: 2, sigma: 1.0, init_spread: 0.001, seed: 2024 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub wavefunction: WavefunctionConfig,
    #[serde(default)]
    pub sampler: ChainKind,
    #[serde(default)]
    pub optimizer: OptimizerKind,
    pub run: SamplerParams,
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(VmcError::InvalidParameter(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(VmcError::InvalidParameter(format!("{name} must be non-negative, got {value}")))
    }
}

impl RunConfig {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn validate(&self) -> Result<()> {
        if self.system.n_particles == 0 || self.system.n_dimensions == 0 {
            return Err(VmcError::InvalidParameter("system must have particles and dimensions".into()));
        }
        if self.wavefunction.n_hidden == 0 {
            return Err(VmcError::InvalidParameter("n_hidden must be positive".into()));
        }
        if self.run.n_cycles == 0 {
            return Err(VmcError::InvalidParameter("n_cycles must be positive".into()));
        }
        positive("omega", self.system.omega)?;
        positive("sigma", self.wavefunction.sigma)?;
        non_negative("init_spread", self.wavefunction.init_spread)?;
        match self.sampler {
            ChainKind::Metropolis(m) => positive("step_length", m.step_length)?,
            ChainKind::Importance(i) => positive("time_step", i.time_step)?,
            ChainKind::Gibbs => {}
        }
        match &self.optimizer {
            OptimizerKind::Sgd(sgd) => positive("learning_rate", sgd.learning_rate)?,
            OptimizerKind::Asgd(asgd) => {
                positive("a", asgd.a)?;
                positive("big_a", asgd.big_a)?;
                positive("omega", asgd.omega)?;
                // f must run from a negative floor to a positive ceiling
                if !(asgd.f_min < 0.0 && asgd.f_max > 0.0) {
                    return Err(VmcError::InvalidParameter(format!(
                        "asgd needs f_min < 0 < f_max, got f_min = {}, f_max = {}",
                        asgd.f_min, asgd.f_max
                    )));
                }
            }
        }
        self.run.validate()
    }

    pub fn hamiltonian(&self) -> HarmonicOscillator {
        HarmonicOscillator::new(self.system.omega, self.system.interacting)
    }

    pub fn build_rbm(&self) -> Result<GaussianBinaryRbm> {
        GaussianBinaryRbm::new(
            self.system.n_particles,
            self.system.n_dimensions,
            self.wavefunction.n_hidden,
            self.wavefunction.sigma,
            self.wavefunction.init_spread,
            self.wavefunction.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "
system:
  n_particles: 2
  n_dimensions: 2
  interacting: true
wavefunction:
  n_hidden: 4
sampler:
  kind: gibbs
optimizer:
  kind: asgd
  a: 0.05
run:
  n_samples: 2000
  n_cycles: 10
  seed: 7
  summary_file: out/summary.dat
  blocks_file: out/blocks.dat
  params_file: out/params.dat
";

    #[test]
    fn test_parse_example() {
        let config = RunConfig::from_reader(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(config.system.n_particles, 2);
        assert!(config.system.interacting);
        assert_eq!(config.system.omega, 1.0);
        assert_eq!(config.wavefunction.n_hidden, 4);
        assert_eq!(config.wavefunction.sigma, 1.0);
        assert!(matches!(config.sampler, ChainKind::Gibbs));
        match &config.optimizer {
            OptimizerKind::Asgd(asgd) => {
                assert_eq!(asgd.a, 0.05);
                assert_eq!(asgd.big_a, 20.0);
            }
            other => panic!("unexpected optimizer {:?}", other),
        }
        assert_eq!(config.run.burn_in_fraction, 0.1);
        assert!(config.run.verbose);
        assert_eq!(config.run.params_file.as_deref(), Some(Path::new("out/params.dat")));

        let rbm = config.build_rbm().unwrap();
        assert_eq!(rbm.n_visible(), 4);
        assert_eq!(rbm.n_hidden(), 4);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let yaml = "run:\n  n_samples: 100\n  n_cycles: 1\n  seed: 0\n  summary_file: s\n  blocks_file: b\n";
        let config = RunConfig::from_reader(yaml.as_bytes()).unwrap();
        assert!(matches!(config.sampler, ChainKind::Metropolis(_)));
        assert!(matches!(config.optimizer, OptimizerKind::Sgd(_)));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad_step = EXAMPLE.replace("kind: gibbs", "kind: metropolis\n  step_length: -1.0");
        assert!(RunConfig::from_reader(bad_step.as_bytes()).is_err());

        let bad_burn_in = format!("{EXAMPLE}  burn_in_fraction: 1.5\n");
        assert!(matches!(
            RunConfig::from_reader(bad_burn_in.as_bytes()),
            Err(VmcError::InvalidParameter(_))
        ));

        let bad_spread = EXAMPLE.replace("n_hidden: 4", "n_hidden: 4\n  init_spread: -0.1");
        assert!(matches!(
            RunConfig::from_reader(bad_spread.as_bytes()),
            Err(VmcError::InvalidParameter(_))
        ));

        let missing_run = "system:\n  n_particles: 1\n";
        assert!(matches!(RunConfig::from_reader(missing_run.as_bytes()), Err(VmcError::Config(_))));
    }

    #[test]
    fn test_rejects_asgd_bounds_of_wrong_sign() {
        for bounds in ["f_min: 0.0", "f_min: 0.5", "f_max: 0.0", "f_max: -1.0"] {
            let yaml = EXAMPLE.replace("a: 0.05", &format!("a: 0.05\n  {bounds}"));
            assert!(
                matches!(RunConfig::from_reader(yaml.as_bytes()), Err(VmcError::InvalidParameter(_))),
                "accepted {bounds}"
            );
        }
        let yaml = EXAMPLE.replace("a: 0.05", "a: 0.05\n  f_min: -1.0\n  f_max: 3.0");
        assert!(RunConfig::from_reader(yaml.as_bytes()).is_ok());
    }
}
