//! Variational Monte Carlo training loop.
//!
//! Each optimization cycle runs one Markov chain of `n_samples` steps under
//! the current parameters, discards a burn-in prefix, accumulates the local
//! energy and the log-derivatives Oᵢ = ∂ ln Ψ / ∂θᵢ, and hands the gradient
//!
//!   ∂⟨E⟩/∂θᵢ = 2(⟨E_L Oᵢ⟩ - ⟨E_L⟩⟨Oᵢ⟩)
//!
//! to the optimizer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::accumulator::Accumulators;
use super::traits::{ChainStep, Hamiltonian};
use crate::error::{Result, VmcError};
use crate::optimizer::Optimizer;
use crate::wavefunction::QuantumState;

fn default_burn_in_fraction() -> f64 {
    0.1
}

fn default_verbose() -> bool {
    true
}

/// Parameters for a VMC training run.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SamplerParams {
    /// Chain length per optimization cycle, burn-in included
    pub n_samples: usize,
    pub n_cycles: usize,
    pub seed: u64,
    /// Leading fraction of every chain discarded from the statistics
    #[serde(default = "default_burn_in_fraction")]
    pub burn_in_fraction: f64,
    /// One line per cycle: `cycle energy variance accepted_ratio`
    pub summary_file: PathBuf,
    /// One local energy per line, final cycle only
    pub blocks_file: PathBuf,
    /// Final parameters, written after the last cycle
    #[serde(default)]
    pub params_file: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl SamplerParams {
    pub fn new(
        n_samples: usize,
        n_cycles: usize,
        seed: u64,
        summary_file: impl Into<PathBuf>,
        blocks_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            n_samples,
            n_cycles,
            seed,
            burn_in_fraction: default_burn_in_fraction(),
            summary_file: summary_file.into(),
            blocks_file: blocks_file.into(),
            params_file: None,
            verbose: default_verbose(),
        }
    }

    /// Set the discarded fraction of each chain.
    pub fn with_burn_in_fraction(mut self, fraction: f64) -> Self {
        self.burn_in_fraction = fraction;
        self
    }

    /// Write the final parameters to `path` after the last cycle.
    pub fn with_params_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.params_file = Some(path.into());
        self
    }

    /// Set verbosity.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Number of leading samples discarded in every cycle.
    pub fn burn_in(&self) -> usize {
        (self.burn_in_fraction * self.n_samples as f64).floor() as usize
    }

    /// Number of samples entering the statistics of every cycle.
    pub fn effective_samples(&self) -> usize {
        self.n_samples.saturating_sub(self.burn_in())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.burn_in_fraction) {
            return Err(VmcError::InvalidParameter(format!(
                "burn_in_fraction must lie in [0, 1), got {}",
                self.burn_in_fraction
            )));
        }
        if self.effective_samples() == 0 {
            return Err(VmcError::EmptySamplingWindow {
                n_samples: self.n_samples,
                burn_in: self.burn_in(),
            });
        }
        Ok(())
    }
}

/// Statistics of one optimization cycle.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CycleStats {
    pub cycle: usize,
    pub energy: f64,
    pub variance: f64,
    pub accepted_ratio: f64,
    pub effective_samples: usize,
    pub accepted_samples: usize,
    pub gradient_norm: f64,
}

/// Results of a full training run.
#[derive(Clone, Debug)]
pub struct TrainingResult {
    pub history: Vec<CycleStats>,
    pub final_params: DVector<f64>,
}

impl TrainingResult {
    pub fn final_energy(&self) -> Option<f64> {
        self.history.last().map(|s| s.energy)
    }
}

fn sink_error(path: &Path) -> impl FnOnce(io::Error) -> VmcError + '_ {
    move |source| VmcError::Sink {
        path: path.to_path_buf(),
        source,
    }
}

/// Borrow an open sink, or fail if `run` has already closed it.
fn open_sink<'a>(sink: &'a mut Option<BufWriter<File>>, path: &Path) -> Result<&'a mut BufWriter<File>> {
    sink.as_mut().ok_or_else(|| VmcError::Sink {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, "sink already closed"),
    })
}

/// VMC training engine.
pub struct Sampler<S, H, C, O> {
    state: S,
    hamiltonian: H,
    chain: C,
    optimizer: O,
    params: SamplerParams,
    gibbs_factor: f64,
    rng: StdRng,
    accumulators: Accumulators,
    /// Open until `run` finishes
    summary: Option<BufWriter<File>>,
    blocks: Option<BufWriter<File>>,
}

impl<S, H, C, O> Sampler<S, H, C, O>
where
    S: QuantumState,
    H: Hamiltonian<S>,
    C: ChainStep<S>,
    O: Optimizer<S>,
{
    /// Validate the run parameters and open both diagnostics sinks.
    pub fn new(params: SamplerParams, hamiltonian: H, state: S, chain: C, optimizer: O) -> Result<Self> {
        params.validate()?;
        let summary = File::create(&params.summary_file).map_err(sink_error(&params.summary_file))?;
        let blocks = File::create(&params.blocks_file).map_err(sink_error(&params.blocks_file))?;

        let gibbs_factor = chain.variance_factor();
        let accumulators = Accumulators::new(state.n_params());
        let rng = StdRng::seed_from_u64(params.seed);

        Ok(Self {
            state,
            hamiltonian,
            chain,
            optimizer,
            params,
            gibbs_factor,
            rng,
            accumulators,
            summary: Some(BufWriter::new(summary)),
            blocks: Some(BufWriter::new(blocks)),
        })
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn gibbs_factor(&self) -> f64 {
        self.gibbs_factor
    }

    /// Run all optimization cycles, then close both sinks.
    pub fn run(&mut self) -> Result<TrainingResult> {
        info!(
            n_samples = self.params.n_samples,
            n_cycles = self.params.n_cycles,
            n_params = self.state.n_params(),
            burn_in = self.params.burn_in(),
            gibbs_factor = self.gibbs_factor,
            "starting VMC training"
        );

        let mut history = Vec::with_capacity(self.params.n_cycles);
        for cycle in 0..self.params.n_cycles {
            history.push(self.run_cycle(cycle)?);
        }

        if let Some(path) = self.params.params_file.clone() {
            let file = File::create(&path).map_err(sink_error(&path))?;
            let mut out = BufWriter::new(file);
            self.state.dump_params(&mut out)?;
            out.flush().map_err(sink_error(&path))?;
        }
        self.close()?;

        if let Some(last) = history.last() {
            info!(energy = last.energy, variance = last.variance, "training finished");
        }
        Ok(TrainingResult {
            history,
            final_params: self.state.params(),
        })
    }

    /// Run one optimization cycle: sample, estimate, update, report.
    pub fn run_cycle(&mut self, cycle: usize) -> Result<CycleStats> {
        self.state.refresh();
        self.accumulators.reset();

        let burn_in = self.params.burn_in();
        let last_cycle = cycle + 1 == self.params.n_cycles;
        let n_params = self.state.n_params();

        for sample in 0..self.params.n_samples {
            let realized = self.chain.step(&mut self.state, &mut self.rng)?;
            if sample < burn_in {
                continue;
            }

            let energy = self.hamiltonian.local_energy(&self.state, self.gibbs_factor)?;
            if !energy.is_finite() {
                return Err(VmcError::NonFinite { quantity: "local energy", cycle, sample });
            }
            let grad = self.hamiltonian.local_energy_gradient(&self.state, self.gibbs_factor)?;
            if grad.len() != n_params {
                return Err(VmcError::DimensionMismatch { expected: n_params, found: grad.len() });
            }
            if grad.iter().any(|g| !g.is_finite()) {
                return Err(VmcError::NonFinite { quantity: "log-derivative", cycle, sample });
            }

            self.accumulators.push(energy, &grad, realized);

            if last_cycle {
                let path = &self.params.blocks_file;
                writeln!(open_sink(&mut self.blocks, path)?, "{}", energy).map_err(sink_error(path))?;
            }
        }

        let estimates = self.accumulators.finalize().ok_or(VmcError::EmptySamplingWindow {
            n_samples: self.params.n_samples,
            burn_in,
        })?;
        let gradient = estimates.gradient();
        self.optimizer.update(&mut self.state, &gradient, cycle)?;

        if estimates.variance < 0.0 {
            warn!(cycle, variance = estimates.variance, "negative finite-sample variance");
        }
        debug!(
            cycle,
            energy = estimates.energy,
            variance = estimates.variance,
            accepted_ratio = estimates.accepted_ratio,
            gradient_norm = gradient.norm(),
            "cycle finished"
        );

        if self.params.verbose {
            println!(
                "{:5}   {:.8}   {:.8}   {:.4}",
                cycle, estimates.energy, estimates.variance, estimates.accepted_ratio
            );
        }
        let path = &self.params.summary_file;
        let summary = open_sink(&mut self.summary, path)?;
        writeln!(
            summary,
            "{}   {}   {}   {}",
            cycle, estimates.energy, estimates.variance, estimates.accepted_ratio
        )
        .map_err(sink_error(path))?;
        summary.flush().map_err(sink_error(path))?;
        if last_cycle {
            let path = &self.params.blocks_file;
            open_sink(&mut self.blocks, path)?.flush().map_err(sink_error(path))?;
        }

        Ok(CycleStats {
            cycle,
            energy: estimates.energy,
            variance: estimates.variance,
            accepted_ratio: estimates.accepted_ratio,
            effective_samples: estimates.effective_samples,
            accepted_samples: estimates.accepted_samples,
            gradient_norm: gradient.norm(),
        })
    }

    /// Flush whichever diagnostics sinks are still open.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(summary) = self.summary.as_mut() {
            summary.flush().map_err(sink_error(&self.params.summary_file))?;
        }
        if let Some(blocks) = self.blocks.as_mut() {
            blocks.flush().map_err(sink_error(&self.params.blocks_file))?;
        }
        Ok(())
    }

    /// Flush and close both diagnostics sinks. Later cycles fail with `Sink`.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.summary = None;
        self.blocks = None;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.summary.is_none() && self.blocks.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Sgd;
    use crate::sampling::{Gibbs, Metropolis};
    use crate::systems::HarmonicOscillator;
    use crate::wavefunction::{GaussianBinaryRbm, GaussianOrbital};
    use approx::assert_relative_eq;

    fn params_in(dir: &Path, n_samples: usize, n_cycles: usize) -> SamplerParams {
        SamplerParams::new(n_samples, n_cycles, 42, dir.join("summary.dat"), dir.join("blocks.dat"))
            .with_verbose(false)
    }

    /// Harmonic oscillator whose gradient component is corrupted.
    enum BrokenGradient {
        NanComponent,
        OneTooLong,
    }

    impl<S: QuantumState> Hamiltonian<S> for BrokenGradient {
        fn local_energy(&self, state: &S, gibbs_factor: f64) -> Result<f64> {
            HarmonicOscillator::new(1.0, false).local_energy(state, gibbs_factor)
        }

        fn local_energy_gradient(&self, state: &S, gibbs_factor: f64) -> Result<DVector<f64>> {
            let grad = state.param_log_derivatives(gibbs_factor);
            Ok(match self {
                BrokenGradient::NanComponent => grad.map(|_| f64::NAN),
                BrokenGradient::OneTooLong => DVector::zeros(grad.len() + 1),
            })
        }
    }

    #[test]
    fn test_burn_in_window() {
        let params = SamplerParams::new(1005, 1, 0, "s", "b");
        assert_eq!(params.burn_in(), 100);
        assert_eq!(params.effective_samples(), 905);
        for n in [1, 9, 10, 11, 99, 1000, 12345] {
            let params = SamplerParams::new(n, 1, 0, "s", "b");
            assert_eq!(params.effective_samples(), n - n / 10);
        }
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 0, 1);
        let state = GaussianOrbital::new(0.5, 1, 1, 0).unwrap();
        let result = Sampler::new(params, HarmonicOscillator::new(1.0, false), state, Metropolis::new(1.0), Sgd::new(0.1));
        assert!(matches!(result, Err(VmcError::EmptySamplingWindow { n_samples: 0, .. })));

        let params = params_in(dir.path(), 10, 1).with_burn_in_fraction(1.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_unopenable_sink_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let params = SamplerParams::new(100, 1, 0, dir.path().join("missing/summary.dat"), dir.path().join("blocks.dat"));
        let state = GaussianOrbital::new(0.5, 1, 1, 0).unwrap();
        let result = Sampler::new(params, HarmonicOscillator::new(1.0, false), state, Metropolis::new(1.0), Sgd::new(0.1));
        assert!(matches!(result, Err(VmcError::Sink { .. })));
    }

    #[test]
    fn test_gibbs_ratio_is_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 500, 2);
        let rbm = GaussianBinaryRbm::new(1, 2, 2, 1.0, 0.1, 1).unwrap();
        let mut sampler = Sampler::new(params, HarmonicOscillator::new(1.0, false), rbm, Gibbs, Sgd::new(0.05)).unwrap();
        assert_eq!(sampler.gibbs_factor(), 0.5);
        let result = sampler.run().unwrap();
        for stats in &result.history {
            assert_eq!(stats.accepted_ratio, 1.0);
            assert_eq!(stats.effective_samples, 450);
        }
    }

    #[test]
    fn test_metropolis_ratio_in_unit_interval() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 400, 3);
        let rbm = GaussianBinaryRbm::new(2, 2, 2, 1.0, 0.1, 1).unwrap();
        let mut sampler = Sampler::new(params, HarmonicOscillator::new(1.0, false), rbm, Metropolis::new(1.0), Sgd::new(0.05)).unwrap();
        assert_eq!(sampler.gibbs_factor(), 1.0);
        let result = sampler.run().unwrap();
        assert_eq!(result.history.len(), 3);
        for stats in &result.history {
            assert!((0.0..=1.0).contains(&stats.accepted_ratio));
            assert_eq!(stats.effective_samples, 360);
        }
        assert_eq!(result.final_params, sampler.state().params());
    }

    #[test]
    fn test_exact_ground_state_has_zero_variance_and_gradient() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 300, 1);
        let state = GaussianOrbital::new(0.5, 2, 2, 3).unwrap();
        let mut sampler = Sampler::new(params, HarmonicOscillator::new(1.0, false), state, Metropolis::new(1.0), Sgd::new(0.1)).unwrap();
        let stats = sampler.run_cycle(0).unwrap();
        assert_relative_eq!(stats.energy, 2.0, epsilon = 1e-10);
        assert_relative_eq!(stats.variance, 0.0, epsilon = 1e-10);
        assert_relative_eq!(stats.gradient_norm, 0.0, epsilon = 1e-10);
        assert_relative_eq!(sampler.state().alpha(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_non_finite_log_derivative_aborts_at_first_sample() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 100, 2);
        let state = GaussianOrbital::new(0.5, 1, 1, 0).unwrap();
        let mut sampler =
            Sampler::new(params, BrokenGradient::NanComponent, state, Metropolis::new(1.0), Sgd::new(0.1)).unwrap();
        let err = sampler.run().unwrap_err();
        assert!(matches!(
            err,
            VmcError::NonFinite { quantity: "log-derivative", cycle: 0, sample: 10 }
        ));
        assert_relative_eq!(sampler.into_state().alpha(), 0.5);
    }

    #[test]
    fn test_wrong_length_gradient_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 100, 1);
        let state = GaussianOrbital::new(0.5, 1, 1, 0).unwrap();
        let mut sampler =
            Sampler::new(params, BrokenGradient::OneTooLong, state, Metropolis::new(1.0), Sgd::new(0.1)).unwrap();
        let err = sampler.run_cycle(0).unwrap_err();
        assert!(matches!(err, VmcError::DimensionMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn test_run_closes_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_in(dir.path(), 200, 2);
        let state = GaussianOrbital::new(0.5, 1, 2, 0).unwrap();
        let mut sampler =
            Sampler::new(params, HarmonicOscillator::new(1.0, false), state, Metropolis::new(1.0), Sgd::new(0.1)).unwrap();
        assert!(!sampler.is_closed());
        let result = sampler.run().unwrap();
        assert!(sampler.is_closed());
        assert_relative_eq!(result.final_energy().unwrap(), 1.0, epsilon = 1e-10);

        let summary = std::fs::read_to_string(dir.path().join("summary.dat")).unwrap();
        assert_eq!(summary.lines().count(), 2);
        let blocks = std::fs::read_to_string(dir.path().join("blocks.dat")).unwrap();
        assert_eq!(blocks.lines().count(), 180);

        assert!(matches!(sampler.run_cycle(0), Err(VmcError::Sink { .. })));
        sampler.flush().unwrap();
    }
}
