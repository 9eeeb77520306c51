//! Error analysis of correlated local-energy sequences.
//!
//! The per-sample file written during the final training cycle is a
//! correlated Markov chain, so the naive standard error underestimates the
//! true one. Repeated pair-averaging (Flyvbjerg & Petersen, J. Chem. Phys.
//! 91, 461 (1989)) makes the blocks progressively less correlated; the
//! standard error rises until it plateaus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, VmcError};

/// Levels with fewer blocks than this are too noisy to trust.
const MIN_BLOCKS: usize = 32;

#[derive(Serialize, Clone, Debug)]
pub struct BlockLevel {
    pub block_size: usize,
    pub n_blocks: usize,
    pub error: f64,
}

#[derive(Serialize, Clone, Debug)]
pub struct BlockingResult {
    pub n_samples: usize,
    pub mean: f64,
    pub variance: f64,
    /// Standard error assuming uncorrelated samples
    pub naive_error: f64,
    /// Blocking estimate of the standard error
    pub error: f64,
    pub autocorrelation_time: f64,
    pub levels: Vec<BlockLevel>,
}

/// Read one sample per line, skipping blank lines.
pub fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed.parse::<f64>().map_err(|_| VmcError::Parse {
            line: idx + 1,
            content: line.clone(),
        })?;
        samples.push(value);
    }
    Ok(samples)
}

fn mean_and_variance(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// Blocking analysis; `None` for fewer than two samples.
pub fn blocking(samples: &[f64]) -> Option<BlockingResult> {
    if samples.len() < 2 {
        return None;
    }
    let (mean, variance) = mean_and_variance(samples);

    let mut levels = Vec::new();
    let mut blocks = samples.to_vec();
    let mut block_size = 1;
    while blocks.len() >= 2 {
        let n_blocks = blocks.len();
        let (_, block_variance) = mean_and_variance(&blocks);
        levels.push(BlockLevel {
            block_size,
            n_blocks,
            error: (block_variance / (n_blocks - 1) as f64).sqrt(),
        });
        blocks = blocks.chunks_exact(2).map(|pair| 0.5 * (pair[0] + pair[1])).collect();
        block_size *= 2;
    }

    let naive_error = levels[0].error;
    let error = levels
        .iter()
        .filter(|level| level.n_blocks >= MIN_BLOCKS)
        .map(|level| level.error)
        .fold(naive_error, f64::max);

    Some(BlockingResult {
        n_samples: samples.len(),
        mean,
        variance,
        naive_error,
        error,
        autocorrelation_time: integrated_time(samples, mean, variance),
        levels,
    })
}

/// Integrated autocorrelation time τ = 1 + 2 Σₜ ρ(t), truncated at the first
/// negative ρ(t).
pub fn autocorrelation_time(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 1.0;
    }
    let (mean, variance) = mean_and_variance(samples);
    integrated_time(samples, mean, variance)
}

fn integrated_time(samples: &[f64], mean: f64, variance: f64) -> f64 {
    if variance == 0.0 {
        return 1.0;
    }
    let deviations: Vec<f64> = samples.iter().map(|&x| x - mean).collect();
    let n = deviations.len();
    let rho = |lag: usize| {
        let sum: f64 = deviations[..n - lag]
            .iter()
            .zip(&deviations[lag..])
            .map(|(a, b)| a * b)
            .sum();
        sum / ((n - lag) as f64 * variance)
    };

    1.0 + 2.0 * (1..n / 2).map(rho).take_while(|&r| r >= 0.0).sum::<f64>()
}
