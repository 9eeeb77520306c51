//! Error types for VMC training.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmcError {
    #[error("cannot use diagnostics sink {path:?}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("burn-in of {burn_in} leaves no samples out of {n_samples}")]
    EmptySamplingWindow { n_samples: usize, burn_in: usize },

    #[error("non-finite {quantity} in cycle {cycle}, sample {sample}")]
    NonFinite {
        quantity: &'static str,
        cycle: usize,
        sample: usize,
    },

    #[error("degenerate wavefunction: {0}")]
    Degenerate(String),

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("cannot parse line {line}: {content:?}")]
    Parse { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, VmcError>;
