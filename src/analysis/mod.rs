//! Analysis module - post-hoc statistics on sampler output.

mod blocking;

pub use blocking::{blocking, read_samples, autocorrelation_time, BlockLevel, BlockingResult};
