//! IO module - run configuration files.

mod config;

pub use config::{RunConfig, SystemConfig, WavefunctionConfig};
