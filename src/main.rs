use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, Level};

use nqs_vmc::{blocking, read_samples, Result, RunConfig, Sampler, VmcError};

#[derive(Parser, Debug)]
#[command(version, about = "Variational Monte Carlo training of RBM quantum states", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize an RBM wavefunction as described by a YAML config
    Train {
        #[arg(short, long, default_value = "config.yml")]
        config: PathBuf,
    },
    /// Blocking analysis of a per-sample energy file
    Block {
        #[arg(short, long, default_value = "blocks.dat")]
        input: PathBuf,
    },
}

fn train(path: &Path) -> Result<()> {
    let config = RunConfig::from_file(path)?;
    let rbm = config.build_rbm()?;
    let mut sampler = Sampler::new(
        config.run.clone(),
        config.hamiltonian(),
        rbm,
        config.sampler,
        config.optimizer.clone(),
    )?;

    if config.run.verbose {
        println!("cycle   energy   variance   accepted");
    }
    let result = sampler.run()?;

    if let Some(energy) = result.final_energy() {
        println!("Final energy: {:.6}", energy);
    }
    println!("Final parameters: {:?}", result.final_params.as_slice());
    Ok(())
}

fn block(path: &Path) -> Result<()> {
    let samples = read_samples(path)?;
    let result = blocking(&samples).ok_or_else(|| {
        VmcError::InvalidParameter(format!("{} holds fewer than two samples", path.display()))
    })?;

    println!("Samples:                {}", result.n_samples);
    println!("Mean:                   {:.8}", result.mean);
    println!("Variance:               {:.8}", result.variance);
    println!("Naive error:            {:.8}", result.naive_error);
    println!("Blocking error:         {:.8}", result.error);
    println!("Autocorrelation time:   {:.2}", result.autocorrelation_time);
    println!();
    println!("block_size   n_blocks   error");
    for level in &result.levels {
        println!("{:10}   {:8}   {:.8}", level.block_size, level.n_blocks, level.error);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match &args.command {
        Command::Train { config } => train(config),
        Command::Block { input } => block(input),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
