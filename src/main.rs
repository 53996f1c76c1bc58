mod budget;
mod config;
mod engine;
mod fluid;
mod interface;
mod manager;
mod model;
mod montecarlo;
mod sampling;
mod stats;

use crate::interface::{DEFAULT_N_RUNS, ParamsPatch};
use crate::manager::{Manager, draw_seed};
use crate::model::Params;
use crate::montecarlo::BatchOptions;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::{self, Write},
    num::NonZeroUsize,
    path::PathBuf,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a default config.toml into a simulation directory.
    Init {
        #[arg(long)]
        sim_dir: PathBuf,
    },

    /// Run a batch with the simulation directory's config.
    Run {
        #[arg(long)]
        sim_dir: PathBuf,
    },

    /// Remove every batch of a simulation directory.
    Clean {
        #[arg(long)]
        sim_dir: PathBuf,
    },

    /// Print the default parameters as JSON.
    Defaults,

    /// Evaluate a JSON parameter object and print the day records as JSON.
    Eval {
        #[arg(long, default_value_t = DEFAULT_N_RUNS)]
        n_runs: NonZeroUsize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        sequential: bool,

        #[arg(default_value = "{}")]
        params: String,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    match args.command {
        Command::Init { sim_dir } => Manager::init(sim_dir)?,
        Command::Run { sim_dir } => {
            let mgr = Manager::new(sim_dir).context("failed to construct mgr")?;
            mgr.run_batch()?;
        }
        Command::Clean { sim_dir } => {
            let mgr = Manager::new(sim_dir).context("failed to construct mgr")?;
            mgr.clean_sim()?;
        }
        Command::Defaults => print_json(&interface::default_params())?,
        Command::Eval {
            n_runs,
            seed,
            sequential,
            params,
        } => {
            let patch: ParamsPatch =
                serde_json::from_str(&params).context("failed to parse parameter object")?;
            let params = patch.apply(Params::default());
            config::validate_params(&params).context("invalid parameter object")?;

            let seed = match seed {
                Some(seed) => seed,
                None => draw_seed().context("failed to draw batch seed")?,
            };
            let opts = BatchOptions {
                n_runs,
                seed,
                sequential,
            };
            print_json(&interface::evaluate(&params, opts))?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).context("failed to serialize output")?;
    writeln!(stdout).context("failed to write output")?;
    Ok(())
}
