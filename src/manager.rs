use crate::config::Config;
use crate::fluid::fluid_trajectory;
use crate::interface::Response;
use crate::montecarlo::{BatchOptions, BatchSummary, Finance, run_batch};
use anyhow::{Context, Result};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

/// Contents of a batch's `summary.json`.
#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    batch: &'a BatchSummary,
    finance: Option<&'a Finance>,
    /// Final dead count of the fluid limit, if the outbreak is seeded at day 0.
    fluid_final_dead: Option<f64>,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    /// Write a default configuration file into a new simulation directory.
    pub fn init<P: AsRef<Path>>(sim_dir: P) -> Result<()> {
        let sim_dir = sim_dir.as_ref();
        fs::create_dir_all(sim_dir).with_context(|| format!("failed to create {sim_dir:?}"))?;

        let config_file = sim_dir.join("config.toml");
        Config::default()
            .to_file(&config_file)
            .context("failed to write default config")?;
        log::info!("created {config_file:?}");

        Ok(())
    }

    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn run_batch(&self) -> Result<()> {
        let n_runs =
            NonZeroUsize::new(self.cfg.batch.n_runs).context("number of runs must be positive")?;
        let seed = match self.cfg.batch.seed {
            Some(seed) => seed,
            None => draw_seed().context("failed to draw batch seed")?,
        };
        let opts = BatchOptions {
            n_runs,
            seed,
            sequential: self.cfg.batch.sequential,
        };

        let batch = run_batch(&self.cfg.params, opts).context("failed to run batch")?;

        let batch_dirs = self.batch_dirs().context("failed to list batch dirs")?;
        let batch_dir = self.batch_dir(next_batch_idx(&batch_dirs));
        fs::create_dir(&batch_dir).with_context(|| format!("failed to create {batch_dir:?}"))?;
        log::info!("created {batch_dir:?}");

        let fluid_final_dead = (self.cfg.params.initial_infectious > 0)
            .then(|| fluid_trajectory(&self.cfg.params).last().map(|state| state.dead))
            .flatten();
        let summary = Summary {
            batch: &batch.summary,
            finance: batch.finance(),
            fluid_final_dead,
        };
        log::info!(
            "seed {seed}: final dead {:.1} ± {:.1}, peak infectious {:.1} on day {}",
            batch.summary.final_dead.mean,
            batch.summary.final_dead.std_dev,
            batch.summary.peak_infectious,
            batch.summary.peak_day
        );
        if let Some(finance) = batch.finance() {
            log::info!("{finance:?}");
        }

        write_json(batch_dir.join("summary.json"), &summary).context("failed to save summary")?;
        write_json(batch_dir.join("results.json"), &Response::Records(batch.records))
            .context("failed to save results")?;

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for batch_dir in self.batch_dirs().context("failed to list batch dirs")? {
            fs::remove_dir_all(&batch_dir)
                .with_context(|| format!("failed to remove {batch_dir:?}"))?;
            log::info!("removed {batch_dir:?}");
        }
        Ok(())
    }

    fn batch_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("batch-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let dirs = glob(pattern)
            .context("failed to glob batch dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(dirs)
    }

    fn batch_dir(&self, batch_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("batch-{batch_idx:04}"))
    }
}

/// Index following the highest existing batch index.
fn next_batch_idx(batch_dirs: &[PathBuf]) -> usize {
    batch_dirs
        .iter()
        .filter_map(|dir| dir.file_name()?.to_str()?.strip_prefix("batch-")?.parse::<usize>().ok())
        .max()
        .map_or(0, |batch_idx| batch_idx + 1)
}

/// Draw a fresh batch seed from the operating system.
pub fn draw_seed() -> Result<u64> {
    let mut rng = ChaCha12Rng::try_from_os_rng()?;
    Ok(rng.random())
}

fn write_json<P: AsRef<Path>, T: Serialize>(file: P, value: &T) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
