use crate::model::Params;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model parameters.
    pub params: Params,
    /// Batch execution parameters.
    pub batch: BatchConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of independent runs per batch.
    pub n_runs: usize,
    /// Batch seed (drawn from the OS if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Run every simulation on the current thread.
    pub sequential: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            n_runs: 10,
            seed: None,
            sequential: false,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// Missing fields take their default values.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Write the [`Config`] to a new file.
    pub fn to_file<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        if file.exists() {
            bail!("{file:?} already exists");
        }
        let contents = toml::to_string(self).context("failed to serialize config")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_params(&self.params).context("invalid model parameters")?;
        check_num(self.batch.n_runs, 1..=1_000_000).context("invalid number of runs")?;
        Ok(())
    }
}

/// Check that the parameters describe a meaningful flock.
pub fn validate_params(params: &Params) -> Result<()> {
    check_positive(params.r0).context("invalid basic reproduction number")?;
    check_positive(params.infectious_duration).context("invalid infectious duration")?;
    check_num(params.mortality_rate, 0.0..=1.0).context("invalid mortality rate")?;
    check_num(params.external_introduction, 0.0..=1.0)
        .context("invalid external introduction probability")?;

    check_num(params.biosecurity_level, 0.0..=1.0).context("invalid biosecurity level")?;
    check_num(params.vaccination_rate, 0.0..=1.0).context("invalid vaccination rate")?;
    check_num(params.budget, 0.0..).context("invalid budget")?;

    check_num(params.total_population, 1..=100_000_000).context("invalid total population")?;
    let unvaccinated = params.total_population - params.vaccinated_count();
    check_num(params.initial_infectious, 0..=unvaccinated)
        .context("invalid initial number of infectious birds")?;
    check_num(params.simulation_days, 0..=100_000).context("invalid number of simulation days")?;

    Ok(())
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_positive(num: f64) -> Result<()> {
    if !(num > 0.0 && num.is_finite()) {
        bail!("number must be positive and finite, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str(
            "[params]\n\
             total_population = 5000\n\
             r0 = 2.5\n\
             \n\
             [batch]\n\
             seed = 7\n",
        )
        .unwrap();
        assert_eq!(config.params.total_population, 5000);
        assert_eq!(config.params.r0, 2.5);
        assert_eq!(config.params.mortality_rate, 0.95);
        assert_eq!(config.params.budget, 250_000.0);
        assert_eq!(config.batch.n_runs, 10);
        assert_eq!(config.batch.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_is_default_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn default_config_survives_serialization() {
        let contents = toml::to_string(&Config::default()).unwrap();
        let config: Config = toml::from_str(&contents).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = Config::default();
        config.params.mortality_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.params.infectious_duration = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.batch.n_runs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.params.total_population = 100;
        config.params.vaccination_rate = 0.5;
        config.params.initial_infectious = 51;
        assert!(config.validate().is_err());
    }

    #[test]
    fn error_chain_names_the_field() {
        let mut config = Config::default();
        config.params.vaccination_rate = -0.1;
        let err = config.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("invalid vaccination rate"), "{msg}");
    }
}
