use crate::model::Params;
use crate::montecarlo::{BatchOptions, DayRecord, run_batch};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::num::NonZeroUsize;

/// Number of runs when the host does not give one.
pub const DEFAULT_N_RUNS: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Parameter object sent by a host. Every field is optional and
/// unrecognized fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsPatch {
    pub r0: Option<f64>,
    pub infectious_duration: Option<f64>,
    pub mortality_rate: Option<f64>,
    pub external_introduction: Option<f64>,
    pub biosecurity_level: Option<f64>,
    pub vaccination_rate: Option<f64>,
    pub budget: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_population: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub initial_infectious: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub simulation_days: Option<usize>,
}

impl ParamsPatch {
    /// Override the fields present in the patch.
    pub fn apply(self, mut params: Params) -> Params {
        params.r0 = self.r0.unwrap_or(params.r0);
        params.infectious_duration = self.infectious_duration.unwrap_or(params.infectious_duration);
        params.mortality_rate = self.mortality_rate.unwrap_or(params.mortality_rate);
        params.external_introduction = self
            .external_introduction
            .unwrap_or(params.external_introduction);
        params.biosecurity_level = self.biosecurity_level.unwrap_or(params.biosecurity_level);
        params.vaccination_rate = self.vaccination_rate.unwrap_or(params.vaccination_rate);
        params.budget = self.budget.unwrap_or(params.budget);
        params.total_population = self.total_population.unwrap_or(params.total_population);
        params.initial_infectious = self.initial_infectious.unwrap_or(params.initial_infectious);
        params.simulation_days = self.simulation_days.unwrap_or(params.simulation_days);
        params
    }
}

/// Read a count given either as an integer or as a number, which is truncated.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(usize),
        Float(f64),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Int(val)) => Ok(Some(val)),
        Some(Count::Float(val)) if val.is_finite() && val >= 0.0 => Ok(Some(val as usize)),
        Some(Count::Float(val)) => Err(de::Error::custom(format!(
            "count must be non-negative and finite, but is {val}"
        ))),
    }
}

/// Parameters as reported to a host.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsView {
    pub r0: f64,
    pub infectious_duration: f64,
    pub mortality_rate: f64,
    pub external_introduction: f64,
    pub biosecurity_level: f64,
    pub vaccination_rate: f64,
    pub budget: f64,
    pub total_population: usize,
    pub initial_infectious: usize,
    pub simulation_days: usize,
}

impl From<&Params> for ParamsView {
    fn from(params: &Params) -> Self {
        Self {
            r0: params.r0,
            infectious_duration: params.infectious_duration,
            mortality_rate: params.mortality_rate,
            external_introduction: params.external_introduction,
            biosecurity_level: params.biosecurity_level,
            vaccination_rate: params.vaccination_rate,
            budget: params.budget,
            total_population: params.total_population,
            initial_infectious: params.initial_infectious,
            simulation_days: params.simulation_days,
        }
    }
}

/// Default parameter set in the host schema.
pub fn default_params() -> ParamsView {
    ParamsView::from(&Params::default())
}

/// Result of a host evaluation: the day records or an error object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Records(Vec<DayRecord>),
    Error { error: String },
}

/// Run a batch for a host and translate the outcome into a [`Response`].
pub fn evaluate(params: &Params, opts: BatchOptions) -> Response {
    match run_batch(params, opts) {
        Ok(batch) => Response::Records(batch.records),
        Err(err) => {
            log::warn!("{err}");
            Response::Error {
                error: err.to_string(),
            }
        }
    }
}
