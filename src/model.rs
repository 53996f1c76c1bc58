use serde::{Deserialize, Serialize};

/// SIRD model parameters.
///
/// Immutable for the duration of a batch. Missing fields in a configuration
/// file take the values of [`Params::default`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Basic reproduction number.
    pub r0: f64,
    /// Duration of the infectious period in days.
    pub infectious_duration: f64,
    /// Fraction of birds leaving the infectious compartment that die.
    pub mortality_rate: f64,
    /// Daily probability of an external introduction while no bird is infectious.
    pub external_introduction: f64,

    /// Biosecurity level (reduces external introduction).
    pub biosecurity_level: f64,
    /// Fraction of the flock vaccinated (moved to recovered) at day 0.
    pub vaccination_rate: f64,
    /// Available budget for biosecurity and vaccination.
    pub budget: f64,

    /// Total number of birds.
    pub total_population: usize,
    /// Number of infectious birds at day 0.
    pub initial_infectious: usize,
    /// Number of days to simulate.
    pub simulation_days: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            r0: 3.0,
            infectious_duration: 3.0,
            mortality_rate: 0.95,
            external_introduction: 0.20,
            biosecurity_level: 0.0,
            vaccination_rate: 0.0,
            budget: 250_000.0,
            total_population: 400_000,
            initial_infectious: 0,
            simulation_days: 100,
        }
    }
}

impl Params {
    /// Effective daily transmission rate.
    pub fn beta(&self) -> f64 {
        self.r0 / self.infectious_duration
    }

    /// Daily probability of an external introduction after biosecurity.
    pub fn effective_introduction(&self) -> f64 {
        self.external_introduction * (1.0 - self.biosecurity_level)
    }

    /// Number of birds vaccinated at day 0.
    pub fn vaccinated_count(&self) -> usize {
        let count = (self.total_population as f64 * self.vaccination_rate) as usize;
        count.min(self.total_population)
    }
}

/// Compartment counts of one run at a given day.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct State {
    pub day: usize,

    pub susceptible: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl State {
    /// Day 0 state: vaccinated birds start recovered, then the initial
    /// infectious birds are taken from the unvaccinated ones.
    pub fn initial(params: &Params) -> Self {
        let vaccinated = params.vaccinated_count();
        let unvaccinated = params.total_population - vaccinated;
        let infectious = params.initial_infectious.min(unvaccinated);
        Self {
            day: 0,
            susceptible: unvaccinated - infectious,
            infectious,
            recovered: vaccinated,
            dead: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.susceptible + self.infectious + self.recovered + self.dead
    }

    pub fn live(&self) -> usize {
        self.susceptible + self.recovered
    }
}
