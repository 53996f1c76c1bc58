use crate::model::{Params, State};
use crate::sampling::{binomial, poisson};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Single-run simulation engine.
///
/// Holds the parameters, current state, and random number generator,
/// and advances one stochastic trajectory day by day.
pub struct Engine<'a> {
    params: &'a Params,
    state: State,
    rng: ChaCha12Rng,
}

impl<'a> Engine<'a> {
    /// Create a new `Engine` at day 0.
    ///
    /// Runs of the same batch share `seed` and differ in `stream`, which gives
    /// each run an independent sequence of draws.
    pub fn new(params: &'a Params, seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self {
            params,
            state: State::initial(params),
            rng,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Perform the whole simulation and return the state of every day,
    /// starting with day 0.
    pub fn run_trajectory(mut self) -> Vec<State> {
        let mut trajectory = Vec::with_capacity(self.params.simulation_days + 1);
        trajectory.push(self.state);
        for _ in 0..self.params.simulation_days {
            self.perform_step();
            trajectory.push(self.state);
        }
        trajectory
    }

    /// Advance the state by one day.
    pub fn perform_step(&mut self) {
        if self.state.infectious == 0 {
            self.introduce_external();
        }

        let new_infections = self.sample_new_infections();
        let (new_recoveries, new_deaths) = self.sample_exits();

        let state = &mut self.state;
        state.susceptible -= new_infections;
        state.infectious = state.infectious + new_infections - new_recoveries - new_deaths;
        state.recovered += new_recoveries;
        state.dead += new_deaths;
        state.day += 1;
        debug_assert_eq!(state.total(), self.params.total_population);
    }

    fn introduce_external(&mut self) {
        // Draw even when no susceptible bird is left; the introduction is then a no-op.
        let draw: f64 = self.rng.random();
        if draw < self.params.effective_introduction() && self.state.susceptible > 0 {
            self.state.susceptible -= 1;
            self.state.infectious = 1;
            log::trace!("external introduction on day {}", self.state.day + 1);
        }
    }

    fn sample_new_infections(&mut self) -> usize {
        let State {
            susceptible,
            infectious,
            ..
        } = self.state;
        if infectious == 0 || susceptible == 0 {
            return 0;
        }
        let lambda = self.params.beta() * infectious as f64 * susceptible as f64
            / self.params.total_population as f64;
        poisson(&mut self.rng, lambda).min(susceptible)
    }

    /// Returns the number of recoveries and deaths.
    fn sample_exits(&mut self) -> (usize, usize) {
        let infectious = self.state.infectious;
        let expected_exits = infectious as f64 / self.params.infectious_duration;
        let exits = poisson(&mut self.rng, expected_exits).min(infectious);

        let deaths = binomial(&mut self.rng, exits, self.params.mortality_rate);
        (exits - deaths, deaths)
    }
}
