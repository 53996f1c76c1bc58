use crate::model::Params;
use serde::Serialize;

#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
pub struct FluidState {
    pub day: usize,

    pub susceptible: f64,
    pub infectious: f64,
    pub recovered: f64,
    pub dead: f64,
}

/// Deterministic fluid limit of the day map of [`crate::engine::Engine`].
///
/// Every random draw is replaced by its expected value. External introduction
/// is not modeled, so only outbreaks seeded at day 0 are described.
pub fn fluid_trajectory(params: &Params) -> Vec<FluidState> {
    let vaccinated = params.vaccinated_count() as f64;
    let unvaccinated = params.total_population as f64 - vaccinated;
    let infectious = (params.initial_infectious as f64).min(unvaccinated);

    let mut state = FluidState {
        day: 0,
        susceptible: unvaccinated - infectious,
        infectious,
        recovered: vaccinated,
        dead: 0.0,
    };
    let n_pop = params.total_population as f64;
    let beta = params.beta();

    let mut trajectory = Vec::with_capacity(params.simulation_days + 1);
    trajectory.push(state);
    for _ in 0..params.simulation_days {
        let new_infections =
            (beta * state.infectious * state.susceptible / n_pop).min(state.susceptible);
        let exits = (state.infectious / params.infectious_duration).min(state.infectious);
        let deaths = exits * params.mortality_rate;

        state = FluidState {
            day: state.day + 1,
            susceptible: state.susceptible - new_infections,
            infectious: state.infectious + new_infections - exits,
            recovered: state.recovered + exits - deaths,
            dead: state.dead + deaths,
        };
        trajectory.push(state);
    }
    trajectory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conserves_population() {
        let params = Params {
            total_population: 5000,
            initial_infectious: 5,
            vaccination_rate: 0.2,
            ..Params::default()
        };
        let trajectory = fluid_trajectory(&params);
        assert_eq!(trajectory.len(), params.simulation_days + 1);
        for state in &trajectory {
            let total = state.susceptible + state.infectious + state.recovered + state.dead;
            assert!((total - 5000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn without_initial_infection_nothing_happens() {
        let trajectory = fluid_trajectory(&Params::default());
        let last = trajectory.last().unwrap();
        assert_eq!(last.infectious, 0.0);
        assert_eq!(last.dead, 0.0);
    }

    #[test]
    fn supercritical_outbreak_reaches_most_of_the_flock() {
        let params = Params {
            total_population: 1000,
            initial_infectious: 10,
            mortality_rate: 1.0,
            ..Params::default()
        };
        let last = *fluid_trajectory(&params).last().unwrap();
        // Final size of an R0 = 3 epidemic is about 94% of the flock.
        assert!(last.dead > 900.0 && last.dead < 1000.0, "dead = {}", last.dead);
        assert!(last.infectious < 1e-3);
    }
}
