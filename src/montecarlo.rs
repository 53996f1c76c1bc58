use crate::budget::{BudgetError, Costs, SALE_PRICE_PER_BIRD, validate_budget};
use crate::engine::Engine;
use crate::model::{Params, State};
use crate::stats::{Accumulator, AccumulatorReport};
use rayon::prelude::*;
use serde::Serialize;
use std::num::NonZeroUsize;

/// Across-run means of one day.
///
/// Only the terminal record carries the financial summary.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct DayRecord {
    pub day: usize,

    pub susceptible: f64,
    pub infectious: f64,
    pub recovered: f64,
    pub dead: f64,

    #[serde(flatten)]
    pub finance: Option<Finance>,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finance {
    pub profit: f64,
    pub costs: f64,
    pub net_profit: f64,
}

impl Finance {
    fn new(final_record: &DayRecord, costs: &Costs, budget: f64) -> Self {
        let total_live_birds = final_record.susceptible + final_record.recovered;
        let profit = total_live_birds * SALE_PRICE_PER_BIRD;
        let cost = costs.total();
        let remaining_budget = budget - cost;
        Self {
            profit,
            costs: cost,
            net_profit: profit - cost + remaining_budget,
        }
    }
}

/// Dispersion of the final outcome across runs.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub seed: u64,
    pub n_runs: usize,

    pub final_dead: AccumulatorReport,
    pub final_live: AccumulatorReport,

    pub peak_infectious: f64,
    pub peak_day: usize,
}

#[derive(Debug)]
pub struct Batch {
    pub records: Vec<DayRecord>,
    pub summary: BatchSummary,
}

impl Batch {
    pub fn finance(&self) -> Option<&Finance> {
        self.records.last().and_then(|record| record.finance.as_ref())
    }
}

/// Options controlling how a batch is executed.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub n_runs: NonZeroUsize,
    pub seed: u64,
    /// Run on the current thread instead of the rayon pool.
    pub sequential: bool,
}

/// Per-day compartment sums of a set of runs.
#[derive(Debug, Clone)]
struct Totals {
    sums: Vec<[u64; 4]>,
    final_dead: Accumulator,
    final_live: Accumulator,
}

impl Totals {
    fn new(n_days: usize) -> Self {
        Self {
            sums: vec![[0; 4]; n_days],
            final_dead: Accumulator::new(),
            final_live: Accumulator::new(),
        }
    }

    fn add(mut self, trajectory: Vec<State>) -> Self {
        for (sum, state) in self.sums.iter_mut().zip(&trajectory) {
            sum[0] += state.susceptible as u64;
            sum[1] += state.infectious as u64;
            sum[2] += state.recovered as u64;
            sum[3] += state.dead as u64;
        }
        if let Some(last) = trajectory.last() {
            self.final_dead.add(last.dead as f64);
            self.final_live.add(last.live() as f64);
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        for (sum, other_sum) in self.sums.iter_mut().zip(&other.sums) {
            for (val, other_val) in sum.iter_mut().zip(other_sum) {
                *val += other_val;
            }
        }
        self.final_dead = self.final_dead.merge(other.final_dead);
        self.final_live = self.final_live.merge(other.final_live);
        self
    }

    fn into_records(self, n_runs: usize) -> Vec<DayRecord> {
        let n_runs = n_runs as f64;
        self.sums
            .iter()
            .enumerate()
            .map(|(day, sum)| DayRecord {
                day,
                susceptible: sum[0] as f64 / n_runs,
                infectious: sum[1] as f64 / n_runs,
                recovered: sum[2] as f64 / n_runs,
                dead: sum[3] as f64 / n_runs,
                finance: None,
            })
            .collect()
    }
}

/// Run a batch of independent simulations and average them day by day.
///
/// Run `i` draws from stream `i` of the batch seed, so the result does not
/// depend on how runs are scheduled.
///
/// # Errors
/// Returns [`BudgetError::BudgetExceeded`] before running anything if the
/// interventions cost more than the budget.
pub fn run_batch(params: &Params, opts: BatchOptions) -> Result<Batch, BudgetError> {
    let costs = validate_budget(params)?;

    let n_runs = opts.n_runs.get();
    let n_days = params.simulation_days + 1;
    log::debug!(
        "running {n_runs} runs of {} days (seed {})",
        params.simulation_days,
        opts.seed
    );

    let trajectory =
        |run_idx: usize| Engine::new(params, opts.seed, run_idx as u64).run_trajectory();
    let totals = if opts.sequential {
        (0..n_runs)
            .map(trajectory)
            .fold(Totals::new(n_days), Totals::add)
    } else {
        (0..n_runs)
            .into_par_iter()
            .map(trajectory)
            .fold(|| Totals::new(n_days), Totals::add)
            .reduce(|| Totals::new(n_days), Totals::merge)
    };

    let final_dead = totals.final_dead.report();
    let final_live = totals.final_live.report();
    let mut records = totals.into_records(n_runs);

    let (peak_day, peak_infectious) = records
        .iter()
        .map(|record| (record.day, record.infectious))
        .fold((0, 0.0), |peak, cur| if cur.1 > peak.1 { cur } else { peak });

    if let Some(last) = records.last_mut() {
        let finance = Finance::new(last, &costs, params.budget);
        last.finance = Some(finance);
    }

    let summary = BatchSummary {
        seed: opts.seed,
        n_runs,
        final_dead,
        final_live,
        peak_infectious,
        peak_day,
    };

    Ok(Batch { records, summary })
}
