use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford), mergeable across partial results.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    /// Combine with the values of another accumulator (Chan et al.).
    pub fn merge(mut self, other: Self) -> Self {
        if other.n_vals == 0 {
            return self;
        }
        if self.n_vals == 0 {
            return other;
        }
        let n_vals = self.n_vals + other.n_vals;
        let diff = other.mean - self.mean;
        let weight = self.n_vals as f64 * other.n_vals as f64 / n_vals as f64;

        self.mean += diff * other.n_vals as f64 / n_vals as f64;
        self.diff_2_sum += other.diff_2_sum + diff * diff * weight;
        self.n_vals = n_vals;
        self
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}
