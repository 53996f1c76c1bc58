use crate::model::Params;
use serde::Serialize;
use thiserror::Error;

/// Cost of a full unit of biosecurity level.
pub const BIOSECURITY_UNIT_COST: f64 = 100_000.0;
/// Cost of vaccinating one bird.
pub const VACCINATION_COST_PER_BIRD: f64 = 1.0;
/// Sale price of one live bird at the end of the horizon.
pub const SALE_PRICE_PER_BIRD: f64 = 3.0;

#[derive(Error, Debug, PartialEq)]
pub enum BudgetError {
    #[error("total cost ({cost:.2}) exceeds budget ({budget:.2})")]
    BudgetExceeded { cost: f64, budget: f64 },
}

/// Requested spend on each intervention.
#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
pub struct Costs {
    pub biosecurity: f64,
    pub vaccination: f64,
}

impl Costs {
    pub fn new(params: &Params) -> Self {
        Self {
            biosecurity: params.biosecurity_level * BIOSECURITY_UNIT_COST,
            vaccination: params.vaccination_rate
                * params.total_population as f64
                * VACCINATION_COST_PER_BIRD,
        }
    }

    pub fn total(&self) -> f64 {
        self.biosecurity + self.vaccination
    }
}

/// Check the requested spend against the available budget.
///
/// # Errors
/// Returns [`BudgetError::BudgetExceeded`] if the total cost is strictly
/// greater than the budget.
pub fn validate_budget(params: &Params) -> Result<Costs, BudgetError> {
    let costs = Costs::new(params);
    let cost = costs.total();
    if cost > params.budget {
        return Err(BudgetError::BudgetExceeded {
            cost,
            budget: params.budget,
        });
    }
    Ok(costs)
}
