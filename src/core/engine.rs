use serde::Serialize;

use super::sensitivity::{SensitivityVariant, run_sensitivity};
use super::solver::{enterprise_value, solve};
use super::trial::{TrialBounds, TrialPoint, price_trial};
use super::types::{EmptyReason, InputSet, SolveResult};

/// Everything the calculator shows for one set of inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub currency_label: String,
    pub enterprise_value: f64,
    pub solve: SolveResult,
    pub sensitivity: Vec<SensitivityVariant>,
    pub trial_bounds: TrialBounds,
    pub trial: TrialPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Empty { reason: EmptyReason },
    Computed(Valuation),
}

impl Evaluation {
    pub fn valuation(&self) -> Option<&Valuation> {
        match self {
            Evaluation::Empty { .. } => None,
            Evaluation::Computed(valuation) => Some(valuation),
        }
    }
}

/// Runs the whole pipeline from scratch. `trial_growth` is a decimal rate and is
/// clamped into the trial range before pricing.
pub fn evaluate(inputs: &InputSet, trial_growth: f64) -> Evaluation {
    let params = match inputs.validated() {
        Ok(params) => params,
        Err(reason) => return Evaluation::Empty { reason },
    };

    let ev = enterprise_value(params.price, params.shares, params.net_debt);
    let solve = solve(&params);
    let sensitivity = run_sensitivity(ev, &params);
    let (trial_bounds, trial) = price_trial(&params, trial_growth);

    Evaluation::Computed(Valuation {
        currency_label: inputs.currency_label.clone(),
        enterprise_value: ev,
        solve,
        sensitivity,
        trial_bounds,
        trial,
    })
}
