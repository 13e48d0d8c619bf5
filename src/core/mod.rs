mod engine;
mod permalink;
mod report;
mod sensitivity;
mod solver;
mod trial;
mod types;

pub use engine::{Evaluation, Valuation, evaluate};
pub use permalink::{
    FieldSpec, InputField, LinkSink, SCHEMA, ShareOutcome, decode_onto, encode, field_for_key,
    permalink_url, share_permalink,
};
pub use report::{Report, format_money, format_money_abbrev, format_percent};
pub use sensitivity::{SensitivityVariant, VariantStatus, run_sensitivity};
pub use solver::{
    Classification, GrowthSolution, classify_growth, enterprise_value, solve, solve_growth,
    value_driver_ev,
};
pub use trial::{TrialBounds, TrialPoint, implied_price, price_trial};
pub use types::{
    DEFAULT_CURRENCY, EmptyReason, InputSet, RawInputs, SolveResult, SolveStatus,
    ValuationParams, parse_number,
};
