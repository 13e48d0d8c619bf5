use std::fmt;

use serde::Serialize;

use super::engine::{Evaluation, Valuation};
use super::types::SolveStatus;

pub const PLACEHOLDER: &str = "—";
pub const INFEASIBLE_TRIAL: &str = "Infeasible g";

/// Display strings for every output field of the calculator page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub implied_growth: String,
    pub badge: &'static str,
    pub badge_label: &'static str,
    pub enterprise_value: String,
    pub reinvestment_rate: String,
    pub payout_ratio: String,
    pub sensitivity: Vec<String>,
    pub note: String,
    pub trial_growth: String,
    pub trial_price: String,
}

impl Report {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        match evaluation {
            Evaluation::Empty { reason } => Self {
                implied_growth: PLACEHOLDER.to_string(),
                badge: "none",
                badge_label: PLACEHOLDER,
                enterprise_value: PLACEHOLDER.to_string(),
                reinvestment_rate: PLACEHOLDER.to_string(),
                payout_ratio: PLACEHOLDER.to_string(),
                sensitivity: Vec::new(),
                note: reason.to_string(),
                trial_growth: PLACEHOLDER.to_string(),
                trial_price: PLACEHOLDER.to_string(),
            },
            Evaluation::Computed(valuation) => Self::from_valuation(valuation),
        }
    }

    fn from_valuation(valuation: &Valuation) -> Self {
        let symbol = valuation.currency_label.as_str();
        let solve = &valuation.solve;
        let (badge, badge_label) = badge_for(solve.status);
        Self {
            implied_growth: format_percent(solve.g),
            badge,
            badge_label,
            enterprise_value: format_money_abbrev(symbol, valuation.enterprise_value),
            reinvestment_rate: format_percent(solve.reinvestment_rate),
            payout_ratio: format_percent(solve.payout_ratio),
            sensitivity: valuation
                .sensitivity
                .iter()
                .map(|variant| variant.to_string())
                .collect(),
            note: solve.note.clone(),
            trial_growth: format_percent(Some(valuation.trial.g_selected)),
            trial_price: match valuation.trial.implied_price {
                Some(price) => format_money(symbol, price),
                None => INFEASIBLE_TRIAL.to_string(),
            },
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Implied growth:    {} [{}]", self.implied_growth, self.badge_label)?;
        writeln!(f, "Enterprise value:  {}", self.enterprise_value)?;
        writeln!(f, "Reinvestment rate: {}", self.reinvestment_rate)?;
        writeln!(f, "Payout ratio:      {}", self.payout_ratio)?;
        if !self.sensitivity.is_empty() {
            writeln!(f, "Sensitivity:")?;
            for chip in &self.sensitivity {
                writeln!(f, "  {chip}")?;
            }
        }
        if !self.note.is_empty() {
            writeln!(f, "Note: {}", self.note)?;
        }
        write!(f, "Price at g = {}: {}", self.trial_growth, self.trial_price)
    }
}

fn badge_for(status: SolveStatus) -> (&'static str, &'static str) {
    match status {
        SolveStatus::Feasible => ("feasible", "Feasible"),
        SolveStatus::DeclinePriced => ("decline", "Decline priced"),
        SolveStatus::Infeasible => ("infeasible", "Infeasible"),
        SolveStatus::Unstable => ("unstable", "Unstable"),
    }
}

/// Formats a decimal rate as a percentage with two decimals, or a dash.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Currency amount with thousands separators and at most two decimals.
pub fn format_money(symbol: &str, value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}", format_grouped(value.abs()))
}

const UNITS: [(&str, f64); 4] = [("T", 1e12), ("B", 1e9), ("M", 1e6), ("K", 1e3)];

/// Currency amount scaled to the nearest T/B/M/K unit, e.g. `€1.25B`.
///
/// The unit is picked after rounding to two decimals, so `999_999.999` reads `€1M`.
pub fn format_money_abbrev(symbol: &str, value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let abs = value.abs();
    let (unit, divisor) = UNITS
        .iter()
        .copied()
        .find(|&(_, divisor)| round_cents(abs / divisor) >= 1.0)
        .unwrap_or(("", 1.0));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}{unit}", format_grouped(abs / divisor))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn format_grouped(abs: f64) -> String {
    let fixed = format!("{abs:.2}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if fraction.is_empty() {
        grouped
    } else {
        format!("{grouped}.{fraction}")
    }
}
