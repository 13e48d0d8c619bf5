use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_CURRENCY: &str = "€";

const BILLION: f64 = 1e9;

/// Raw text exactly as typed into the calculator form.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub currency: String,
    pub price: String,
    pub shares_outstanding_b: String,
    pub net_debt_b: String,
    pub wacc_pct: String,
    pub roic_pct: String,
    pub nopat_b: String,
}

/// User-supplied scalars for a single point-in-time evaluation.
///
/// Numeric fields are `None` when the user left them empty or typed something
/// that is not a finite number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSet {
    pub currency_label: String,
    pub price: Option<f64>,
    pub shares_outstanding_b: Option<f64>,
    pub net_debt_b: Option<f64>,
    pub wacc_pct: Option<f64>,
    pub roic_pct: Option<f64>,
    pub nopat_b: Option<f64>,
}

impl Default for InputSet {
    fn default() -> Self {
        Self {
            currency_label: DEFAULT_CURRENCY.to_string(),
            price: None,
            shares_outstanding_b: None,
            net_debt_b: None,
            wacc_pct: None,
            roic_pct: None,
            nopat_b: None,
        }
    }
}

impl InputSet {
    pub fn from_raw(raw: &RawInputs) -> Self {
        Self {
            currency_label: currency_or_default(&raw.currency),
            price: parse_number(&raw.price),
            shares_outstanding_b: parse_number(&raw.shares_outstanding_b),
            net_debt_b: parse_number(&raw.net_debt_b),
            wacc_pct: parse_number(&raw.wacc_pct),
            roic_pct: parse_number(&raw.roic_pct),
            nopat_b: parse_number(&raw.nopat_b),
        }
    }

    /// Converts the form units (billions, percentages) into absolute amounts and
    /// decimal rates, or explains why the calculator has nothing to show.
    pub fn validated(&self) -> Result<ValuationParams, EmptyReason> {
        let (
            Some(price),
            Some(shares_b),
            Some(net_debt_b),
            Some(wacc_pct),
            Some(roic_pct),
            Some(nopat_b),
        ) = (
            finite(self.price),
            finite(self.shares_outstanding_b),
            finite(self.net_debt_b),
            finite(self.wacc_pct),
            finite(self.roic_pct),
            finite(self.nopat_b),
        )
        else {
            return Err(EmptyReason::MissingInputs);
        };

        let params = ValuationParams {
            price,
            shares: shares_b * BILLION,
            net_debt: net_debt_b * BILLION,
            wacc: wacc_pct / 100.0,
            roic: roic_pct / 100.0,
            nopat: nopat_b * BILLION,
        };

        if !(params.shares > 0.0) {
            return Err(EmptyReason::NonPositiveShares);
        }
        if !(params.roic > 0.0) {
            return Err(EmptyReason::NonPositiveRoic);
        }
        if !(params.wacc > 0.0) {
            return Err(EmptyReason::NonPositiveWacc);
        }
        Ok(params)
    }
}

/// Validated inputs in absolute units: amounts in currency units, rates as decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationParams {
    pub price: f64,
    pub shares: f64,
    pub net_debt: f64,
    pub wacc: f64,
    pub roic: f64,
    pub nopat: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum EmptyReason {
    #[error("Fill inputs to see results.")]
    MissingInputs,
    #[error("Shares must be greater than zero.")]
    NonPositiveShares,
    #[error("ROIC must be greater than zero.")]
    NonPositiveRoic,
    #[error("WACC must be greater than zero.")]
    NonPositiveWacc,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveStatus {
    Infeasible,
    DeclinePriced,
    Feasible,
    Unstable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub g: Option<f64>,
    pub status: SolveStatus,
    pub note: String,
    pub reinvestment_rate: Option<f64>,
    pub payout_ratio: Option<f64>,
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn currency_or_default(raw: &str) -> String {
    if raw.is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        raw.to_string()
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(price: &str, shares: &str, net_debt: &str, wacc: &str, roic: &str, nopat: &str) -> RawInputs {
        RawInputs {
            currency: String::new(),
            price: price.to_string(),
            shares_outstanding_b: shares.to_string(),
            net_debt_b: net_debt.to_string(),
            wacc_pct: wacc.to_string(),
            roic_pct: roic.to_string(),
            nopat_b: nopat.to_string(),
        }
    }

    #[test]
    fn parse_number_treats_blank_and_garbage_as_absent() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
    }

    #[test]
    fn from_raw_defaults_currency_label() {
        let inputs = InputSet::from_raw(&raw("100", "1", "0", "8", "15", "5"));
        assert_eq!(inputs.currency_label, DEFAULT_CURRENCY);

        let mut dollars = raw("100", "1", "0", "8", "15", "5");
        dollars.currency = "$".to_string();
        assert_eq!(InputSet::from_raw(&dollars).currency_label, "$");
    }

    #[test]
    fn validated_scales_units() {
        let inputs = InputSet::from_raw(&raw("100", "1.5", "-2", "8", "15", "5"));
        let params = inputs.validated().expect("complete inputs");
        assert_eq!(params.price, 100.0);
        assert_eq!(params.shares, 1.5e9);
        assert_eq!(params.net_debt, -2e9);
        assert_eq!(params.wacc, 0.08);
        assert_eq!(params.roic, 0.15);
        assert_eq!(params.nopat, 5e9);
    }

    #[test]
    fn validated_reports_missing_inputs_first() {
        let inputs = InputSet::from_raw(&raw("100", "0", "", "8", "15", "5"));
        assert_eq!(inputs.validated(), Err(EmptyReason::MissingInputs));

        let mut injected = InputSet::from_raw(&raw("100", "1", "0", "8", "15", "5"));
        injected.price = Some(f64::NAN);
        assert_eq!(injected.validated(), Err(EmptyReason::MissingInputs));
    }

    #[test]
    fn validated_guards_run_in_order() {
        let inputs = InputSet::from_raw(&raw("100", "0", "0", "0", "0", "5"));
        assert_eq!(inputs.validated(), Err(EmptyReason::NonPositiveShares));

        let inputs = InputSet::from_raw(&raw("100", "1", "0", "0", "-1", "5"));
        assert_eq!(inputs.validated(), Err(EmptyReason::NonPositiveRoic));

        let inputs = InputSet::from_raw(&raw("100", "1", "0", "0", "15", "5"));
        assert_eq!(inputs.validated(), Err(EmptyReason::NonPositiveWacc));
    }

    #[test]
    fn empty_reason_messages_match_ui_copy() {
        assert_eq!(
            EmptyReason::NonPositiveShares.to_string(),
            "Shares must be greater than zero."
        );
        assert_eq!(
            EmptyReason::MissingInputs.to_string(),
            "Fill inputs to see results."
        );
    }
}
