use serde::Serialize;

use super::types::ValuationParams;

/// Lowest growth rate the trial control offers.
pub const TRIAL_GROWTH_FLOOR: f64 = -0.05;
/// Gap kept below `min(WACC, ROIC)` so the control never lands on the singular boundary.
pub const TRIAL_CEILING_MARGIN: f64 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBounds {
    pub lower: f64,
    pub upper: f64,
}

impl TrialBounds {
    pub fn for_rates(wacc: f64, roic: f64) -> Self {
        let ceiling = wacc.min(roic) - TRIAL_CEILING_MARGIN;
        Self {
            lower: TRIAL_GROWTH_FLOOR,
            upper: TRIAL_GROWTH_FLOOR.max(ceiling),
        }
    }

    /// Non-finite requests fall back to zero growth before clamping.
    pub fn clamp(&self, g: f64) -> f64 {
        let g = if g.is_finite() { g } else { 0.0 };
        g.max(self.lower).min(self.upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialPoint {
    pub g_selected: f64,
    pub implied_price: Option<f64>,
}

/// Price per share the value driver formula justifies at growth `g`:
/// `(NOPAT * (1 - g/ROIC) / (WACC - g) - net debt) / shares`.
///
/// Returns `None` ("Infeasible g") unless shares are positive, both rates are
/// non-zero and `g` sits strictly below WACC and ROIC.
pub fn implied_price(params: &ValuationParams, g: f64) -> Option<f64> {
    let ValuationParams {
        shares,
        net_debt,
        wacc,
        roic,
        nopat,
        ..
    } = *params;

    let valid = shares.is_finite()
        && shares > 0.0
        && roic.is_finite()
        && roic != 0.0
        && wacc.is_finite()
        && wacc != 0.0;
    if !valid || !(g < wacc) || !(g < roic) {
        return None;
    }

    let ev = nopat * (1.0 - g / roic) / (wacc - g);
    Some((ev - net_debt) / shares).filter(|price| price.is_finite())
}

/// Clamps the requested growth rate into the trial range and prices it.
pub fn price_trial(params: &ValuationParams, requested_g: f64) -> (TrialBounds, TrialPoint) {
    let bounds = TrialBounds::for_rates(params.wacc, params.roic);
    let g_selected = bounds.clamp(requested_g);
    let point = TrialPoint {
        g_selected,
        implied_price: implied_price(params, g_selected),
    };
    (bounds, point)
}
