use std::fmt;

use serde::Serialize;

use super::types::ValuationParams;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Perturbation {
    /// Percentage points added to WACC.
    Wacc(f64),
    /// Percentage points added to ROIC.
    Roic(f64),
    /// Multiplicative factor on NOPAT.
    Nopat(f64),
}

const VARIANTS: [(&str, Perturbation); 6] = [
    ("WACC −1pp", Perturbation::Wacc(-0.01)),
    ("WACC +1pp", Perturbation::Wacc(0.01)),
    ("ROIC −2pp", Perturbation::Roic(-0.02)),
    ("ROIC +2pp", Perturbation::Roic(0.02)),
    ("NOPAT −10%", Perturbation::Nopat(0.9)),
    ("NOPAT +10%", Perturbation::Nopat(1.1)),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    Solved,
    Infeasible,
    Unstable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityVariant {
    pub label: &'static str,
    pub g: Option<f64>,
    pub feasible: bool,
    pub status: VariantStatus,
}

impl fmt::Display for SensitivityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.g) {
            (VariantStatus::Solved, Some(g)) => write!(f, "{}: {:.2}%", self.label, g * 100.0),
            (VariantStatus::Unstable, _) => write!(f, "{}: unstable", self.label),
            _ => write!(f, "{}: infeasible", self.label),
        }
    }
}

/// Re-solves for `g` under each fixed perturbation, keeping EV at the base value.
///
/// Unlike the base solve, a variant is only unstable when its denominator is exactly
/// zero or non-finite.
pub fn run_sensitivity(ev: f64, params: &ValuationParams) -> Vec<SensitivityVariant> {
    VARIANTS
        .iter()
        .map(|&(label, perturbation)| {
            let (wacc, roic, nopat) = match perturbation {
                Perturbation::Wacc(pp) => (params.wacc + pp, params.roic, params.nopat),
                Perturbation::Roic(pp) => (params.wacc, params.roic + pp, params.nopat),
                Perturbation::Nopat(factor) => (params.wacc, params.roic, params.nopat * factor),
            };
            evaluate_variant(label, ev, wacc, roic, nopat)
        })
        .collect()
}

fn evaluate_variant(
    label: &'static str,
    ev: f64,
    wacc: f64,
    roic: f64,
    nopat: f64,
) -> SensitivityVariant {
    let denom = ev - nopat / roic;
    if denom == 0.0 || !denom.is_finite() {
        return SensitivityVariant {
            label,
            g: None,
            feasible: false,
            status: VariantStatus::Unstable,
        };
    }

    let g = (ev * wacc - nopat) / denom;
    if !(g < wacc) || !(g < roic) || !g.is_finite() {
        return SensitivityVariant {
            label,
            g: None,
            feasible: false,
            status: VariantStatus::Infeasible,
        };
    }

    SensitivityVariant {
        label,
        g: Some(g),
        feasible: true,
        status: VariantStatus::Solved,
    }
}
