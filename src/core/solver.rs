use super::types::{SolveResult, SolveStatus, ValuationParams};

const KNIFE_EDGE_REL_EPS: f64 = 1e-6;

pub const NOTE_KNIFE_EDGE: &str = "Knife-edge: EV ≈ NOPAT/ROIC. Tiny tweaks swing results.";
pub const NOTE_SINGULARITY: &str = "Numerical singularity. Adjust ROIC, NOPAT, or EV.";
pub const NOTE_G_ABOVE_WACC: &str = "Infeasible: g ≥ WACC under your assumptions.";
pub const NOTE_G_ABOVE_ROIC: &str = "Infeasible: g ≥ ROIC implies >100% reinvestment of NOPAT.";

/// Outcome of inverting the value driver formula before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthSolution {
    KnifeEdge,
    Solved(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: SolveStatus,
    pub note: &'static str,
}

pub fn enterprise_value(price: f64, shares: f64, net_debt: f64) -> f64 {
    price * shares + net_debt
}

/// Value driver formula: `EV = NOPAT * (1 - g/ROIC) / (WACC - g)`.
pub fn value_driver_ev(nopat: f64, roic: f64, wacc: f64, g: f64) -> f64 {
    nopat * (1.0 - g / roic) / (wacc - g)
}

/// Solves `g = (EV * WACC - NOPAT) / (EV - NOPAT/ROIC)`.
///
/// The singularity test is relative to the size of `NOPAT/ROIC` so that rounding
/// noise near `EV == NOPAT/ROIC` is reported as a knife-edge instead of a huge `g`.
pub fn solve_growth(ev: f64, nopat: f64, roic: f64, wacc: f64) -> GrowthSolution {
    let capitalized = nopat / roic;
    let denom = ev - capitalized;
    let scale = capitalized.abs().max(1.0);
    if denom.abs() <= scale * KNIFE_EDGE_REL_EPS {
        return GrowthSolution::KnifeEdge;
    }
    GrowthSolution::Solved((ev * wacc - nopat) / denom)
}

/// Labels a solved growth rate. Infeasible causes are reported with priority
/// non-finite, then `g >= WACC`, then `g >= ROIC`.
pub fn classify_growth(g: f64, wacc: f64, roic: f64) -> Classification {
    if !g.is_finite() {
        return Classification {
            status: SolveStatus::Infeasible,
            note: NOTE_SINGULARITY,
        };
    }
    if !(g < wacc) {
        return Classification {
            status: SolveStatus::Infeasible,
            note: NOTE_G_ABOVE_WACC,
        };
    }
    if !(g < roic) {
        return Classification {
            status: SolveStatus::Infeasible,
            note: NOTE_G_ABOVE_ROIC,
        };
    }
    let status = if g < 0.0 {
        SolveStatus::DeclinePriced
    } else {
        SolveStatus::Feasible
    };
    Classification { status, note: "" }
}

pub fn solve(params: &ValuationParams) -> SolveResult {
    let ev = enterprise_value(params.price, params.shares, params.net_debt);
    match solve_growth(ev, params.nopat, params.roic, params.wacc) {
        GrowthSolution::KnifeEdge => SolveResult {
            g: None,
            status: SolveStatus::Unstable,
            note: NOTE_KNIFE_EDGE.to_string(),
            reinvestment_rate: None,
            payout_ratio: None,
        },
        GrowthSolution::Solved(g) => {
            let class = classify_growth(g, params.wacc, params.roic);
            if class.status == SolveStatus::Infeasible {
                return SolveResult {
                    g: None,
                    status: class.status,
                    note: class.note.to_string(),
                    reinvestment_rate: None,
                    payout_ratio: None,
                };
            }
            let reinvestment_rate = g / params.roic;
            SolveResult {
                g: Some(g),
                status: class.status,
                note: class.note.to_string(),
                reinvestment_rate: Some(reinvestment_rate),
                payout_ratio: Some(1.0 - reinvestment_rate),
            }
        }
    }
}
