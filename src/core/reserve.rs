use serde::Serialize;

/// Spending reduction applied to keep the portfolio above the reserve floor,
/// ordered from least to most severe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReserveStage {
    Unconstrained,
    ReducedDiscretionary,
    EssentialsOnly,
    FloorReached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservePolicyOutcome {
    pub stage: ReserveStage,
    pub withdrawal: f64,
    pub discretionary_reduction: f64,
    pub essential_shortfall: f64,
}

impl ReservePolicyOutcome {
    pub fn is_constrained(&self) -> bool {
        self.stage != ReserveStage::Unconstrained
    }

    pub fn unmet_total(&self) -> f64 {
        self.discretionary_reduction + self.essential_shortfall
    }
}

/// Decides how much of this year's essential and discretionary need (both
/// already net of income) can be withdrawn without dipping below
/// `reserve_floor`.
pub fn apply_reserve_floor(
    total_balance: f64,
    essential_need: f64,
    discretionary_need: f64,
    reserve_floor: f64,
) -> ReservePolicyOutcome {
    let essential_need = essential_need.max(0.0);
    let discretionary_need = discretionary_need.max(0.0);
    let available = (total_balance - reserve_floor).max(0.0);

    if available >= essential_need + discretionary_need {
        return ReservePolicyOutcome {
            stage: ReserveStage::Unconstrained,
            withdrawal: essential_need + discretionary_need,
            discretionary_reduction: 0.0,
            essential_shortfall: 0.0,
        };
    }

    if available >= essential_need {
        return ReservePolicyOutcome {
            stage: ReserveStage::ReducedDiscretionary,
            withdrawal: available,
            discretionary_reduction: discretionary_need - (available - essential_need),
            essential_shortfall: 0.0,
        };
    }

    if available > 0.0 {
        return ReservePolicyOutcome {
            stage: ReserveStage::EssentialsOnly,
            withdrawal: available,
            discretionary_reduction: discretionary_need,
            essential_shortfall: essential_need - available,
        };
    }

    ReservePolicyOutcome {
        stage: ReserveStage::FloorReached,
        withdrawal: 0.0,
        discretionary_reduction: discretionary_need,
        essential_shortfall: essential_need,
    }
}
