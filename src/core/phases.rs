use super::types::{SpendingPhase, SpendingPhaseConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAdjustedExpenses<'a> {
    pub essential: f64,
    pub discretionary: f64,
    pub active_phase: Option<&'a SpendingPhase>,
}

/// The phase with the latest start age not after `age`. Duplicate start ages
/// resolve to the first one in input order.
pub fn active_phase(config: Option<&SpendingPhaseConfig>, age: u32) -> Option<&SpendingPhase> {
    let config = config.filter(|c| c.enabled)?;
    config
        .phases
        .iter()
        .filter(|p| p.start_age <= age)
        .fold(None, |best: Option<&SpendingPhase>, phase| match best {
            Some(current) if current.start_age >= phase.start_age => Some(current),
            _ => Some(phase),
        })
}

pub fn calculate_phase_adjusted_expenses(
    age: u32,
    base_essential: f64,
    base_discretionary: f64,
    config: Option<&SpendingPhaseConfig>,
) -> PhaseAdjustedExpenses<'_> {
    let Some(phase) = active_phase(config, age) else {
        return PhaseAdjustedExpenses {
            essential: base_essential,
            discretionary: base_discretionary,
            active_phase: None,
        };
    };

    PhaseAdjustedExpenses {
        essential: phase
            .essential_override
            .unwrap_or(base_essential * phase.essential_multiplier),
        discretionary: phase
            .discretionary_override
            .unwrap_or(base_discretionary * phase.discretionary_multiplier),
        active_phase: Some(phase),
    }
}

impl SpendingPhaseConfig {
    /// Conventional three-stage retirement: active early years, a slower
    /// middle decade, then a mostly home-based late stage.
    pub fn go_go_slow_go_no_go(retirement_age: u32) -> Self {
        let phase = |id: &str, name: &str, offset: u32, essential: f64, discretionary: f64| {
            SpendingPhase {
                id: id.to_string(),
                name: name.to_string(),
                start_age: retirement_age + offset,
                essential_multiplier: essential,
                discretionary_multiplier: discretionary,
                essential_override: None,
                discretionary_override: None,
            }
        };

        Self {
            enabled: true,
            phases: vec![
                phase("go-go", "Go-Go", 0, 1.0, 1.2),
                phase("slow-go", "Slow-Go", 10, 1.0, 0.8),
                phase("no-go", "No-Go", 20, 1.0, 0.5),
            ],
        }
    }
}
