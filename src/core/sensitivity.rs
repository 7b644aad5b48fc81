use rayon::prelude::*;
use serde::Serialize;

use super::engine::run_projection;
use super::types::{ProjectionInput, round_cents};

pub const TOP_LEVERS: usize = 3;

const RETURN_STEP: f64 = 0.01;
const INFLATION_STEP: f64 = 0.005;
const CONTRIBUTION_FACTOR: f64 = 1.10;
const EXPENSE_FACTOR: f64 = 0.90;
const HEALTHCARE_STEP: f64 = 1_000.0;

/// One assumption the household could plausibly move, with a fixed nudge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensitivityLever {
    ExpectedReturn,
    Inflation,
    RetirementAge,
    Contribution,
    Expenses,
    Healthcare,
}

impl SensitivityLever {
    pub const ALL: &'static [SensitivityLever] = &[
        SensitivityLever::ExpectedReturn,
        SensitivityLever::Inflation,
        SensitivityLever::RetirementAge,
        SensitivityLever::Contribution,
        SensitivityLever::Expenses,
        SensitivityLever::Healthcare,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SensitivityLever::ExpectedReturn => "Expected return +1%",
            SensitivityLever::Inflation => "Inflation -0.5%",
            SensitivityLever::RetirementAge => "Retire 1 year later",
            SensitivityLever::Contribution => "Contributions +10%",
            SensitivityLever::Expenses => "Expenses -10%",
            SensitivityLever::Healthcare => "Healthcare -$1,000/yr",
        }
    }

    /// The perturbed scenario, or `None` when this lever cannot move the
    /// given input.
    pub fn apply(self, input: &ProjectionInput) -> Option<ProjectionInput> {
        let mut next = input.clone();
        match self {
            SensitivityLever::ExpectedReturn => {
                next.expected_return += RETURN_STEP;
            }
            SensitivityLever::Inflation => {
                if input.inflation_rate <= 0.0 {
                    return None;
                }
                next.inflation_rate = (input.inflation_rate - INFLATION_STEP).max(0.0);
            }
            SensitivityLever::RetirementAge => {
                if input.current_age >= input.retirement_age
                    || input.retirement_age + 1 > input.max_age
                {
                    return None;
                }
                next.retirement_age += 1;
            }
            SensitivityLever::Contribution => {
                if input.annual_contribution <= 0.0 {
                    return None;
                }
                next.annual_contribution *= CONTRIBUTION_FACTOR;
            }
            SensitivityLever::Expenses => {
                if input.essential_expenses <= 0.0 && input.discretionary_expenses <= 0.0 {
                    return None;
                }
                next.essential_expenses *= EXPENSE_FACTOR;
                next.discretionary_expenses *= EXPENSE_FACTOR;
            }
            SensitivityLever::Healthcare => {
                if input.healthcare_costs <= 0.0 {
                    return None;
                }
                next.healthcare_costs = (input.healthcare_costs - HEALTHCARE_STEP).max(0.0);
            }
        }
        Some(next)
    }

    pub fn describe(self, before: &ProjectionInput, after: &ProjectionInput) -> String {
        match self {
            SensitivityLever::ExpectedReturn => format!(
                "Expected return from {} to {}",
                format_percent(before.expected_return),
                format_percent(after.expected_return)
            ),
            SensitivityLever::Inflation => format!(
                "Inflation from {} to {}",
                format_percent(before.inflation_rate),
                format_percent(after.inflation_rate)
            ),
            SensitivityLever::RetirementAge => format!(
                "Retirement age from {} to {}",
                before.retirement_age, after.retirement_age
            ),
            SensitivityLever::Contribution => format!(
                "Annual contribution from {} to {}",
                format_dollars(before.annual_contribution),
                format_dollars(after.annual_contribution)
            ),
            SensitivityLever::Expenses => format!(
                "Annual expenses from {} to {}",
                format_dollars(before.essential_expenses + before.discretionary_expenses),
                format_dollars(after.essential_expenses + after.discretionary_expenses)
            ),
            SensitivityLever::Healthcare => format!(
                "Healthcare costs from {} to {}",
                format_dollars(before.healthcare_costs),
                format_dollars(after.healthcare_costs)
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DepletionChange {
    NoChange,
    Improved,
    NowDepletes { age: u32 },
    /// Positive years means the money lasts longer.
    Shifted { years: i32 },
}

impl DepletionChange {
    pub fn between(baseline: Option<u32>, perturbed: Option<u32>) -> Self {
        match (baseline, perturbed) {
            (None, None) => DepletionChange::NoChange,
            (Some(_), None) => DepletionChange::Improved,
            (None, Some(age)) => DepletionChange::NowDepletes { age },
            (Some(before), Some(after)) if before == after => DepletionChange::NoChange,
            (Some(before), Some(after)) => DepletionChange::Shifted {
                years: after as i32 - before as i32,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityImpact {
    pub lever: SensitivityLever,
    pub label: &'static str,
    pub description: String,
    pub retirement_balance: f64,
    pub retirement_balance_delta: f64,
    pub ending_balance_delta: f64,
    pub depletion_age: Option<u32>,
    pub depletion_change: DepletionChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityReport {
    pub baseline_retirement_balance: f64,
    pub baseline_ending_balance: f64,
    pub baseline_depletion_age: Option<u32>,
    /// Largest absolute retirement-balance change first.
    pub impacts: Vec<SensitivityImpact>,
}

pub fn run_sensitivity_analysis(input: &ProjectionInput) -> SensitivityReport {
    let baseline = run_projection(input).summary;

    let mut impacts: Vec<SensitivityImpact> = SensitivityLever::ALL
        .par_iter()
        .filter_map(|&lever| {
            let perturbed = lever.apply(input)?;
            let summary = run_projection(&perturbed).summary;
            Some(SensitivityImpact {
                lever,
                label: lever.label(),
                description: lever.describe(input, &perturbed),
                retirement_balance: summary.projected_retirement_balance,
                retirement_balance_delta: round_cents(
                    summary.projected_retirement_balance - baseline.projected_retirement_balance,
                ),
                ending_balance_delta: round_cents(
                    summary.ending_balance - baseline.ending_balance,
                ),
                depletion_age: summary.depletion_age,
                depletion_change: DepletionChange::between(
                    baseline.depletion_age,
                    summary.depletion_age,
                ),
            })
        })
        .collect();

    // Stable: ties keep lever order.
    impacts.sort_by(|a, b| {
        b.retirement_balance_delta
            .abs()
            .total_cmp(&a.retirement_balance_delta.abs())
    });
    impacts.truncate(TOP_LEVERS);

    log::debug!(
        "sensitivity: {} levers ranked, top is {:?}",
        impacts.len(),
        impacts.first().map(|i| i.lever)
    );

    SensitivityReport {
        baseline_retirement_balance: baseline.projected_retirement_balance,
        baseline_ending_balance: baseline.ending_balance,
        baseline_depletion_age: baseline.depletion_age,
        impacts,
    }
}

/// Whole dollars with thousands separators, e.g. `$1,234,567`.
pub fn format_dollars(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
