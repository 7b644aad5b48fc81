use serde::Serialize;

use super::engine::run_projection;
use super::types::{ProjectionInput, ProjectionResult, round_cents};

pub const DEFAULT_EARLY_YEARS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonYear {
    pub age: u32,
    pub flat_spending: f64,
    pub phased_spending: f64,
    pub difference: f64,
    pub cumulative_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingComparison {
    pub total_flat_spending: f64,
    pub total_phased_spending: f64,
    pub early_years: u32,
    /// Phased minus flat spending over the first `early_years` retirement years.
    pub early_years_bonus: f64,
    pub break_even_age: Option<u32>,
    pub flat_depletion_age: Option<u32>,
    pub phased_depletion_age: Option<u32>,
    /// Positive when the phased plan lasts longer.
    pub longevity_difference: i32,
    pub flat_ending_balance: f64,
    pub phased_ending_balance: f64,
    pub years: Vec<ComparisonYear>,
}

/// Runs the scenario with spending phases stripped and as given, then
/// compares planned retirement spending year by year.
pub fn calculate_spending_comparison(
    input: &ProjectionInput,
    early_years: u32,
) -> SpendingComparison {
    let flat_input = ProjectionInput {
        spending_phase_config: None,
        ..input.clone()
    };
    let (flat, phased) = rayon::join(|| run_projection(&flat_input), || run_projection(input));

    let years = yearly_rows(&flat, &phased);
    let total_flat_spending = years.iter().map(|y| y.flat_spending).sum::<f64>();
    let total_phased_spending = years.iter().map(|y| y.phased_spending).sum::<f64>();
    let early_years_bonus = years
        .iter()
        .take(early_years as usize)
        .map(|y| y.difference)
        .sum::<f64>();

    SpendingComparison {
        total_flat_spending: round_cents(total_flat_spending),
        total_phased_spending: round_cents(total_phased_spending),
        early_years,
        early_years_bonus: round_cents(early_years_bonus),
        break_even_age: break_even_age(&years),
        flat_depletion_age: flat.summary.depletion_age,
        phased_depletion_age: phased.summary.depletion_age,
        longevity_difference: longevity_difference(
            flat.summary.depletion_age,
            phased.summary.depletion_age,
            input.max_age,
        ),
        flat_ending_balance: flat.summary.ending_balance,
        phased_ending_balance: phased.summary.ending_balance,
        years,
    }
}

fn yearly_rows(flat: &ProjectionResult, phased: &ProjectionResult) -> Vec<ComparisonYear> {
    let mut cumulative_cents: i64 = 0;
    flat.drawdown_records()
        .zip(phased.drawdown_records())
        .map(|(f, p)| {
            let difference = round_cents(p.expenses.total - f.expenses.total);
            cumulative_cents += to_cents(difference);
            ComparisonYear {
                age: f.age,
                flat_spending: f.expenses.total,
                phased_spending: p.expenses.total,
                difference,
                cumulative_difference: cumulative_cents as f64 / 100.0,
            }
        })
        .collect()
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// First age at which the running phased-minus-flat difference returns to
/// zero or crosses it, after having moved away from zero. Sums are kept in
/// whole cents so the answer does not depend on float drift.
fn break_even_age(years: &[ComparisonYear]) -> Option<u32> {
    let mut sign = 0_i64;
    for year in years {
        let cumulative = to_cents(year.cumulative_difference);
        if sign == 0 {
            sign = cumulative.signum();
        } else if sign * cumulative <= 0 {
            return Some(year.age);
        }
    }
    None
}

fn longevity_difference(flat: Option<u32>, phased: Option<u32>, max_age: u32) -> i32 {
    match (flat, phased) {
        (Some(f), Some(p)) => p as i32 - f as i32,
        (Some(f), None) => max_age as i32 - f as i32,
        (None, Some(p)) => p as i32 - max_age as i32,
        (None, None) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BalanceByType, ContributionAllocation, SpendingPhaseConfig};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_input() -> ProjectionInput {
        ProjectionInput {
            current_age: 60,
            retirement_age: 65,
            max_age: 95,
            current_balances: BalanceByType::new(900_000.0, 200_000.0, 200_000.0),
            annual_contribution: 10_000.0,
            contribution_allocation: ContributionAllocation::default(),
            expected_return: 0.05,
            inflation_rate: 0.0,
            healthcare_inflation_rate: 0.0,
            contribution_growth_rate: 0.0,
            essential_expenses: 40_000.0,
            discretionary_expenses: 15_000.0,
            healthcare_costs: 5_000.0,
            income_streams: Vec::new(),
            annual_debt_payments: 0.0,
            spending_phase_config: None,
            rmd_config: None,
            reserve_floor: None,
        }
    }

    #[test]
    fn no_phases_means_identical_runs() {
        let cmp = calculate_spending_comparison(&sample_input(), DEFAULT_EARLY_YEARS);
        assert_approx(cmp.total_flat_spending, cmp.total_phased_spending);
        assert_approx(cmp.early_years_bonus, 0.0);
        assert_eq!(cmp.break_even_age, None);
        assert_eq!(cmp.longevity_difference, 0);
        assert_approx(cmp.flat_ending_balance, cmp.phased_ending_balance);
        assert_eq!(cmp.years.len(), 31);
    }

    #[test]
    fn disabled_phases_match_flat() {
        let mut input = sample_input();
        let mut config = SpendingPhaseConfig::go_go_slow_go_no_go(65);
        config.enabled = false;
        input.spending_phase_config = Some(config);
        let cmp = calculate_spending_comparison(&input, DEFAULT_EARLY_YEARS);
        assert_approx(cmp.early_years_bonus, 0.0);
        assert_eq!(cmp.break_even_age, None);
    }

    #[test]
    fn go_go_years_front_load_spending_and_break_even_after_slow_go() {
        let mut input = sample_input();
        input.spending_phase_config = Some(SpendingPhaseConfig::go_go_slow_go_no_go(65));
        let cmp = calculate_spending_comparison(&input, DEFAULT_EARLY_YEARS);

        // +3k for ten go-go years, then -3k per slow-go year.
        assert_approx(cmp.early_years_bonus, 30_000.0);
        assert_eq!(cmp.break_even_age, Some(84));
        assert_approx(cmp.years[9].cumulative_difference, 30_000.0);
        assert!(cmp.total_phased_spending < cmp.total_flat_spending);

        let short = calculate_spending_comparison(&input, 5);
        assert_approx(short.early_years_bonus, 15_000.0);
    }

    #[test]
    fn early_years_beyond_horizon_sum_everything() {
        let mut input = sample_input();
        input.spending_phase_config = Some(SpendingPhaseConfig::go_go_slow_go_no_go(65));
        let cmp = calculate_spending_comparison(&input, 100);
        assert_approx(
            cmp.early_years_bonus,
            cmp.total_phased_spending - cmp.total_flat_spending,
        );
    }

    #[test]
    fn longevity_uses_horizon_when_one_side_lasts() {
        assert_eq!(longevity_difference(Some(80), Some(83), 95), 3);
        assert_eq!(longevity_difference(Some(80), None, 95), 15);
        assert_eq!(longevity_difference(None, Some(90), 95), -5);
        assert_eq!(longevity_difference(None, None, 95), 0);
    }

    #[test]
    fn break_even_requires_a_crossing() {
        let row = |age: u32, cumulative: f64| ComparisonYear {
            age,
            flat_spending: 0.0,
            phased_spending: 0.0,
            difference: 0.0,
            cumulative_difference: cumulative,
        };
        let never = [row(65, 0.0), row(66, 100.0), row(67, 50.0)];
        assert_eq!(break_even_age(&never), None);

        let crosses = [row(65, -200.0), row(66, -10.0), row(67, 5.0)];
        assert_eq!(break_even_age(&crosses), Some(67));

        let touches = [row(65, 10.0), row(66, 0.0)];
        assert_eq!(break_even_age(&touches), Some(66));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(16))]

        #[test]
        fn prop_rows_cover_retirement_and_totals_agree(
            retirement_age in 60_u32..75,
            inflation in 0.0_f64..0.05,
            early_years in 0_u32..40,
        ) {
            let mut input = sample_input();
            input.retirement_age = retirement_age;
            input.inflation_rate = inflation;
            input.spending_phase_config =
                Some(SpendingPhaseConfig::go_go_slow_go_no_go(retirement_age));
            let cmp = calculate_spending_comparison(&input, early_years);

            prop_assert_eq!(
                cmp.years.len() as u32,
                input.max_age - retirement_age.max(input.current_age) + 1
            );
            let summed: f64 = cmp.years.iter().map(|y| y.phased_spending).sum();
            prop_assert!((summed - cmp.total_phased_spending).abs() <= 0.01);
        }
    }
}
