use serde::{Deserialize, Serialize};

pub const DEFAULT_INFLATION_RATE: f64 = 0.025;
pub const DEFAULT_HEALTHCARE_INFLATION_RATE: f64 = 0.055;
pub const DEFAULT_MAX_AGE: u32 = 95;

pub const ESSENTIAL_EXPENSE_SHARE: f64 = 0.70;

pub const SOCIAL_SECURITY_FULL_RETIREMENT_AGE: u32 = 67;
pub const SOCIAL_SECURITY_EARLIEST_CLAIM_AGE: u32 = 62;
pub const SOCIAL_SECURITY_LATEST_CLAIM_AGE: u32 = 70;
const SOCIAL_SECURITY_TAXABLE_MAXIMUM: f64 = 168_600.0;
const SOCIAL_SECURITY_REPLACEMENT_RATE: f64 = 0.40;
const EARLY_CLAIM_REDUCTION_FIRST_THREE_YEARS: f64 = 0.2 / 3.0;
const EARLY_CLAIM_REDUCTION_LATER_YEARS: f64 = 0.05;
const DELAYED_CLAIM_CREDIT: f64 = 0.08;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

pub fn default_expected_return(risk: RiskTolerance) -> f64 {
    match risk {
        RiskTolerance::Conservative => 0.05,
        RiskTolerance::Moderate => 0.065,
        RiskTolerance::Aggressive => 0.08,
    }
}

/// Rough annual benefit in today's dollars for someone earning
/// `annual_earnings` who claims at `claim_age` (clamped to 62..=70).
pub fn estimate_social_security(annual_earnings: f64, claim_age: u32) -> f64 {
    let covered = annual_earnings.clamp(0.0, SOCIAL_SECURITY_TAXABLE_MAXIMUM);
    let full_benefit = covered * SOCIAL_SECURITY_REPLACEMENT_RATE;
    full_benefit * claim_age_factor(claim_age)
}

fn claim_age_factor(claim_age: u32) -> f64 {
    let age = claim_age.clamp(
        SOCIAL_SECURITY_EARLIEST_CLAIM_AGE,
        SOCIAL_SECURITY_LATEST_CLAIM_AGE,
    );
    if age >= SOCIAL_SECURITY_FULL_RETIREMENT_AGE {
        let delayed = (age - SOCIAL_SECURITY_FULL_RETIREMENT_AGE) as f64;
        return 1.0 + delayed * DELAYED_CLAIM_CREDIT;
    }

    let early = SOCIAL_SECURITY_FULL_RETIREMENT_AGE - age;
    let first = early.min(3) as f64;
    let later = early.saturating_sub(3) as f64;
    1.0 - first * EARLY_CLAIM_REDUCTION_FIRST_THREE_YEARS
        - later * EARLY_CLAIM_REDUCTION_LATER_YEARS
}

/// Splits a single annual expense figure into (essential, discretionary).
pub fn derive_expense_split(annual_expenses: f64) -> (f64, f64) {
    let total = annual_expenses.max(0.0);
    let essential = total * ESSENTIAL_EXPENSE_SHARE;
    (essential, total - essential)
}

/// Level annual payment that retires `principal` over `years` at `annual_rate`.
pub fn amortized_annual_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    if principal <= 0.0 || years == 0 {
        return 0.0;
    }
    if annual_rate.abs() < 1e-12 {
        return principal / years as f64;
    }
    let discount = 1.0 - (1.0 + annual_rate).powi(-(years as i32));
    principal * annual_rate / discount
}

/// Out-of-pocket healthcare cost in today's dollars by age band.
pub fn healthcare_cost_for_age(age: u32) -> f64 {
    match age {
        0..50 => 6_000.0,
        50..65 => 9_000.0,
        65..75 => 7_000.0,
        _ => 9_500.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn risk_tiers_are_ordered() {
        assert!(
            default_expected_return(RiskTolerance::Conservative)
                < default_expected_return(RiskTolerance::Moderate)
        );
        assert!(
            default_expected_return(RiskTolerance::Moderate)
                < default_expected_return(RiskTolerance::Aggressive)
        );
    }

    #[test]
    fn social_security_at_full_retirement_age_is_base_benefit() {
        assert_approx(estimate_social_security(60_000.0, 67), 24_000.0);
    }

    #[test]
    fn social_security_early_and_delayed_adjustments() {
        assert_approx(estimate_social_security(60_000.0, 62), 24_000.0 * 0.70);
        assert_approx(estimate_social_security(60_000.0, 70), 24_000.0 * 1.24);
        assert_approx(
            estimate_social_security(60_000.0, 55),
            estimate_social_security(60_000.0, 62),
        );
    }

    #[test]
    fn social_security_earnings_are_capped() {
        assert_approx(
            estimate_social_security(1_000_000.0, 67),
            SOCIAL_SECURITY_TAXABLE_MAXIMUM * 0.40,
        );
        assert_approx(estimate_social_security(-5.0, 67), 0.0);
    }

    #[test]
    fn expense_split_is_seventy_thirty() {
        let (essential, discretionary) = derive_expense_split(50_000.0);
        assert_approx(essential, 35_000.0);
        assert_approx(discretionary, 15_000.0);
    }

    #[test]
    fn amortization_matches_annuity_formula() {
        // 100k at 5% over 10 years.
        assert_approx(
            (amortized_annual_payment(100_000.0, 0.05, 10) * 100.0).round() / 100.0,
            12_950.46,
        );
        assert_approx(amortized_annual_payment(12_000.0, 0.0, 4), 3_000.0);
        assert_approx(amortized_annual_payment(12_000.0, 0.05, 0), 0.0);
    }

    #[test]
    fn healthcare_bands() {
        assert_approx(healthcare_cost_for_age(40), 6_000.0);
        assert_approx(healthcare_cost_for_age(64), 9_000.0);
        assert_approx(healthcare_cost_for_age(65), 7_000.0);
        assert_approx(healthcare_cost_for_age(80), 9_500.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_payments_repay_at_least_principal(
            principal in 1.0_f64..1_000_000.0,
            rate in 0.0_f64..0.2,
            years in 1_u32..40,
        ) {
            let payment = amortized_annual_payment(principal, rate, years);
            prop_assert!(payment * years as f64 + 1e-6 >= principal);
        }
    }
}
