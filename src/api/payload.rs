use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::core::{
    BalanceByType, ContributionAllocation, DEFAULT_HEALTHCARE_INFLATION_RATE,
    DEFAULT_INFLATION_RATE, DEFAULT_MAX_AGE, IncomeCategory, IncomeStream, ProjectionInput,
    RiskTolerance, RmdConfig, SOCIAL_SECURITY_FULL_RETIREMENT_AGE, amortized_annual_payment,
    default_expected_return, derive_expense_split, estimate_social_security,
    healthcare_cost_for_age,
};

const ALLOCATION_TOLERANCE: f64 = 0.01;
const SOCIAL_SECURITY_STREAM_ID: &str = "social-security";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: f64 },
    #[error("currentAge ({current_age}) must not exceed maxAge ({max_age})")]
    CurrentAfterMaxAge { current_age: u32, max_age: u32 },
    #[error("retirementAge ({retirement_age}) must not exceed maxAge ({max_age})")]
    RetirementAfterMaxAge { retirement_age: u32, max_age: u32 },
    #[error("contributionAllocation must sum to 100 (got {total})")]
    AllocationTotal { total: f64 },
    #[error("{field} must be greater than -100%")]
    RateTooLow { field: &'static str },
    #[error("incomeStreams[{id}].endAge ({end_age}) is before startAge ({start_age})")]
    StreamEndsBeforeStart {
        id: String,
        start_age: u32,
        end_age: u32,
    },
    #[error("{field} entries need a non-empty id")]
    MissingId { field: &'static str },
    #[error("{field} has duplicate id `{id}`")]
    DuplicateId { field: &'static str, id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A scenario as callers send it. Older clients post a flat profile with a
/// single expense figure and Social Security fields; newer ones post the
/// canonical projection input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ScenarioPayload {
    Current(ProjectionInput),
    Legacy(LegacyProfile),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProfile {
    pub current_age: u32,
    pub retirement_age: u32,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub current_balances: BalanceByType,
    #[serde(default)]
    pub annual_contribution: f64,
    #[serde(default)]
    pub contribution_allocation: Option<ContributionAllocation>,
    #[serde(default)]
    pub contribution_growth_rate: f64,
    #[serde(default)]
    pub expected_return: Option<f64>,
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default)]
    pub inflation_rate: Option<f64>,
    #[serde(default)]
    pub healthcare_inflation_rate: Option<f64>,
    pub annual_expenses: f64,
    #[serde(default)]
    pub healthcare_costs: Option<f64>,
    /// Pre-retirement earnings, used to estimate a benefit when none is given.
    #[serde(default)]
    pub annual_income: Option<f64>,
    #[serde(default)]
    pub social_security_benefit: Option<f64>,
    #[serde(default)]
    pub social_security_start_age: Option<u32>,
    #[serde(default)]
    pub debts: Vec<LegacyDebt>,
    #[serde(default)]
    pub reserve_floor: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDebt {
    #[serde(default)]
    pub name: String,
    pub balance: f64,
    /// Annual rate as a fraction.
    #[serde(default)]
    pub interest_rate: f64,
    pub years_remaining: u32,
}

impl LegacyProfile {
    fn into_input(self) -> ProjectionInput {
        let (essential_expenses, discretionary_expenses) =
            derive_expense_split(self.annual_expenses);
        let expected_return = self.expected_return.unwrap_or_else(|| {
            default_expected_return(self.risk_tolerance.unwrap_or(RiskTolerance::Moderate))
        });
        let healthcare_costs = self
            .healthcare_costs
            .unwrap_or_else(|| healthcare_cost_for_age(self.retirement_age));
        let annual_debt_payments = self
            .debts
            .iter()
            .map(|d| amortized_annual_payment(d.balance, d.interest_rate, d.years_remaining))
            .sum();

        ProjectionInput {
            current_age: self.current_age,
            retirement_age: self.retirement_age,
            max_age: self.max_age.unwrap_or(DEFAULT_MAX_AGE),
            current_balances: self.current_balances,
            annual_contribution: self.annual_contribution,
            contribution_allocation: self.contribution_allocation.unwrap_or_default(),
            expected_return,
            inflation_rate: self.inflation_rate.unwrap_or(DEFAULT_INFLATION_RATE),
            healthcare_inflation_rate: self
                .healthcare_inflation_rate
                .unwrap_or(DEFAULT_HEALTHCARE_INFLATION_RATE),
            contribution_growth_rate: self.contribution_growth_rate,
            essential_expenses,
            discretionary_expenses,
            healthcare_costs,
            income_streams: self.social_security_stream().into_iter().collect(),
            annual_debt_payments,
            spending_phase_config: None,
            rmd_config: Some(RmdConfig::default()),
            reserve_floor: self.reserve_floor,
        }
    }

    fn social_security_stream(&self) -> Option<IncomeStream> {
        let claim_age = self
            .social_security_start_age
            .unwrap_or(SOCIAL_SECURITY_FULL_RETIREMENT_AGE);
        let benefit = match (self.social_security_benefit, self.annual_income) {
            (Some(benefit), _) => benefit,
            (None, Some(earnings)) => estimate_social_security(earnings, claim_age),
            (None, None) => 0.0,
        };
        (benefit > 0.0).then(|| IncomeStream {
            id: SOCIAL_SECURITY_STREAM_ID.to_string(),
            name: "Social Security".to_string(),
            category: IncomeCategory::SocialSecurity,
            annual_amount: benefit,
            start_age: claim_age,
            end_age: None,
            inflation_adjusted: true,
            is_guaranteed: true,
            is_spouse: false,
        })
    }
}

/// Converts either payload shape into a validated projection input.
pub fn normalize(payload: ScenarioPayload) -> Result<ProjectionInput, ValidationError> {
    let input = match payload {
        ScenarioPayload::Current(input) => input,
        ScenarioPayload::Legacy(profile) => profile.into_input(),
    };
    validate(&input)?;
    Ok(input)
}

pub fn parse_scenario(json: &str) -> Result<ProjectionInput, PayloadError> {
    let payload = serde_json::from_str::<ScenarioPayload>(json)?;
    Ok(normalize(payload)?)
}

pub fn load_scenario(path: &Path) -> Result<ProjectionInput, PayloadError> {
    let json = std::fs::read_to_string(path).map_err(|source| PayloadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_scenario(&json)
}

fn check_finite(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite {
            field: field.into(),
        })
    }
}

fn check_amount(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    let field = field.into();
    check_finite(field.clone(), value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value <= -1.0 {
        return Err(ValidationError::RateTooLow { field });
    }
    Ok(())
}

fn check_ids<'a>(
    field: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::MissingId { field });
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                field,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate(input: &ProjectionInput) -> Result<(), ValidationError> {
    // A retirement age already passed is allowed: the household is retired.
    if input.current_age > input.max_age {
        return Err(ValidationError::CurrentAfterMaxAge {
            current_age: input.current_age,
            max_age: input.max_age,
        });
    }
    if input.retirement_age > input.max_age {
        return Err(ValidationError::RetirementAfterMaxAge {
            retirement_age: input.retirement_age,
            max_age: input.max_age,
        });
    }

    let balances = &input.current_balances;
    check_amount("currentBalances.taxDeferred", balances.tax_deferred)?;
    check_amount("currentBalances.taxFree", balances.tax_free)?;
    check_amount("currentBalances.taxable", balances.taxable)?;
    check_amount("annualContribution", input.annual_contribution)?;
    check_amount("essentialExpenses", input.essential_expenses)?;
    check_amount("discretionaryExpenses", input.discretionary_expenses)?;
    check_amount("healthcareCosts", input.healthcare_costs)?;
    check_amount("annualDebtPayments", input.annual_debt_payments)?;
    if let Some(floor) = input.reserve_floor {
        check_amount("reserveFloor", floor)?;
    }

    let allocation = &input.contribution_allocation;
    check_amount("contributionAllocation.taxDeferred", allocation.tax_deferred)?;
    check_amount("contributionAllocation.taxFree", allocation.tax_free)?;
    check_amount("contributionAllocation.taxable", allocation.taxable)?;
    let total = allocation.total_percent();
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        return Err(ValidationError::AllocationTotal { total });
    }

    check_rate("expectedReturn", input.expected_return)?;
    check_rate("inflationRate", input.inflation_rate)?;
    check_rate("healthcareInflationRate", input.healthcare_inflation_rate)?;
    check_rate("contributionGrowthRate", input.contribution_growth_rate)?;

    check_ids(
        "incomeStreams",
        input.income_streams.iter().map(|s| s.id.as_str()),
    )?;
    for stream in &input.income_streams {
        check_amount(
            format!("incomeStreams[{}].annualAmount", stream.id),
            stream.annual_amount,
        )?;
        if let Some(end_age) = stream.end_age.filter(|&end| end < stream.start_age) {
            return Err(ValidationError::StreamEndsBeforeStart {
                id: stream.id.clone(),
                start_age: stream.start_age,
                end_age,
            });
        }
    }

    if let Some(config) = &input.spending_phase_config {
        check_ids(
            "spendingPhaseConfig.phases",
            config.phases.iter().map(|p| p.id.as_str()),
        )?;
        for phase in &config.phases {
            let prefix = format!("spendingPhaseConfig.phases[{}]", phase.id);
            check_amount(
                format!("{prefix}.essentialMultiplier"),
                phase.essential_multiplier,
            )?;
            check_amount(
                format!("{prefix}.discretionaryMultiplier"),
                phase.discretionary_multiplier,
            )?;
            if let Some(value) = phase.essential_override {
                check_amount(format!("{prefix}.essentialOverride"), value)?;
            }
            if let Some(value) = phase.discretionary_override {
                check_amount(format!("{prefix}.discretionaryOverride"), value)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProjectionPhase, SpendingPhaseConfig, run_projection};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn current_json() -> &'static str {
        r#"{
            "shape": "current",
            "currentAge": 30,
            "retirementAge": 65,
            "maxAge": 90,
            "currentBalances": {"taxDeferred": 60000, "taxFree": 20000, "taxable": 20000},
            "annualContribution": 20000,
            "expectedReturn": 0.06,
            "inflationRate": 0.025,
            "healthcareInflationRate": 0.055,
            "essentialExpenses": 40000,
            "discretionaryExpenses": 15000,
            "healthcareCosts": 6000,
            "incomeStreams": [{
                "id": "ss",
                "name": "Social Security",
                "category": "social-security",
                "annualAmount": 24000,
                "startAge": 67,
                "inflationAdjusted": true,
                "isGuaranteed": true
            }]
        }"#
    }

    fn valid_input() -> ProjectionInput {
        parse_scenario(current_json()).expect("valid scenario")
    }

    #[test]
    fn current_shape_parses_with_defaults() {
        let input = valid_input();
        assert_eq!(input.current_age, 30);
        assert_approx(input.current_balances.total(), 100_000.0);
        assert_eq!(input.contribution_allocation, ContributionAllocation::default());
        assert_eq!(input.income_streams.len(), 1);
        assert_eq!(input.income_streams[0].end_age, None);
        assert!(input.spending_phase_config.is_none());
        assert!(input.reserve_floor.is_none());
    }

    #[test]
    fn legacy_shape_is_normalized_once() {
        let json = r#"{
            "shape": "legacy",
            "currentAge": 50,
            "retirementAge": 65,
            "currentBalances": {"taxDeferred": 400000, "taxFree": 50000, "taxable": 50000},
            "annualContribution": 20000,
            "riskTolerance": "conservative",
            "annualExpenses": 60000,
            "annualIncome": 90000,
            "socialSecurityStartAge": 70,
            "debts": [{"name": "car", "balance": 12000, "interestRate": 0, "yearsRemaining": 4}]
        }"#;
        let input = parse_scenario(json).expect("legacy scenario");

        assert_eq!(input.max_age, DEFAULT_MAX_AGE);
        assert_approx(input.expected_return, 0.05);
        assert_approx(input.essential_expenses, 42_000.0);
        assert_approx(input.discretionary_expenses, 18_000.0);
        assert_approx(input.healthcare_costs, 7_000.0);
        assert_approx(input.annual_debt_payments, 3_000.0);
        assert_eq!(input.rmd_config, Some(RmdConfig::default()));

        let ss = &input.income_streams[0];
        assert_eq!(ss.id, SOCIAL_SECURITY_STREAM_ID);
        assert_eq!(ss.start_age, 70);
        assert_approx(ss.annual_amount, 90_000.0 * 0.40 * 1.24);
        assert!(ss.is_guaranteed && ss.inflation_adjusted);
    }

    #[test]
    fn explicit_legacy_benefit_wins_over_estimate() {
        let json = r#"{
            "shape": "legacy",
            "currentAge": 60,
            "retirementAge": 62,
            "annualExpenses": 50000,
            "annualIncome": 90000,
            "socialSecurityBenefit": 18000
        }"#;
        let input = parse_scenario(json).expect("legacy scenario");
        assert_approx(input.income_streams[0].annual_amount, 18_000.0);
        assert_eq!(
            input.income_streams[0].start_age,
            SOCIAL_SECURITY_FULL_RETIREMENT_AGE
        );
        assert_approx(input.expected_return, 0.065);
    }

    #[test]
    fn legacy_without_benefit_has_no_streams() {
        let json = r#"{"shape": "legacy", "currentAge": 40, "retirementAge": 60, "annualExpenses": 1}"#;
        let input = parse_scenario(json).expect("legacy scenario");
        assert!(input.income_streams.is_empty());
    }

    #[test]
    fn missing_shape_is_a_json_error() {
        let err = parse_scenario(r#"{"currentAge": 30}"#).expect_err("no shape tag");
        assert!(matches!(err, PayloadError::Json(_)));
    }

    #[test]
    fn ages_must_fit_the_horizon() {
        let mut input = valid_input();
        input.current_age = 70;
        assert_eq!(validate(&input), Ok(()));

        input.current_age = 91;
        assert_eq!(
            validate(&input),
            Err(ValidationError::CurrentAfterMaxAge {
                current_age: 91,
                max_age: 90
            })
        );

        let mut input = valid_input();
        input.max_age = 60;
        assert!(matches!(
            validate(&input),
            Err(ValidationError::RetirementAfterMaxAge { .. })
        ));
    }

    #[test]
    fn already_retired_household_normalizes_and_projects() {
        let json = r#"{
            "shape": "current",
            "currentAge": 70,
            "retirementAge": 65,
            "maxAge": 95,
            "currentBalances": {"taxDeferred": 600000, "taxFree": 100000, "taxable": 100000},
            "annualContribution": 0,
            "expectedReturn": 0.05,
            "inflationRate": 0.025,
            "healthcareInflationRate": 0.055,
            "essentialExpenses": 40000,
            "discretionaryExpenses": 10000,
            "rmdConfig": {"enabled": true}
        }"#;
        let input = parse_scenario(json).expect("retired household is valid");
        assert_eq!(input.rmd_config, Some(RmdConfig::default()));

        let result = run_projection(&input);
        assert_eq!(result.records.len(), 26);
        assert!(
            result
                .records
                .iter()
                .all(|r| r.phase == ProjectionPhase::Drawdown)
        );
        assert_approx(result.summary.projected_retirement_balance, 800_000.0);
        // Spending starts in today's dollars, not inflated from age 65.
        assert_approx(result.records[0].expenses.essential, 40_000.0);
        assert!(result.records[3].rmd.rmd_required > 0.0);
    }

    #[test]
    fn rmd_start_age_defaults_when_omitted() {
        let config: RmdConfig = serde_json::from_str(r#"{"enabled": false}"#).expect("config");
        assert_eq!(config.start_age, 73);
        assert!(!config.enabled);

        let config: RmdConfig =
            serde_json::from_str(r#"{"enabled": true, "startAge": 75}"#).expect("config");
        assert_eq!(config.start_age, 75);
    }

    #[test]
    fn legacy_profile_past_retirement_age_is_accepted() {
        let json = r#"{
            "shape": "legacy",
            "currentAge": 72,
            "retirementAge": 66,
            "currentBalances": {"taxDeferred": 300000, "taxFree": 0, "taxable": 0},
            "annualExpenses": 40000,
            "socialSecurityBenefit": 20000,
            "socialSecurityStartAge": 66
        }"#;
        let input = parse_scenario(json).expect("legacy retiree is valid");
        assert_eq!(input.current_age, 72);
        assert_eq!(input.retirement_age, 66);
        assert_eq!(run_projection(&input).records[0].age, 72);
    }

    #[test]
    fn money_must_be_finite_and_non_negative() {
        let mut input = valid_input();
        input.current_balances.taxable = -1.0;
        let err = validate(&input).expect_err("negative balance");
        assert_eq!(err.to_string(), "currentBalances.taxable must not be negative (got -1)");

        let mut input = valid_input();
        input.essential_expenses = f64::NAN;
        assert_eq!(
            validate(&input),
            Err(ValidationError::NotFinite {
                field: "essentialExpenses".to_string()
            })
        );

        let mut input = valid_input();
        input.reserve_floor = Some(-5.0);
        assert!(matches!(
            validate(&input),
            Err(ValidationError::Negative { ref field, .. }) if field == "reserveFloor"
        ));
    }

    #[test]
    fn allocation_must_sum_to_one_hundred() {
        let mut input = valid_input();
        input.contribution_allocation.taxable = 25.0;
        assert!(matches!(
            validate(&input),
            Err(ValidationError::AllocationTotal { .. })
        ));

        input.contribution_allocation.taxable = 20.005;
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn rates_must_stay_above_minus_one_hundred_percent() {
        let mut input = valid_input();
        input.expected_return = -1.0;
        assert_eq!(
            validate(&input),
            Err(ValidationError::RateTooLow {
                field: "expectedReturn"
            })
        );
        input.expected_return = -0.5;
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn income_streams_need_ordered_ages_and_unique_ids() {
        let mut input = valid_input();
        input.income_streams[0].end_age = Some(66);
        assert!(matches!(
            validate(&input),
            Err(ValidationError::StreamEndsBeforeStart { end_age: 66, .. })
        ));

        let mut input = valid_input();
        let twin = input.income_streams[0].clone();
        input.income_streams.push(twin);
        assert_eq!(
            validate(&input),
            Err(ValidationError::DuplicateId {
                field: "incomeStreams",
                id: "ss".to_string()
            })
        );

        let mut input = valid_input();
        input.income_streams[0].id = "  ".to_string();
        assert!(matches!(
            validate(&input),
            Err(ValidationError::MissingId { .. })
        ));
    }

    #[test]
    fn phase_multipliers_must_be_non_negative() {
        let mut input = valid_input();
        let mut config = SpendingPhaseConfig::go_go_slow_go_no_go(65);
        config.phases[1].discretionary_multiplier = -0.2;
        input.spending_phase_config = Some(config);
        let err = validate(&input).expect_err("negative multiplier");
        assert!(err.to_string().contains("phases[slow-go].discretionaryMultiplier"));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_scenario(Path::new("/nonexistent/runway-scenario.json"))
            .expect_err("missing file");
        assert!(matches!(err, PayloadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/runway-scenario.json"));
    }
}
