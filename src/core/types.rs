use serde::{Deserialize, Serialize};

use super::reserve::ReserveStage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceByType {
    pub tax_deferred: f64,
    pub tax_free: f64,
    pub taxable: f64,
}

impl BalanceByType {
    pub fn new(tax_deferred: f64, tax_free: f64, taxable: f64) -> Self {
        Self {
            tax_deferred,
            tax_free,
            taxable,
        }
    }

    pub fn total(&self) -> f64 {
        self.tax_deferred + self.tax_free + self.taxable
    }

    pub fn clamped(self) -> Self {
        Self {
            tax_deferred: self.tax_deferred.max(0.0),
            tax_free: self.tax_free.max(0.0),
            taxable: self.taxable.max(0.0),
        }
    }

    pub fn plus(self, other: Self) -> Self {
        Self {
            tax_deferred: self.tax_deferred + other.tax_deferred,
            tax_free: self.tax_free + other.tax_free,
            taxable: self.taxable + other.taxable,
        }
        .clamped()
    }

    /// Subtracts bucket by bucket, never going below zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            tax_deferred: self.tax_deferred - other.tax_deferred,
            tax_free: self.tax_free - other.tax_free,
            taxable: self.taxable - other.taxable,
        }
        .clamped()
    }

    /// Applies one year of the same return to every bucket.
    pub fn grown(self, rate: f64) -> Self {
        let factor = 1.0 + rate;
        Self {
            tax_deferred: self.tax_deferred * factor,
            tax_free: self.tax_free * factor,
            taxable: self.taxable * factor,
        }
        .clamped()
    }

    pub fn rounded(self) -> Self {
        Self {
            tax_deferred: round_cents(self.tax_deferred),
            tax_free: round_cents(self.tax_free),
            taxable: round_cents(self.taxable),
        }
    }
}

/// Percent split of each contribution; the three shares sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionAllocation {
    pub tax_deferred: f64,
    pub tax_free: f64,
    pub taxable: f64,
}

impl Default for ContributionAllocation {
    fn default() -> Self {
        Self {
            tax_deferred: 60.0,
            tax_free: 20.0,
            taxable: 20.0,
        }
    }
}

impl ContributionAllocation {
    pub fn total_percent(&self) -> f64 {
        self.tax_deferred + self.tax_free + self.taxable
    }

    pub fn split(&self, amount: f64) -> BalanceByType {
        BalanceByType {
            tax_deferred: amount * self.tax_deferred / 100.0,
            tax_free: amount * self.tax_free / 100.0,
            taxable: amount * self.taxable / 100.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeCategory {
    #[serde(alias = "socialSecurity", alias = "social_security")]
    SocialSecurity,
    Pension,
    Rental,
    Annuity,
    #[serde(alias = "partTime", alias = "part_time")]
    PartTime,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStream {
    pub id: String,
    pub name: String,
    pub category: IncomeCategory,
    /// Today's dollars.
    pub annual_amount: f64,
    pub start_age: u32,
    /// `None` pays for life.
    #[serde(default)]
    pub end_age: Option<u32>,
    #[serde(default)]
    pub inflation_adjusted: bool,
    #[serde(default)]
    pub is_guaranteed: bool,
    #[serde(default)]
    pub is_spouse: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPhase {
    pub id: String,
    pub name: String,
    pub start_age: u32,
    pub essential_multiplier: f64,
    pub discretionary_multiplier: f64,
    #[serde(default)]
    pub essential_override: Option<f64>,
    #[serde(default)]
    pub discretionary_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPhaseConfig {
    pub enabled: bool,
    #[serde(default)]
    pub phases: Vec<SpendingPhase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmdConfig {
    pub enabled: bool,
    #[serde(default = "default_rmd_start_age")]
    pub start_age: u32,
}

fn default_rmd_start_age() -> u32 {
    super::rmd::DEFAULT_RMD_START_AGE
}

impl Default for RmdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_age: default_rmd_start_age(),
        }
    }
}

/// Canonical scenario consumed by the engine. Rates are fractions
/// (`0.06` is 6%), money is annual dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInput {
    pub current_age: u32,
    pub retirement_age: u32,
    pub max_age: u32,
    pub current_balances: BalanceByType,
    pub annual_contribution: f64,
    #[serde(default)]
    pub contribution_allocation: ContributionAllocation,
    pub expected_return: f64,
    pub inflation_rate: f64,
    pub healthcare_inflation_rate: f64,
    #[serde(default)]
    pub contribution_growth_rate: f64,
    pub essential_expenses: f64,
    pub discretionary_expenses: f64,
    #[serde(default)]
    pub healthcare_costs: f64,
    #[serde(default)]
    pub income_streams: Vec<IncomeStream>,
    #[serde(default)]
    pub annual_debt_payments: f64,
    #[serde(default)]
    pub spending_phase_config: Option<SpendingPhaseConfig>,
    #[serde(default)]
    pub rmd_config: Option<RmdConfig>,
    #[serde(default)]
    pub reserve_floor: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionPhase {
    Accumulation,
    Drawdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub essential: f64,
    pub discretionary: f64,
    pub healthcare: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RmdTracking {
    pub rmd_required: f64,
    pub rmd_taken: f64,
    pub excess_over_rmd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRecord {
    pub age: u32,
    pub year_offset: u32,
    pub phase: ProjectionPhase,
    pub balance: f64,
    pub balances: BalanceByType,
    pub inflows: f64,
    pub outflows: f64,
    pub contribution: f64,
    pub investment_growth: f64,
    pub withdrawals: BalanceByType,
    pub total_withdrawal: f64,
    pub income: f64,
    pub guaranteed_income: f64,
    /// Guaranteed income over essential spending. `None` before retirement,
    /// and when there are no essentials to cover.
    pub coverage_ratio: Option<f64>,
    pub expenses: ExpenseBreakdown,
    pub active_phase: Option<String>,
    pub reserve_constrained: bool,
    pub reserve_stage: Option<ReserveStage>,
    pub discretionary_reduction: f64,
    pub shortfall: f64,
    pub rmd: RmdTracking,
    pub depleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub starting_balance: f64,
    pub ending_balance: f64,
    pub total_contributions: f64,
    pub total_withdrawals: f64,
    pub total_investment_growth: f64,
    pub total_shortfall: f64,
    pub total_rmd_required: f64,
    /// First age whose year-end balance is zero; `None` never depletes.
    pub depletion_age: Option<u32>,
    pub projected_retirement_balance: f64,
    pub years_reserve_constrained: u32,
    pub first_reserve_constraint_age: Option<u32>,
    pub total_discretionary_reduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub records: Vec<ProjectionRecord>,
    pub summary: ProjectionSummary,
}

impl ProjectionResult {
    pub fn drawdown_records(&self) -> impl Iterator<Item = &ProjectionRecord> {
        self.records
            .iter()
            .filter(|r| r.phase == ProjectionPhase::Drawdown)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
