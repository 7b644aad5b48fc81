mod assumptions;
mod comparison;
mod engine;
mod income;
mod phases;
mod reserve;
mod rmd;
mod sensitivity;
mod staleness;
mod types;
mod warnings;
mod withdrawal;

pub use assumptions::{
    DEFAULT_HEALTHCARE_INFLATION_RATE, DEFAULT_INFLATION_RATE, DEFAULT_MAX_AGE, RiskTolerance,
    SOCIAL_SECURITY_FULL_RETIREMENT_AGE, amortized_annual_payment, default_expected_return,
    derive_expense_split, estimate_social_security, healthcare_cost_for_age,
};
pub use comparison::{
    ComparisonYear, DEFAULT_EARLY_YEARS, SpendingComparison, calculate_spending_comparison,
};
pub use engine::run_projection;
pub use income::{IncomeForAge, aggregate_income, coverage_ratio};
pub use phases::{PhaseAdjustedExpenses, active_phase, calculate_phase_adjusted_expenses};
pub use reserve::{ReservePolicyOutcome, ReserveStage, apply_reserve_floor};
pub use rmd::{DEFAULT_RMD_START_AGE, calculate_rmd, calculate_rmd_from, distribution_period};
pub use sensitivity::{
    DepletionChange, SensitivityImpact, SensitivityLever, SensitivityReport, TOP_LEVERS,
    format_dollars, run_sensitivity_analysis,
};
pub use staleness::{ChangedField, StalenessReport, check_projection_staleness};
pub use types::{
    BalanceByType, ContributionAllocation, ExpenseBreakdown, IncomeCategory, IncomeStream,
    ProjectionInput, ProjectionPhase, ProjectionRecord, ProjectionResult, ProjectionSummary,
    RmdConfig, RmdTracking, SpendingPhase, SpendingPhaseConfig, round_cents,
};
pub use warnings::{ProjectionWarning, WarningSeverity, generate_warnings};
pub use withdrawal::{
    RmdWithdrawalOutcome, WithdrawalOutcome, withdraw_from_accounts, withdraw_with_rmd,
};
