use serde::Serialize;

use super::rmd::DEFAULT_RMD_START_AGE;
use super::sensitivity::format_dollars;
use super::types::ProjectionInput;

const HIGH_INFLATION: f64 = 0.08;
const LOW_RETURN: f64 = 0.02;
const NEAR_RETIREMENT_YEARS: u32 = 5;
const RMD_NOTICE_FROM_AGE: u32 = 70;
const RMD_NOTICE_BALANCE: f64 = 100_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionWarning {
    pub field: &'static str,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ProjectionWarning {
    fn warning(field: &'static str, message: String) -> Self {
        Self {
            field,
            message,
            severity: WarningSeverity::Warning,
        }
    }

    fn info(field: &'static str, message: String) -> Self {
        Self {
            field,
            message,
            severity: WarningSeverity::Info,
        }
    }
}

/// Advisory notes about unusual but valid inputs. Rules are independent; any
/// number of them may fire.
pub fn generate_warnings(input: &ProjectionInput) -> Vec<ProjectionWarning> {
    let mut warnings = Vec::new();

    if input.inflation_rate > HIGH_INFLATION {
        warnings.push(ProjectionWarning::warning(
            "inflationRate",
            format!(
                "Inflation of {:.1}% is well above historical norms.",
                input.inflation_rate * 100.0
            ),
        ));
    }

    if (0.0..LOW_RETURN).contains(&input.expected_return) {
        warnings.push(ProjectionWarning::info(
            "expectedReturn",
            format!(
                "An expected return of {:.1}% is very conservative and may understate growth.",
                input.expected_return * 100.0
            ),
        ));
    }

    if input.current_balances.total() <= 0.0 && input.annual_contribution <= 0.0 {
        warnings.push(ProjectionWarning::warning(
            "currentBalances",
            "No savings and no contributions: retirement spending cannot be funded from investments."
                .to_string(),
        ));
    }

    if input.annual_debt_payments > 0.0 && input.annual_debt_payments >= input.annual_contribution
    {
        warnings.push(ProjectionWarning::info(
            "annualDebtPayments",
            format!(
                "Debt payments of {} a year absorb all contributions until they are paid off.",
                format_dollars(input.annual_debt_payments)
            ),
        ));
    }

    let years_to_retirement = input.retirement_age.saturating_sub(input.current_age);
    if (1..=NEAR_RETIREMENT_YEARS).contains(&years_to_retirement) {
        let unit = if years_to_retirement == 1 { "year" } else { "years" };
        warnings.push(ProjectionWarning::info(
            "retirementAge",
            format!(
                "Retirement is {years_to_retirement} {unit} away; there is little time left to change course."
            ),
        ));
    }

    if (RMD_NOTICE_FROM_AGE..DEFAULT_RMD_START_AGE).contains(&input.current_age)
        && input.current_balances.tax_deferred > RMD_NOTICE_BALANCE
    {
        warnings.push(ProjectionWarning::info(
            "currentBalances.taxDeferred",
            format!(
                "Required minimum distributions start at {DEFAULT_RMD_START_AGE} on {} of tax-deferred savings.",
                format_dollars(input.current_balances.tax_deferred)
            ),
        ));
    }

    warnings
}
