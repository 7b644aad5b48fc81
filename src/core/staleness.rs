use serde::Serialize;
use serde_json::Value;

use super::types::{
    BalanceByType, ContributionAllocation, IncomeStream, ProjectionInput, SpendingPhase,
    SpendingPhaseConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedField {
    pub field: &'static str,
    pub previous: Value,
    pub current: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StalenessReport {
    pub is_stale: bool,
    pub changed_fields: Vec<ChangedField>,
}

#[derive(Default)]
struct FieldDiff {
    changed: Vec<ChangedField>,
}

impl FieldDiff {
    fn compare<T: PartialEq + Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        previous: &T,
        current: &T,
    ) {
        if previous != current {
            self.record(field, previous, current);
        }
    }

    fn record<T: Serialize + ?Sized>(&mut self, field: &'static str, previous: &T, current: &T) {
        self.changed.push(ChangedField {
            field,
            previous: to_json(previous),
            current: to_json(current),
        });
    }

    fn balances(&mut self, previous: &BalanceByType, current: &BalanceByType) {
        self.compare(
            "currentBalances.taxDeferred",
            &previous.tax_deferred,
            &current.tax_deferred,
        );
        self.compare(
            "currentBalances.taxFree",
            &previous.tax_free,
            &current.tax_free,
        );
        self.compare(
            "currentBalances.taxable",
            &previous.taxable,
            &current.taxable,
        );
    }

    fn allocation(&mut self, previous: &ContributionAllocation, current: &ContributionAllocation) {
        self.compare(
            "contributionAllocation.taxDeferred",
            &previous.tax_deferred,
            &current.tax_deferred,
        );
        self.compare(
            "contributionAllocation.taxFree",
            &previous.tax_free,
            &current.tax_free,
        );
        self.compare(
            "contributionAllocation.taxable",
            &previous.taxable,
            &current.taxable,
        );
    }

    fn finish(self) -> StalenessReport {
        StalenessReport {
            is_stale: !self.changed.is_empty(),
            changed_fields: self.changed,
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for IncomeStream {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for SpendingPhase {
    fn key(&self) -> &str {
        &self.id
    }
}

fn sorted_by_key<T: Keyed>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| a.key().cmp(b.key()));
    sorted
}

fn same_unordered<T: Keyed + PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && sorted_by_key(a) == sorted_by_key(b)
}

fn phases_enabled(config: Option<&SpendingPhaseConfig>) -> bool {
    config.is_some_and(|c| c.enabled)
}

/// Two disabled (or absent) configurations are equal whatever phases they hold.
fn same_phase_config(a: Option<&SpendingPhaseConfig>, b: Option<&SpendingPhaseConfig>) -> bool {
    match (a, b) {
        _ if !phases_enabled(a) && !phases_enabled(b) => true,
        (Some(a), Some(b)) => a.enabled == b.enabled && same_unordered(&a.phases, &b.phases),
        _ => false,
    }
}

/// Lists every field of `fresh` that differs from `stored`. Income streams and
/// spending phases are matched by id, so reordering alone is not a change.
pub fn check_projection_staleness(
    stored: &ProjectionInput,
    fresh: &ProjectionInput,
) -> StalenessReport {
    let mut diff = FieldDiff::default();

    diff.compare("currentAge", &stored.current_age, &fresh.current_age);
    diff.compare("retirementAge", &stored.retirement_age, &fresh.retirement_age);
    diff.compare("maxAge", &stored.max_age, &fresh.max_age);
    diff.balances(&stored.current_balances, &fresh.current_balances);
    diff.compare(
        "annualContribution",
        &stored.annual_contribution,
        &fresh.annual_contribution,
    );
    diff.allocation(
        &stored.contribution_allocation,
        &fresh.contribution_allocation,
    );
    diff.compare("expectedReturn", &stored.expected_return, &fresh.expected_return);
    diff.compare("inflationRate", &stored.inflation_rate, &fresh.inflation_rate);
    diff.compare(
        "healthcareInflationRate",
        &stored.healthcare_inflation_rate,
        &fresh.healthcare_inflation_rate,
    );
    diff.compare(
        "contributionGrowthRate",
        &stored.contribution_growth_rate,
        &fresh.contribution_growth_rate,
    );
    diff.compare(
        "essentialExpenses",
        &stored.essential_expenses,
        &fresh.essential_expenses,
    );
    diff.compare(
        "discretionaryExpenses",
        &stored.discretionary_expenses,
        &fresh.discretionary_expenses,
    );
    diff.compare("healthcareCosts", &stored.healthcare_costs, &fresh.healthcare_costs);

    if !same_unordered(&stored.income_streams, &fresh.income_streams) {
        diff.record(
            "incomeStreams",
            &sorted_by_key(&stored.income_streams),
            &sorted_by_key(&fresh.income_streams),
        );
    }

    diff.compare(
        "annualDebtPayments",
        &stored.annual_debt_payments,
        &fresh.annual_debt_payments,
    );

    if !same_phase_config(
        stored.spending_phase_config.as_ref(),
        fresh.spending_phase_config.as_ref(),
    ) {
        diff.record(
            "spendingPhaseConfig",
            &stored.spending_phase_config,
            &fresh.spending_phase_config,
        );
    }

    diff.compare("rmdConfig", &stored.rmd_config, &fresh.rmd_config);
    diff.compare("reserveFloor", &stored.reserve_floor, &fresh.reserve_floor);

    let report = diff.finish();
    if report.is_stale {
        log::debug!(
            "projection inputs changed: {:?}",
            report
                .changed_fields
                .iter()
                .map(|c| c.field)
                .collect::<Vec<_>>()
        );
    }
    report
}
