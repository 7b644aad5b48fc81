use super::income::{aggregate_income, coverage_ratio};
use super::phases::calculate_phase_adjusted_expenses;
use super::reserve::{ReservePolicyOutcome, apply_reserve_floor};
use super::types::{
    BalanceByType, ExpenseBreakdown, ProjectionInput, ProjectionPhase, ProjectionRecord,
    ProjectionResult, ProjectionSummary, RmdTracking, round_cents,
};
use super::withdrawal::withdraw_with_rmd;

/// Running totals threaded from one year to the next. Each year step consumes
/// a state and yields the next one alongside that year's record.
#[derive(Debug, Clone, Copy)]
struct SimulationState {
    balances: BalanceByType,
    total_contributions: f64,
    total_withdrawals: f64,
    total_growth: f64,
    total_shortfall: f64,
    total_rmd_required: f64,
    total_discretionary_reduction: f64,
    depletion_age: Option<u32>,
    retirement_balance: Option<f64>,
    years_reserve_constrained: u32,
    first_reserve_constraint_age: Option<u32>,
}

impl SimulationState {
    fn initial(input: &ProjectionInput) -> Self {
        Self {
            balances: input.current_balances.clamped(),
            total_contributions: 0.0,
            total_withdrawals: 0.0,
            total_growth: 0.0,
            total_shortfall: 0.0,
            total_rmd_required: 0.0,
            total_discretionary_reduction: 0.0,
            depletion_age: None,
            retirement_balance: None,
            years_reserve_constrained: 0,
            first_reserve_constraint_age: None,
        }
    }
}

pub fn run_projection(input: &ProjectionInput) -> ProjectionResult {
    let initial = SimulationState::initial(input);
    let mut records =
        Vec::with_capacity(input.max_age.saturating_sub(input.current_age) as usize + 1);

    let last = (input.current_age..=input.max_age).fold(initial, |state, age| {
        let (next, record) = step(input, state, age);
        records.push(record);
        next
    });

    let summary = summarize(&initial, &last);
    ProjectionResult { records, summary }
}

fn step(
    input: &ProjectionInput,
    state: SimulationState,
    age: u32,
) -> (SimulationState, ProjectionRecord) {
    if age < input.retirement_age {
        accumulation_year(input, state, age)
    } else {
        drawdown_year(input, state, age)
    }
}

fn compound(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powi(years as i32)
}

fn contribution_for_year(input: &ProjectionInput, years_since_start: u32) -> f64 {
    let grown =
        input.annual_contribution * compound(input.contribution_growth_rate, years_since_start);
    (grown - input.annual_debt_payments).max(0.0)
}

/// Retirement spending inflates from the retirement age, or from today when
/// the household is already retired.
fn drawdown_start_age(input: &ProjectionInput) -> u32 {
    input.retirement_age.max(input.current_age)
}

fn accumulation_year(
    input: &ProjectionInput,
    state: SimulationState,
    age: u32,
) -> (SimulationState, ProjectionRecord) {
    let year_offset = age - input.current_age;
    let contribution = contribution_for_year(input, year_offset);

    let funded = state
        .balances
        .plus(input.contribution_allocation.split(contribution));
    let balances = funded.grown(input.expected_return);
    let growth = balances.total() - funded.total();

    let next = SimulationState {
        balances,
        total_contributions: state.total_contributions + contribution,
        total_growth: state.total_growth + growth,
        ..state
    };

    let record = ProjectionRecord {
        age,
        year_offset,
        phase: ProjectionPhase::Accumulation,
        balance: round_cents(balances.total()),
        balances: balances.rounded(),
        inflows: round_cents(contribution),
        outflows: 0.0,
        contribution: round_cents(contribution),
        investment_growth: round_cents(growth),
        withdrawals: BalanceByType::default(),
        total_withdrawal: 0.0,
        income: 0.0,
        guaranteed_income: 0.0,
        coverage_ratio: None,
        expenses: ExpenseBreakdown::default(),
        active_phase: None,
        reserve_constrained: false,
        reserve_stage: None,
        discretionary_reduction: 0.0,
        shortfall: 0.0,
        rmd: RmdTracking::default(),
        depleted: false,
    };

    (next, record)
}

fn drawdown_year(
    input: &ProjectionInput,
    state: SimulationState,
    age: u32,
) -> (SimulationState, ProjectionRecord) {
    let year_offset = age - input.current_age;
    let start_total = state.balances.total();
    let years_from_retirement = age - drawdown_start_age(input);
    let inflation_multiplier = compound(input.inflation_rate, years_from_retirement);
    let healthcare_multiplier = compound(input.healthcare_inflation_rate, years_from_retirement);

    let phase = calculate_phase_adjusted_expenses(
        age,
        input.essential_expenses,
        input.discretionary_expenses,
        input.spending_phase_config.as_ref(),
    );
    let essential = phase.essential.max(0.0) * inflation_multiplier;
    let discretionary = phase.discretionary.max(0.0) * inflation_multiplier;
    let healthcare = input.healthcare_costs.max(0.0) * healthcare_multiplier;
    let income = aggregate_income(&input.income_streams, age, inflation_multiplier);

    let reserve = input.reserve_floor.map(|floor| {
        reserve_policy(
            start_total,
            essential + healthcare,
            discretionary,
            income.total,
            floor,
        )
    });
    let spending_target = match &reserve {
        Some(outcome) => outcome.withdrawal,
        None => (essential + discretionary + healthcare - income.total).max(0.0),
    };

    // RMDs are sized on the prior year-end tax-deferred balance, which is the
    // balance carried into this step.
    let rmd_required = input
        .rmd_config
        .as_ref()
        .map_or(0.0, |config| config.required_for(state.balances.tax_deferred, age));
    let withdrawal = withdraw_with_rmd(
        spending_target.max(rmd_required),
        &state.balances,
        rmd_required,
    );

    let after_withdrawal = state.balances.saturating_sub(withdrawal.withdrawals);
    let balances = after_withdrawal.grown(input.expected_return);
    let growth = balances.total() - after_withdrawal.total();
    let end_total = balances.total();

    let essential_shortfall = reserve.map_or(0.0, |r| r.essential_shortfall);
    let discretionary_reduction = reserve.map_or(0.0, |r| r.discretionary_reduction);
    let shortfall = withdrawal.shortfall + essential_shortfall;
    let constrained = reserve.is_some_and(|r| r.is_constrained());
    let depletion_age = state
        .depletion_age
        .or_else(|| (end_total <= 0.0).then_some(age));

    let next = SimulationState {
        balances,
        total_withdrawals: state.total_withdrawals + withdrawal.total(),
        total_growth: state.total_growth + growth,
        total_shortfall: state.total_shortfall + shortfall,
        total_rmd_required: state.total_rmd_required + rmd_required,
        total_discretionary_reduction: state.total_discretionary_reduction
            + discretionary_reduction,
        depletion_age,
        retirement_balance: state.retirement_balance.or(Some(start_total)),
        years_reserve_constrained: state.years_reserve_constrained + u32::from(constrained),
        first_reserve_constraint_age: state
            .first_reserve_constraint_age
            .or_else(|| constrained.then_some(age)),
        ..state
    };

    let record = ProjectionRecord {
        age,
        year_offset,
        phase: ProjectionPhase::Drawdown,
        balance: round_cents(end_total),
        balances: balances.rounded(),
        inflows: round_cents(income.total),
        outflows: round_cents(withdrawal.total()),
        contribution: 0.0,
        investment_growth: round_cents(growth),
        withdrawals: withdrawal.withdrawals.rounded(),
        total_withdrawal: round_cents(withdrawal.total()),
        income: round_cents(income.total),
        guaranteed_income: round_cents(income.guaranteed),
        coverage_ratio: Some(coverage_ratio(income.guaranteed, essential))
            .filter(|ratio| ratio.is_finite()),
        expenses: ExpenseBreakdown {
            essential: round_cents(essential),
            discretionary: round_cents(discretionary),
            healthcare: round_cents(healthcare),
            total: round_cents(essential + discretionary + healthcare),
        },
        active_phase: phase.active_phase.map(|p| p.name.clone()),
        reserve_constrained: constrained,
        reserve_stage: reserve.map(|r| r.stage),
        discretionary_reduction: round_cents(discretionary_reduction),
        shortfall: round_cents(shortfall),
        rmd: RmdTracking {
            rmd_required: round_cents(withdrawal.rmd.rmd_required),
            rmd_taken: round_cents(withdrawal.rmd.rmd_taken),
            excess_over_rmd: round_cents(withdrawal.rmd.excess_over_rmd),
        },
        depleted: depletion_age.is_some(),
    };

    (next, record)
}

/// Healthcare is treated as essential. Income first covers essentials; any
/// surplus then offsets discretionary spending.
fn reserve_policy(
    total_balance: f64,
    essential_total: f64,
    discretionary: f64,
    income: f64,
    reserve_floor: f64,
) -> ReservePolicyOutcome {
    let essential_need = (essential_total - income).max(0.0);
    let surplus = (income - essential_total).max(0.0);
    let discretionary_need = (discretionary - surplus).max(0.0);
    apply_reserve_floor(total_balance, essential_need, discretionary_need, reserve_floor)
}

fn summarize(initial: &SimulationState, last: &SimulationState) -> ProjectionSummary {
    // Retirement past the horizon is never observed; fall back to the final balance.
    let retirement_balance = last.retirement_balance.unwrap_or(last.balances.total());

    ProjectionSummary {
        starting_balance: round_cents(initial.balances.total()),
        ending_balance: round_cents(last.balances.total()),
        total_contributions: round_cents(last.total_contributions),
        total_withdrawals: round_cents(last.total_withdrawals),
        total_investment_growth: round_cents(last.total_growth),
        total_shortfall: round_cents(last.total_shortfall),
        total_rmd_required: round_cents(last.total_rmd_required),
        depletion_age: last.depletion_age,
        projected_retirement_balance: round_cents(retirement_balance),
        years_reserve_constrained: last.years_reserve_constrained,
        first_reserve_constraint_age: last.first_reserve_constraint_age,
        total_discretionary_reduction: round_cents(last.total_discretionary_reduction),
    }
}
