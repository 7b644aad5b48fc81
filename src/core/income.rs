use serde::Serialize;

use super::types::IncomeStream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeForAge {
    pub total: f64,
    pub guaranteed: f64,
}

impl IncomeStream {
    pub fn is_active(&self, age: u32) -> bool {
        age >= self.start_age && self.end_age.is_none_or(|end| age <= end)
    }

    pub fn amount_for(&self, inflation_multiplier: f64) -> f64 {
        if self.inflation_adjusted {
            self.annual_amount * inflation_multiplier
        } else {
            self.annual_amount
        }
    }
}

pub fn aggregate_income(
    streams: &[IncomeStream],
    age: u32,
    inflation_multiplier: f64,
) -> IncomeForAge {
    streams
        .iter()
        .filter(|s| s.is_active(age))
        .fold(IncomeForAge::default(), |acc, stream| {
            let amount = stream.amount_for(inflation_multiplier);
            IncomeForAge {
                total: acc.total + amount,
                guaranteed: if stream.is_guaranteed {
                    acc.guaranteed + amount
                } else {
                    acc.guaranteed
                },
            }
        })
}

/// Guaranteed income over essential spending. Zero essentials count as
/// fully covered and report `f64::INFINITY`.
pub fn coverage_ratio(guaranteed_income: f64, essential_expenses: f64) -> f64 {
    if essential_expenses <= 0.0 {
        return f64::INFINITY;
    }
    guaranteed_income.max(0.0) / essential_expenses
}
