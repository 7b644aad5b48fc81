use super::types::{BalanceByType, RmdTracking};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Bucket {
    Taxable,
    TaxDeferred,
    TaxFree,
}

const WITHDRAWAL_ORDER: [Bucket; 3] = [Bucket::Taxable, Bucket::TaxDeferred, Bucket::TaxFree];

impl Bucket {
    fn balance(self, balances: &BalanceByType) -> f64 {
        match self {
            Bucket::Taxable => balances.taxable,
            Bucket::TaxDeferred => balances.tax_deferred,
            Bucket::TaxFree => balances.tax_free,
        }
    }

    fn slot(self, balances: &mut BalanceByType) -> &mut f64 {
        match self {
            Bucket::Taxable => &mut balances.taxable,
            Bucket::TaxDeferred => &mut balances.tax_deferred,
            Bucket::TaxFree => &mut balances.tax_free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalOutcome {
    pub withdrawals: BalanceByType,
    pub shortfall: f64,
}

impl WithdrawalOutcome {
    pub fn total(&self) -> f64 {
        self.withdrawals.total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmdWithdrawalOutcome {
    pub withdrawals: BalanceByType,
    pub shortfall: f64,
    pub rmd: RmdTracking,
}

impl RmdWithdrawalOutcome {
    pub fn total(&self) -> f64 {
        self.withdrawals.total()
    }
}

/// Draws `amount_needed` taxable, then tax-deferred, then tax-free, each
/// capped at what the bucket holds. The balances themselves are not touched.
pub fn withdraw_from_accounts(amount_needed: f64, balances: &BalanceByType) -> WithdrawalOutcome {
    let mut withdrawals = BalanceByType::default();
    let remaining = draw_in_order(amount_needed.max(0.0), balances, &mut withdrawals);
    WithdrawalOutcome {
        withdrawals,
        shortfall: remaining,
    }
}

/// Same order as [`withdraw_from_accounts`], but `rmd_required` is taken out of
/// the tax-deferred bucket before anything else.
pub fn withdraw_with_rmd(
    amount_needed: f64,
    balances: &BalanceByType,
    rmd_required: f64,
) -> RmdWithdrawalOutcome {
    let rmd_required = rmd_required.max(0.0);
    let rmd_taken = rmd_required.min(balances.tax_deferred.max(0.0));

    let mut withdrawals = BalanceByType {
        tax_deferred: rmd_taken,
        ..BalanceByType::default()
    };
    let remaining_balances = balances.saturating_sub(withdrawals);
    let still_needed = (amount_needed.max(0.0) - rmd_taken).max(0.0);
    let shortfall = draw_in_order(still_needed, &remaining_balances, &mut withdrawals);

    RmdWithdrawalOutcome {
        withdrawals,
        shortfall,
        rmd: RmdTracking {
            rmd_required,
            rmd_taken,
            excess_over_rmd: (withdrawals.total() - rmd_taken).max(0.0),
        },
    }
}

fn draw_in_order(amount: f64, available: &BalanceByType, withdrawals: &mut BalanceByType) -> f64 {
    let mut remaining = amount;
    for bucket in WITHDRAWAL_ORDER {
        if remaining <= 0.0 {
            break;
        }
        let taken = bucket.balance(available).max(0.0).min(remaining);
        *bucket.slot(withdrawals) += taken;
        remaining -= taken;
    }
    remaining.max(0.0)
}
