//! Bank deposit balance, month by month.
//!
//! The first `DEPOSIT_PHASE_MONTHS` months earn the quoted bank rate. After that
//! the deposit earns `TARGET_DEPOSIT_RATE_AFTER_PHASE` scaled by
//! `TAX_DRAG_COEFFICIENT`, continuing from the balance reached at the end of the
//! first phase. In withdrawal mode the depositor also pays an indexed rent out of
//! the balance and settles interest tax once a year.

use super::money::Kopeks;
use super::types::WithdrawalPolicy;

pub const DEPOSIT_PHASE_MONTHS: u32 = 36;
pub const TAX_DRAG_COEFFICIENT: f64 = 0.85;
pub const TARGET_DEPOSIT_RATE_AFTER_PHASE: f64 = 0.08;
pub const DEPOSIT_TAX_RATE: f64 = 0.13;
pub const DEPOSIT_INTEREST_EXEMPTION_PER_YEAR_RUB: f64 = 180_000.0;

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self {
            tax_rate: DEPOSIT_TAX_RATE,
            exemption_per_year_rub: DEPOSIT_INTEREST_EXEMPTION_PER_YEAR_RUB,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WithdrawalOptions {
    pub rent_monthly_base: f64,
    pub inflation_rate: f64,
    pub tax_rate: f64,
    pub exemption_per_year_rub: f64,
}

impl WithdrawalOptions {
    pub fn from_policy(policy: WithdrawalPolicy, rent_monthly_base: f64, inflation_rate: f64) -> Self {
        Self {
            rent_monthly_base,
            inflation_rate,
            tax_rate: policy.tax_rate,
            exemption_per_year_rub: policy.exemption_per_year_rub,
        }
    }

    fn rent_for_month(&self, month: u32) -> Kopeks {
        let year_index = ((month - 1) / 12) as f64;
        Kopeks::from_rubles(self.rent_monthly_base * (1.0 + self.inflation_rate).powf(year_index))
    }
}

pub fn monthly_deposit_rate(bank_rate: f64, month: u32) -> f64 {
    if month <= DEPOSIT_PHASE_MONTHS {
        bank_rate / 12.0
    } else {
        TARGET_DEPOSIT_RATE_AFTER_PHASE / 12.0 * TAX_DRAG_COEFFICIENT
    }
}

/// Stateful deposit that advances one month per `step`.
#[derive(Debug, Clone)]
pub struct DepositSimulator {
    bank_rate: f64,
    options: Option<WithdrawalOptions>,
    month: u32,
    balance: Kopeks,
    interest_this_year: Kopeks,
}

impl DepositSimulator {
    pub fn new(initial_capital: f64, bank_rate: f64, options: Option<WithdrawalOptions>) -> Self {
        Self {
            bank_rate,
            options,
            month: 0,
            balance: Kopeks::from_rubles(initial_capital),
            interest_this_year: Kopeks::ZERO,
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn balance(&self) -> Kopeks {
        self.balance
    }

    pub fn step(&mut self) -> Kopeks {
        self.month += 1;
        let interest = self
            .balance
            .scale(monthly_deposit_rate(self.bank_rate, self.month));
        self.balance += interest;

        if let Some(options) = self.options {
            self.interest_this_year += interest;
            self.balance = (self.balance - options.rent_for_month(self.month)).floor_zero();

            if self.month % 12 == 0 {
                let taxable = (self.interest_this_year
                    - Kopeks::from_rubles(options.exemption_per_year_rub))
                .floor_zero();
                let tax = taxable.scale(options.tax_rate);
                self.balance = (self.balance - tax).floor_zero();
                self.interest_this_year = Kopeks::ZERO;
            }
        }
        self.balance
    }

    pub fn advance_to(&mut self, month: u32) -> Kopeks {
        while self.month < month {
            self.step();
        }
        self.balance
    }
}

/// Deposit balance after `month` months. Without `options` this is pure
/// compounding.
pub fn deposit_accumulation(
    initial_capital: f64,
    bank_rate: f64,
    month: u32,
    options: Option<&WithdrawalOptions>,
) -> f64 {
    DepositSimulator::new(initial_capital, bank_rate, options.copied())
        .advance_to(month)
        .to_rubles()
}
