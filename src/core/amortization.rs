use super::money::{Kopeks, round_2dp, round_rubles};
use super::types::{
    AmortizationRow, AnnuityParameters, AnnuityResult, CashflowRoiInput, CashflowRoiResult,
    RentComparison, RentComparisonInput, RoiInput, RoiResult, TaxDeductionResult,
};

pub const INCOME_TAX_RATE: f64 = 0.13;
pub const PROPERTY_DEDUCTION_LIMIT: f64 = 2_000_000.0;
pub const MORTGAGE_INTEREST_DEDUCTION_LIMIT: f64 = 3_000_000.0;
pub const PROPERTY_REFUND_CAP: f64 = 260_000.0;
pub const INTEREST_REFUND_CAP: f64 = 390_000.0;

const CASHFLOW_EXPENSE_SHARE: f64 = 0.2;
const CASHFLOW_PROPERTY_GROWTH_RATE: f64 = 0.05;

fn payment_count(term_years: u32) -> u32 {
    term_years.saturating_mul(12)
}

// Negative rates are treated as interest-free.
fn monthly_rate(annual_rate: f64) -> f64 {
    if annual_rate.is_finite() && annual_rate > 0.0 {
        annual_rate / 12.0
    } else {
        0.0
    }
}

fn monthly_payment(principal: f64, r: f64, n: u32) -> Kopeks {
    let payment = if r == 0.0 {
        principal / n as f64
    } else {
        let growth = (1.0 + r).powf(n as f64);
        principal * r * growth / (growth - 1.0)
    };
    Kopeks::from_rubles(payment)
}

pub fn annuity(params: &AnnuityParameters) -> AnnuityResult {
    if params.principal <= 0.0 || params.term_years == 0 {
        return AnnuityResult::default();
    }
    let n = payment_count(params.term_years);
    let r = monthly_rate(params.annual_rate);
    let principal = Kopeks::from_rubles(params.principal);
    let monthly = monthly_payment(params.principal, r, n);
    let total = monthly * n as i64;

    AnnuityResult {
        monthly_payment: monthly.to_rubles(),
        total_payment: total.to_rubles(),
        total_interest: (total - principal).to_rubles(),
    }
}

/// Property and mortgage-interest deductions.
///
/// Each base is limited first (2M / 3M), then each refund is limited again to its
/// statutory ceiling (260k / 390k).
pub fn tax_deductions(purchase_price: f64, total_interest_paid: f64) -> TaxDeductionResult {
    let property_base =
        Kopeks::from_rubles(purchase_price).min(Kopeks::from_rubles(PROPERTY_DEDUCTION_LIMIT));
    let interest_base = Kopeks::from_rubles(total_interest_paid)
        .min(Kopeks::from_rubles(MORTGAGE_INTEREST_DEDUCTION_LIMIT));

    let property_refund = property_base
        .scale(INCOME_TAX_RATE)
        .min(Kopeks::from_rubles(PROPERTY_REFUND_CAP))
        .floor_zero();
    let interest_refund = interest_base
        .scale(INCOME_TAX_RATE)
        .min(Kopeks::from_rubles(INTEREST_REFUND_CAP))
        .floor_zero();

    TaxDeductionResult {
        property_refund: property_refund.to_rubles(),
        interest_refund: interest_refund.to_rubles(),
        total_refund: (property_refund + interest_refund).to_rubles(),
    }
}

pub fn calculate_tax_benefits(purchase_price: f64, total_interest_paid: f64) -> f64 {
    tax_deductions(purchase_price, total_interest_paid).total_refund
}

/// Month-by-month balance and interest, months `0..=term_years*12`.
///
/// Row `m` holds the balance after the `m`-th payment and the interest charged on
/// the previous balance. Month 0 is the loan as issued.
pub fn amortization_schedule(params: &AnnuityParameters) -> Vec<AmortizationRow> {
    let n = payment_count(params.term_years);
    let r = monthly_rate(params.annual_rate);
    let monthly = Kopeks::from_rubles(annuity(params).monthly_payment);
    let mut balance = Kopeks::from_rubles(params.principal).floor_zero();

    let mut schedule = Vec::with_capacity(n as usize + 1);
    schedule.push(AmortizationRow {
        month: 0,
        balance: balance.to_rubles(),
        interest: 0.0,
    });

    for month in 1..=n {
        let interest = balance.scale(r);
        let principal_paid = monthly - interest;
        balance = (balance - principal_paid).floor_zero();
        schedule.push(AmortizationRow {
            month,
            balance: balance.to_rubles(),
            interest: interest.to_rubles(),
        });
    }
    schedule
}

/// Rental return on the cash actually invested (the down payment).
pub fn roi(input: &RoiInput) -> RoiResult {
    let annual_rental_income = input.price * input.annual_rental_yield;
    let annual_expenses = annual_rental_income * input.expense_ratio;
    let net_annual_income = annual_rental_income - annual_expenses;
    let investment = input.down_payment;

    let roi_percent = if investment > 0.0 {
        net_annual_income / investment * 100.0
    } else {
        0.0
    };
    let payback_years = if net_annual_income > 0.0 {
        round_2dp(investment / net_annual_income)
    } else {
        f64::INFINITY
    };

    RoiResult {
        annual_rental_income: round_rubles(annual_rental_income),
        annual_expenses: round_rubles(annual_expenses),
        net_annual_income: round_rubles(net_annual_income),
        investment: round_rubles(investment),
        roi_percent: round_2dp(roi_percent),
        payback_years,
    }
}

/// Cash-flow ROI against the full object price, plus a fixed 5% appreciation
/// component.
pub fn cashflow_roi(input: &CashflowRoiInput) -> CashflowRoiResult {
    if input.object_price <= 0.0 {
        return CashflowRoiResult::default();
    }
    let annual_gross_rent = input.monthly_rent * 12.0;
    let expenses = input
        .annual_taxes_and_expenses
        .unwrap_or(annual_gross_rent * CASHFLOW_EXPENSE_SHARE);
    let annual_cashflow = annual_gross_rent - expenses;
    let annual_appreciation = input.object_price * CASHFLOW_PROPERTY_GROWTH_RATE;

    CashflowRoiResult {
        roi_percent: round_2dp(annual_cashflow / input.object_price * 100.0),
        annual_cashflow: round_rubles(annual_cashflow),
        total_annual_return_percent: round_2dp(
            (annual_cashflow + annual_appreciation) / input.object_price * 100.0,
        ),
        annual_appreciation: round_rubles(annual_appreciation),
    }
}

/// Rent paid over the term (indexed yearly) against the owner's grown property.
pub fn compare_with_rent(input: &RentComparisonInput) -> RentComparison {
    let years = input.term_years as f64;
    let annual_rent = input.monthly_rent * 12.0;
    let rent_total = if input.term_years == 0 {
        0.0
    } else if input.inflation_rate == 0.0 {
        annual_rent * years
    } else {
        annual_rent * ((1.0 + input.inflation_rate).powf(years) - 1.0) / input.inflation_rate
    };
    let property_equity =
        input.current_property_price * (1.0 + input.property_growth_rate).powf(years);

    RentComparison {
        rent_total: round_rubles(rent_total),
        property_equity: round_rubles(property_equity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn params(principal: f64, annual_rate: f64, term_years: u32) -> AnnuityParameters {
        AnnuityParameters {
            principal,
            annual_rate,
            term_years,
        }
    }

    #[test]
    fn annuity_matches_reference_mortgage() {
        // 10M price, 20% down, 18% for 20 years.
        let result = annuity(&params(8_000_000.0, 0.18, 20));
        assert_eq!(result.monthly_payment, 123_464.92);
        assert_eq!(result.total_payment, 29_631_580.8);
        assert_eq!(result.total_interest, 21_631_580.8);
    }

    #[test]
    fn annuity_zero_rate_is_linear() {
        let result = annuity(&params(1_200_000.0, 0.0, 10));
        assert_eq!(result.monthly_payment, 10_000.0);
        assert_eq!(result.total_payment, 1_200_000.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[test]
    fn annuity_negative_rate_falls_back_to_linear() {
        let result = annuity(&params(1_200_000.0, -0.05, 10));
        assert_eq!(result.monthly_payment, 10_000.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[test]
    fn annuity_degenerate_inputs_are_zero() {
        assert_eq!(annuity(&params(0.0, 0.18, 20)), AnnuityResult::default());
        assert_eq!(annuity(&params(-5.0, 0.18, 20)), AnnuityResult::default());
        assert_eq!(annuity(&params(1_000_000.0, 0.18, 0)), AnnuityResult::default());
    }

    #[test]
    fn schedule_hand_calculation_one_year_loan() {
        let schedule = amortization_schedule(&params(12_000.0, 0.12, 1));
        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule[0].balance, 12_000.0);
        assert_eq!(schedule[0].interest, 0.0);
        // Payment 1066.19; month 1 interest 120.00 on 12000.
        assert_eq!(schedule[1].interest, 120.0);
        assert_eq!(schedule[1].balance, 11_053.81);
        assert_eq!(schedule[2].interest, 110.54);
        assert_eq!(schedule[12].balance, 0.0);
        assert_eq!(schedule[12].interest, 10.56);
    }

    #[test]
    fn schedule_reference_mortgage_ends_near_zero() {
        let schedule = amortization_schedule(&params(8_000_000.0, 0.18, 20));
        assert_eq!(schedule.len(), 241);
        assert_eq!(schedule[1].interest, 120_000.0);
        let last = schedule[240];
        assert_eq!(last.month, 240);
        assert!(last.balance < 10.0, "residual balance {}", last.balance);
    }

    #[test]
    fn schedule_zero_principal_is_flat_zero() {
        let schedule = amortization_schedule(&params(0.0, 0.18, 2));
        assert_eq!(schedule.len(), 25);
        assert!(schedule.iter().all(|row| row.balance == 0.0 && row.interest == 0.0));
    }

    #[test]
    fn tax_deductions_both_caps_bind() {
        let result = tax_deductions(10_000_000.0, 5_000_000.0);
        assert_eq!(result.property_refund, 260_000.0);
        assert_eq!(result.interest_refund, 390_000.0);
        assert_eq!(result.total_refund, 650_000.0);
    }

    #[test]
    fn tax_deductions_below_caps_are_proportional() {
        let result = tax_deductions(1_000_000.0, 100_000.0);
        assert_eq!(result.property_refund, 130_000.0);
        assert_eq!(result.interest_refund, 13_000.0);
        assert_eq!(calculate_tax_benefits(1_000_000.0, 100_000.0), 143_000.0);
    }

    #[test]
    fn roi_reference_values() {
        let result = roi(&RoiInput {
            price: 10_000_000.0,
            down_payment: 2_000_000.0,
            annual_rental_yield: 0.06,
            expense_ratio: RoiInput::DEFAULT_EXPENSE_RATIO,
        });
        assert_eq!(result.annual_rental_income, 600_000.0);
        assert_eq!(result.annual_expenses, 120_000.0);
        assert_eq!(result.net_annual_income, 480_000.0);
        assert_eq!(result.investment, 2_000_000.0);
        assert_eq!(result.roi_percent, 24.0);
        assert_eq!(result.payback_years, 4.17);
    }

    #[test]
    fn roi_without_income_never_pays_back() {
        let result = roi(&RoiInput {
            price: 10_000_000.0,
            down_payment: 0.0,
            annual_rental_yield: 0.0,
            expense_ratio: 0.2,
        });
        assert_eq!(result.roi_percent, 0.0);
        assert!(!result.payback_years.is_finite());
    }

    #[test]
    fn cashflow_roi_defaults_expenses_to_twenty_percent() {
        let result = cashflow_roi(&CashflowRoiInput {
            monthly_rent: 50_000.0,
            object_price: 10_000_000.0,
            annual_taxes_and_expenses: None,
        });
        assert_eq!(result.annual_cashflow, 480_000.0);
        assert_eq!(result.roi_percent, 4.8);
        assert_eq!(result.annual_appreciation, 500_000.0);
        assert_eq!(result.total_annual_return_percent, 9.8);

        let zero = cashflow_roi(&CashflowRoiInput {
            monthly_rent: 50_000.0,
            object_price: 0.0,
            annual_taxes_and_expenses: Some(10.0),
        });
        assert_eq!(zero, CashflowRoiResult::default());
    }

    #[test]
    fn compare_with_rent_indexes_rent_and_grows_property() {
        let result = compare_with_rent(&RentComparisonInput {
            monthly_rent: 10_000.0,
            term_years: 2,
            current_property_price: 1_000_000.0,
            inflation_rate: 0.04,
            property_growth_rate: 0.05,
        });
        // 120000 + 124800
        assert_eq!(result.rent_total, 244_800.0);
        assert_eq!(result.property_equity, 1_102_500.0);

        let flat = compare_with_rent(&RentComparisonInput {
            monthly_rent: 10_000.0,
            term_years: 3,
            current_property_price: 0.0,
            inflation_rate: 0.0,
            property_growth_rate: 0.05,
        });
        assert_eq!(flat.rent_total, 360_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_schedule_is_monotone_and_nearly_amortized(
            principal_k in 100_000u32..50_000_000,
            rate_bp in 0u32..2_400,
            term_years in 1u32..31
        ) {
            let p = params(principal_k as f64, rate_bp as f64 / 10_000.0, term_years);
            let result = annuity(&p);
            let schedule = amortization_schedule(&p);
            prop_assert!(schedule.len() == (term_years * 12 + 1) as usize);

            let summed: f64 = (0..term_years * 12).map(|_| result.monthly_payment).sum();
            prop_assert!((summed - result.total_payment).abs() <= 0.01 * (term_years * 12) as f64);

            for pair in schedule.windows(2) {
                prop_assert!(pair[0].balance >= pair[1].balance);
                prop_assert!(pair[1].interest >= 0.0);
            }
            let last = schedule[schedule.len() - 1];
            prop_assert!(last.balance <= result.monthly_payment * 0.2);
        }

        #[test]
        fn prop_zero_rate_payment_is_principal_over_months(
            principal_k in 1_000u32..50_000_000,
            term_years in 1u32..31
        ) {
            let p = params(principal_k as f64, 0.0, term_years);
            let result = annuity(&p);
            let n = (term_years * 12) as f64;
            prop_assert!((result.monthly_payment - principal_k as f64 / n).abs() <= 0.005 + 1e-9);
            prop_assert!(result.total_interest.abs() <= 0.01 * n);
        }
    }

    #[test]
    fn schedule_interest_sum_tracks_total_interest() {
        let p = params(8_000_000.0, 0.18, 20);
        let schedule = amortization_schedule(&p);
        let interest: f64 = schedule.iter().map(|row| row.interest).sum();
        assert_approx_tol(interest, annuity(&p).total_interest, 10.0);
    }
}
