use super::amortization::{amortization_schedule, annuity, roi, tax_deductions};
use super::deposit::{DepositSimulator, WithdrawalOptions};
use super::money::{Kopeks, round_rubles};
use super::rent::accumulated_indexed_rent_kopeks;
use super::types::{
    AmortizationRow, AnnuityParameters, ChartRow, Projection, ProjectionInput, RiskScenario,
    RoiInput, ScenarioPreset,
};
use super::verdict::{VerdictBenefitInput, calculate_compare_benefit, calculate_verdict_benefit};

pub const STAGNATION_DROP_PERCENT: f64 = 0.12;
pub const STAGNATION_MONTHS: u32 = 24;
pub const HYPERINFLATION_RENT_RATE: f64 = 0.15;
pub const DEFAULT_APPRECIATION_PERCENT: f64 = 6.0;

/// Market value of the property after `month` months under the risk overlay.
fn property_value(price: f64, appreciation_rate: f64, month: u32, scenario: RiskScenario) -> Kopeks {
    let years = month as f64 / 12.0;
    let value = match scenario {
        RiskScenario::Stagnation if month <= STAGNATION_MONTHS => {
            price * (1.0 - STAGNATION_DROP_PERCENT * month as f64 / STAGNATION_MONTHS as f64)
        }
        RiskScenario::Stagnation => {
            let floor = price * (1.0 - STAGNATION_DROP_PERCENT);
            let years_after = (month - STAGNATION_MONTHS) as f64 / 12.0;
            floor * (1.0 + appreciation_rate).powf(years_after)
        }
        RiskScenario::None | RiskScenario::Hyperinflation => {
            price * (1.0 + appreciation_rate).powf(years)
        }
    };
    Kopeks::from_rubles(value)
}

pub fn rent_indexation_rate(scenario: RiskScenario, rent_inflation_rate: f64) -> f64 {
    match scenario {
        RiskScenario::Hyperinflation => HYPERINFLATION_RENT_RATE,
        RiskScenario::None | RiskScenario::Stagnation => rent_inflation_rate,
    }
}

fn preset_schedule(preset: &ScenarioPreset) -> Vec<AmortizationRow> {
    amortization_schedule(&AnnuityParameters {
        principal: preset.loan_amount(),
        annual_rate: preset.rate_percent / 100.0,
        term_years: preset.term_years,
    })
}

/// One row per month of the mortgage term (`0..=term_years*12`), comparing the
/// owner's net equity against keeping the same capital on deposit.
pub fn build_chart_data_with_deposit(input: &ProjectionInput) -> Vec<ChartRow> {
    let appreciation_rate = input.appreciation_percent / 100.0;
    let rent_rate = rent_indexation_rate(input.risk_scenario, input.rent_inflation_rate);
    let rent_monthly = input.rent_monthly();
    let price = Kopeks::from_rubles(input.price);

    let params = input.annuity_parameters();
    let schedule = amortization_schedule(&params);
    let monthly_payment = Kopeks::from_rubles(annuity(&params).monthly_payment);

    let initial_total_capital = input.initial_total_capital();
    let initial_cash =
        Kopeks::from_rubles(initial_total_capital) - Kopeks::from_rubles(input.down_payment());

    let withdrawal = input
        .deposit_withdrawal
        .map(|policy| WithdrawalOptions::from_policy(policy, rent_monthly, rent_rate));
    let mut deposit = DepositSimulator::new(initial_total_capital, input.deposit_rate, withdrawal);

    let compare_schedule = input.compare_preset.map(|preset| (preset, preset_schedule(&preset)));

    let mut cumulative_interest = Kopeks::ZERO;
    let mut break_even_assigned = false;
    let mut rows = Vec::with_capacity(schedule.len());

    for row in &schedule {
        let month = row.month;
        let balance = Kopeks::from_rubles(row.balance);
        cumulative_interest += Kopeks::from_rubles(row.interest);

        let value = property_value(input.price, appreciation_rate, month, input.risk_scenario);
        let equity = (value - balance).floor_zero();
        let remaining_cash = (initial_cash - monthly_payment * month as i64).floor_zero();
        let saved_rent = accumulated_indexed_rent_kopeks(rent_monthly, month, Some(rent_rate));
        let net_equity = equity + remaining_cash + saved_rent;
        let deposit_balance = deposit.advance_to(month);

        let growth = value - price;
        let is_break_even = !break_even_assigned && growth + saved_rent > cumulative_interest;
        break_even_assigned |= is_break_even;

        let (balance_compare, net_equity_compare) = match &compare_schedule {
            Some((preset, compare_rows)) => match compare_rows.get(month as usize) {
                Some(compare_row) => {
                    let compare_balance = Kopeks::from_rubles(compare_row.balance);
                    let compare_value =
                        property_value(preset.price, appreciation_rate, month, input.risk_scenario);
                    (
                        Some(compare_row.balance),
                        Some((compare_value - compare_balance).floor_zero().to_rubles()),
                    )
                }
                None => (None, None),
            },
            None => (None, None),
        };

        rows.push(ChartRow {
            month,
            balance: row.balance,
            interest: row.interest,
            balance_compare,
            net_equity: net_equity.to_rubles(),
            deposit_accumulation: deposit_balance.to_rubles(),
            is_break_even,
            property_value_growth: growth.to_rubles(),
            saved_rent_indexed: saved_rent.to_rubles(),
            net_equity_compare,
        });
    }
    rows
}

/// Series plus the headline numbers derived from the same inputs.
pub fn run_projection(input: &ProjectionInput) -> Projection {
    let growth_rate = input.appreciation_percent / 100.0;
    let annuity = annuity(&input.annuity_parameters());
    let tax_deductions = tax_deductions(input.price, annuity.total_interest);
    let roi = roi(&RoiInput {
        price: input.price,
        down_payment: input.down_payment(),
        annual_rental_yield: input.rental_yield_percent / 100.0,
        expense_ratio: RoiInput::DEFAULT_EXPENSE_RATIO,
    });

    let rent_monthly = round_rubles(input.rent_monthly());
    let total_rent = round_rubles(input.rent_monthly() * 12.0 * input.term_years as f64);
    let final_value =
        round_rubles(input.price * (1.0 + growth_rate).powf(input.term_years as f64));

    let verdict_benefit = calculate_verdict_benefit(&VerdictBenefitInput {
        price: input.price,
        term_years: input.term_years,
        down_payment: input.down_payment(),
        total_payments: annuity.total_payment,
        total_rent,
        tax_refunds: tax_deductions.total_refund,
        growth_rate,
    });
    let compare = input.compare_preset.map(|preset| {
        calculate_compare_benefit(
            &preset,
            input.compare_rental_yield(),
            growth_rate,
            verdict_benefit,
        )
    });

    Projection {
        chart: build_chart_data_with_deposit(input),
        annuity,
        tax_deductions,
        roi,
        rent_monthly,
        total_rent,
        final_value,
        total_payments: annuity.total_payment,
        tax_refunds: tax_deductions.total_refund,
        verdict_benefit,
        compare,
    }
}
