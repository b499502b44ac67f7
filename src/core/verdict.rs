use super::amortization::{annuity, tax_deductions};
use super::money::round_rubles;
use super::types::{AnnuityParameters, CompareBenefit, ScenarioPreset};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VerdictBenefitInput {
    pub price: f64,
    pub term_years: u32,
    pub down_payment: f64,
    pub total_payments: f64,
    pub total_rent: f64,
    pub tax_refunds: f64,
    pub growth_rate: f64,
}

/// Lifetime gain of buying: grown property plus collected rent and refunds, minus
/// everything paid in. Non-finite results collapse to zero.
pub fn calculate_verdict_benefit(input: &VerdictBenefitInput) -> f64 {
    let final_value = input.price * (1.0 + input.growth_rate).powf(input.term_years as f64);
    let raw = final_value + input.total_rent - input.total_payments - input.down_payment
        + input.tax_refunds;
    if raw.is_finite() { round_rubles(raw) } else { 0.0 }
}

pub fn preset_verdict_input(
    preset: &ScenarioPreset,
    rental_yield_percent: f64,
    growth_rate: f64,
) -> VerdictBenefitInput {
    let annuity = annuity(&AnnuityParameters {
        principal: preset.loan_amount(),
        annual_rate: preset.rate_percent / 100.0,
        term_years: preset.term_years,
    });
    let tax = tax_deductions(preset.price, annuity.total_interest);
    let rent_monthly = preset.price * (rental_yield_percent / 100.0) / 12.0;

    VerdictBenefitInput {
        price: preset.price,
        term_years: preset.term_years,
        down_payment: preset.down_payment(),
        total_payments: annuity.total_payment,
        total_rent: rent_monthly * 12.0 * preset.term_years as f64,
        tax_refunds: tax.total_refund,
        growth_rate,
    }
}

pub fn calculate_compare_benefit(
    preset: &ScenarioPreset,
    rental_yield_percent: f64,
    growth_rate: f64,
    main_benefit: f64,
) -> CompareBenefit {
    let compare = calculate_verdict_benefit(&preset_verdict_input(
        preset,
        rental_yield_percent,
        growth_rate,
    ));
    CompareBenefit {
        verdict_benefit_compare: compare,
        benefit_delta: round_rubles(main_benefit - compare),
    }
}
