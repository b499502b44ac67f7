use super::money::Kopeks;

/// Default yearly rent indexation.
pub const RENT_INFLATION_RATE: f64 = 0.05;

/// Growth factor of a rent stream that is flat within each 12-month block and
/// steps up by `1 + rate` at every anniversary.
fn indexed_rent_factor(months: u32, rate: f64) -> f64 {
    if rate == 0.0 {
        return months as f64;
    }
    let full_years = (months / 12) as f64;
    let rem_months = (months % 12) as f64;
    let step = (1.0 + rate).powf(full_years);
    12.0 * (step - 1.0) / rate + rem_months * step
}

/// Total rent saved over `months`, indexed once a year.
pub fn accumulated_indexed_rent(rent_monthly_base: f64, months: u32, rate_override: Option<f64>) -> f64 {
    accumulated_indexed_rent_kopeks(rent_monthly_base, months, rate_override).to_rubles()
}

pub(crate) fn accumulated_indexed_rent_kopeks(
    rent_monthly_base: f64,
    months: u32,
    rate_override: Option<f64>,
) -> Kopeks {
    if months == 0 {
        return Kopeks::ZERO;
    }
    let rate = rate_override.unwrap_or(RENT_INFLATION_RATE);
    Kopeks::from_rubles(rent_monthly_base).scale(indexed_rent_factor(months, rate))
}
