//! Read-only analysis of a finished chart series: where the property overtakes the
//! deposit, who is ahead at the horizon, and the short texts shown next to the chart.

use super::deposit::DEPOSIT_PHASE_MONTHS;
use super::money::round_rubles;
use super::types::{
    ChartRow, ComparisonVerdict, ExpertConclusion, FinancialVerdict, Leader, Locale,
    SmartInsights, WinningStrategy,
};

pub const HORIZON_MONTHS: u32 = 240;
pub const SMART_INSIGHT_HORIZON_MONTHS: u32 = 120;
pub const RENT_REINVEST_RATE: f64 = 0.08;
pub const MIN_RATIO_TIMES: f64 = 1.1;

const PEAK_SEARCH_FROM_MONTH: u32 = 24;
const DEPOSIT_DISCLAIMER_MULTIPLE: f64 = 10.0;

fn year_of_month(month: u32) -> u32 {
    month.div_ceil(12)
}

fn within(rows: &[ChartRow], horizon_months: u32) -> &[ChartRow] {
    let end = rows.partition_point(|row| row.month <= horizon_months);
    &rows[..end]
}

fn first_crossover(rows: &[ChartRow]) -> Option<u32> {
    rows.iter()
        .find(|row| row.month > 0 && row.net_equity >= row.deposit_accumulation)
        .map(|row| row.month)
}

/// Month of the deposit's running maximum, reported only when a later month
/// falls below it.
fn deposit_inflection(rows: &[ChartRow]) -> Option<u32> {
    if rows.len() < 2 {
        return None;
    }
    let mut peak_index = 0;
    for (index, row) in rows.iter().enumerate() {
        if row.deposit_accumulation > rows[peak_index].deposit_accumulation {
            peak_index = index;
        }
    }
    let peak = rows[peak_index].deposit_accumulation;
    rows[peak_index + 1..]
        .iter()
        .any(|row| row.deposit_accumulation < peak)
        .then_some(rows[peak_index].month)
}

pub fn generate_expert_conclusion(rows: &[ChartRow], horizon_months: u32) -> ExpertConclusion {
    let rows = within(rows, horizon_months);
    let crossover_point_month = first_crossover(rows);

    let (final_net_equity, final_deposit) = rows
        .last()
        .map_or((0.0, 0.0), |row| (row.net_equity, row.deposit_accumulation));
    let final_advantage_rub = round_rubles(final_net_equity - final_deposit);
    let winning_strategy = if final_advantage_rub >= 0.0 {
        WinningStrategy::Mortgage
    } else {
        WinningStrategy::Deposit
    };

    let mut yield_peak_month = None;
    let mut yield_peak_gap_rub = 0.0;
    for row in rows
        .iter()
        .filter(|row| (1..=DEPOSIT_PHASE_MONTHS).contains(&row.month))
    {
        let gap = round_rubles(row.deposit_accumulation - row.net_equity);
        if gap > yield_peak_gap_rub {
            yield_peak_gap_rub = gap;
            yield_peak_month = Some(row.month);
        }
    }

    let inflection_month = deposit_inflection(rows);

    ExpertConclusion {
        horizon_years: rows.last().map_or(0, |row| year_of_month(row.month)),
        crossover_point_month,
        crossover_point_year: crossover_point_month.map(year_of_month),
        final_advantage_rub,
        winning_strategy,
        yield_peak_month,
        yield_peak_gap_rub,
        final_net_equity,
        final_deposit,
        inflection_month,
        inflection_year: inflection_month.map(year_of_month),
    }
}

/// Strict crossover, horizon advantage in millions and the number of months the
/// deposit stays ahead.
pub fn financial_verdict(rows: &[ChartRow], horizon_months: u32) -> FinancialVerdict {
    let rows = within(rows, horizon_months);
    let cross_over_month = rows
        .iter()
        .find(|row| row.month > 0 && row.net_equity > row.deposit_accumulation)
        .map(|row| row.month);

    let at_horizon = rows
        .iter()
        .find(|row| row.month == horizon_months)
        .or(rows.last());
    let final_advantage = at_horizon
        .map_or(0.0, |row| (row.net_equity - row.deposit_accumulation) / 1_000_000.0);

    let peak_deposit_period = rows
        .iter()
        .filter(|row| row.deposit_accumulation > row.net_equity)
        .count() as u32;

    FinancialVerdict {
        cross_over_month,
        final_advantage,
        peak_deposit_period,
    }
}

fn rent_stream_future_value(rent_monthly: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return rent_monthly * months as f64;
    }
    rent_monthly * ((1.0 + monthly_rate).powf(months as f64) - 1.0) / monthly_rate
}

pub fn smart_insights(
    rows: &[ChartRow],
    term_years: u32,
    initial_total_capital: f64,
    rent_monthly: f64,
) -> SmartInsights {
    let horizon_years = term_years.min(SMART_INSIGHT_HORIZON_MONTHS / 12);
    let window = within(rows, SMART_INSIGHT_HORIZON_MONTHS);
    let Some(last) = window.last() else {
        return SmartInsights {
            ratio_times: MIN_RATIO_TIMES,
            horizon_years,
            payback_months: None,
            peak_month: None,
            show_deposit_disclaimer: false,
            show_rent_capitalization: false,
            rent_capitalization_percent: 0.0,
        };
    };

    let ratio = last.net_equity / last.deposit_accumulation;
    let ratio_times = if last.deposit_accumulation == 0.0 || !ratio.is_finite() || ratio <= 0.0 {
        MIN_RATIO_TIMES
    } else {
        ratio
    };

    let payback_months = window
        .iter()
        .find(|row| row.is_break_even)
        .map(|row| row.month);

    let mut best_diff = f64::NEG_INFINITY;
    let mut peak_month = None;
    for row in window.iter().filter(|row| row.month >= PEAK_SEARCH_FROM_MONTH) {
        let diff = row.net_equity - row.deposit_accumulation;
        if diff > best_diff {
            best_diff = diff;
            peak_month = Some(row.month);
        }
    }

    let show_deposit_disclaimer = rows.last().is_some_and(|end| {
        end.deposit_accumulation > 0.0
            && end.deposit_accumulation > DEPOSIT_DISCLAIMER_MULTIPLE * end.net_equity
    });

    let mut rent_capitalization_percent = 0.0;
    if initial_total_capital > 0.0
        && rent_monthly > 0.0
        && last.deposit_accumulation > last.net_equity
    {
        let months = SMART_INSIGHT_HORIZON_MONTHS;
        let reinvested = rent_stream_future_value(rent_monthly, RENT_REINVEST_RATE / 12.0, months);
        let extra = reinvested - rent_monthly * months as f64;
        let years = (months / 12) as f64;
        rent_capitalization_percent = extra / initial_total_capital / years * 100.0;
    }
    let show_rent_capitalization =
        rent_capitalization_percent > 0.0 && rent_capitalization_percent.is_finite();

    SmartInsights {
        ratio_times,
        horizon_years,
        payback_months,
        peak_month,
        show_deposit_disclaimer,
        show_rent_capitalization,
        rent_capitalization_percent: if show_rent_capitalization {
            rent_capitalization_percent
        } else {
            0.0
        },
    }
}

/// Head-to-head of two property series. Ties go to `a`.
pub fn generate_comparison_verdict(
    a: &[ChartRow],
    b: &[ChartRow],
    roi_a_percent: f64,
    roi_b_percent: f64,
) -> ComparisonVerdict {
    let final_net_equity_a = a.last().map_or(0.0, |row| row.net_equity);
    let final_net_equity_b = b.last().map_or(0.0, |row| row.net_equity);
    let (leader, best) = if final_net_equity_a >= final_net_equity_b {
        (Leader::A, a)
    } else {
        (Leader::B, b)
    };
    let crossover_point_month = first_crossover(best);

    ComparisonVerdict {
        leader,
        final_net_equity_a,
        final_net_equity_b,
        capital_diff_millions: (final_net_equity_a - final_net_equity_b).abs() / 1_000_000.0,
        roi_diff_percent: roi_a_percent - roi_b_percent,
        crossover_point_month,
        crossover_point_year: crossover_point_month.map(year_of_month),
    }
}

pub fn format_millions(value: f64, locale: Locale) -> String {
    let unit = match locale {
        Locale::Ru => "млн ₽",
        Locale::En => "M ₽",
    };
    let millions = value / 1_000_000.0;
    if millions.abs() < 0.01 {
        return format!("0 {unit}");
    }
    let sign = if millions < 0.0 { "−" } else { "" };
    format!("{sign}{:.2} {unit}", millions.abs())
}

fn years_word(years: u32, locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => match (years % 10, years % 100) {
            (1, rem) if rem != 11 => "год",
            (2..=4, rem) if !(12..=14).contains(&rem) => "года",
            _ => "лет",
        },
        Locale::En if years == 1 => "year",
        Locale::En => "years",
    }
}

pub fn conclusion_message(conclusion: &ExpertConclusion, locale: Locale) -> String {
    let horizon_years = conclusion.horizon_years;
    let horizon_word = years_word(horizon_years, locale);
    let advantage = format_millions(conclusion.final_advantage_rub.abs(), locale);
    match locale {
        Locale::Ru => {
            let strategy = match conclusion.winning_strategy {
                WinningStrategy::Mortgage => "недвижимость",
                WinningStrategy::Deposit => "вклад",
            };
            let crossover = conclusion
                .crossover_point_year
                .map_or_else(|| "не достигнута".to_string(), |year| format!("{year} год"));
            format!(
                "На горизонте {horizon_years} {horizon_word} стратегия «{strategy}» выгоднее на {advantage}. \
                 Точка окупаемости банковских процентов: {crossover}."
            )
        }
        Locale::En => {
            let strategy = match conclusion.winning_strategy {
                WinningStrategy::Mortgage => "property",
                WinningStrategy::Deposit => "deposit",
            };
            let crossover = conclusion
                .crossover_point_year
                .map_or_else(|| "not reached".to_string(), |year| format!("year {year}"));
            format!(
                "Over {horizon_years} {horizon_word}, «{strategy}» is ahead by {advantage}. \
                 Deposit interest payback point: {crossover}."
            )
        }
    }
}

/// Shown when indexed rent starts eating into the deposit principal.
pub fn inflation_warning(conclusion: &ExpertConclusion, locale: Locale) -> Option<String> {
    let year = conclusion.inflection_year?;
    Some(match locale {
        Locale::Ru => format!(
            "Внимание: на {year}-м году расходы на индексируемую аренду превышают доходность вклада. \
             Система начинает изымать средства из тела депозита для оплаты жилья."
        ),
        Locale::En => format!(
            "Warning: in year {year} indexed rent exceeds the deposit yield. \
             From then on rent is paid out of the deposit principal."
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::build_chart_data_with_deposit;
    use crate::core::types::{ProjectionInput, RiskScenario, WithdrawalPolicy};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn row(month: u32, net_equity: f64, deposit_accumulation: f64) -> ChartRow {
        ChartRow {
            month,
            balance: 0.0,
            interest: 0.0,
            balance_compare: None,
            net_equity,
            deposit_accumulation,
            is_break_even: false,
            property_value_growth: 0.0,
            saved_rent_indexed: 0.0,
            net_equity_compare: None,
        }
    }

    fn reference_input() -> ProjectionInput {
        ProjectionInput {
            price: 10_000_000.0,
            down_percent: 20.0,
            rate_percent: 18.0,
            term_years: 20,
            rental_yield_percent: 6.0,
            appreciation_percent: 6.0,
            rent_inflation_rate: 0.05,
            deposit_rate: 0.18,
            deposit_withdrawal: Some(WithdrawalPolicy::default()),
            risk_scenario: RiskScenario::None,
            compare_preset: None,
            compare_rental_yield_percent: None,
            initial_total_capital_override: None,
        }
    }

    #[test]
    fn reference_conclusion() {
        let rows = build_chart_data_with_deposit(&reference_input());
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(conclusion.horizon_years, 20);
        assert_eq!(conclusion.crossover_point_month, Some(96));
        assert_eq!(conclusion.crossover_point_year, Some(8));
        assert_eq!(conclusion.winning_strategy, WinningStrategy::Mortgage);
        assert_eq!(conclusion.yield_peak_month, Some(35));
        assert!((conclusion.yield_peak_gap_rub - 4_322_820.44).abs() <= 0.01);
        assert!((conclusion.final_net_equity - 51_910_921.84).abs() <= 0.01);
        assert!((conclusion.final_deposit - 9_391_750.47).abs() <= 0.01);
        assert!((conclusion.final_advantage_rub - 42_519_171.37).abs() <= 0.01);
        assert_eq!(conclusion.inflection_month, Some(95));
        assert_eq!(conclusion.inflection_year, Some(8));
    }

    #[test]
    fn no_crossover_without_withdrawals() {
        let mut input = reference_input();
        input.deposit_withdrawal = None;
        let rows = build_chart_data_with_deposit(&input);
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(conclusion.crossover_point_month, None);
        assert_eq!(conclusion.crossover_point_year, None);
        assert_eq!(conclusion.winning_strategy, WinningStrategy::Deposit);
        assert_eq!(conclusion.inflection_month, None);
        assert!(inflation_warning(&conclusion, Locale::Ru).is_none());
    }

    #[test]
    fn crossover_year_rounds_up() {
        let rows = vec![row(0, 1.0, 1.0), row(12, 1.0, 2.0), row(13, 3.0, 2.0)];
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(conclusion.crossover_point_month, Some(13));
        assert_eq!(conclusion.crossover_point_year, Some(2));

        let at_year_end = vec![row(0, 1.0, 1.0), row(12, 2.0, 2.0)];
        let conclusion = generate_expert_conclusion(&at_year_end, HORIZON_MONTHS);
        assert_eq!(conclusion.crossover_point_year, Some(1));
    }

    #[test]
    fn yield_peak_needs_a_positive_gap() {
        let rows = vec![row(0, 5.0, 5.0), row(1, 6.0, 5.0), row(2, 7.0, 7.0)];
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(conclusion.yield_peak_month, None);
        assert_eq!(conclusion.yield_peak_gap_rub, 0.0);
    }

    #[test]
    fn rows_past_horizon_are_ignored() {
        let rows = vec![row(0, 1.0, 1.0), row(1, 1.0, 2.0), row(2, 5.0, 2.0)];
        let conclusion = generate_expert_conclusion(&rows, 1);
        assert_eq!(conclusion.crossover_point_month, None);
        assert_eq!(conclusion.final_net_equity, 1.0);
        assert_eq!(conclusion.winning_strategy, WinningStrategy::Deposit);
    }

    #[test]
    fn empty_series_yields_neutral_conclusion() {
        let conclusion = generate_expert_conclusion(&[], HORIZON_MONTHS);
        assert_eq!(conclusion.crossover_point_month, None);
        assert_eq!(conclusion.final_advantage_rub, 0.0);
        assert_eq!(conclusion.winning_strategy, WinningStrategy::Mortgage);
        assert_eq!(conclusion.inflection_month, None);
        assert_eq!(conclusion.horizon_years, 0);
    }

    #[test]
    fn financial_verdict_counts_deposit_months() {
        let rows = build_chart_data_with_deposit(&reference_input());
        let verdict = financial_verdict(&rows, HORIZON_MONTHS);
        assert_eq!(verdict.cross_over_month, Some(96));
        assert_eq!(verdict.peak_deposit_period, 95);
        assert!((verdict.final_advantage - 42.51917137).abs() < 1e-6);
    }

    #[test]
    fn financial_verdict_crossover_is_strict() {
        let rows = vec![row(0, 1.0, 1.0), row(1, 2.0, 2.0), row(2, 3.0, 2.0)];
        assert_eq!(financial_verdict(&rows, HORIZON_MONTHS).cross_over_month, Some(2));
        assert_eq!(generate_expert_conclusion(&rows, HORIZON_MONTHS).crossover_point_month, Some(1));
    }

    #[test]
    fn smart_insights_reference() {
        let input = reference_input();
        let rows = build_chart_data_with_deposit(&input);
        let insights = smart_insights(&rows, input.term_years, input.price, input.rent_monthly());
        assert!((insights.ratio_times - 1.3234643464).abs() < 1e-6);
        assert_eq!(insights.horizon_years, 10);
        assert_eq!(insights.payback_months, Some(80));
        assert_eq!(insights.peak_month, Some(120));
        assert!(!insights.show_deposit_disclaimer);
        assert!(!insights.show_rent_capitalization);
        assert_eq!(insights.rent_capitalization_percent, 0.0);
    }

    #[test]
    fn smart_insights_offer_rent_capitalization_when_deposit_leads() {
        let mut input = reference_input();
        input.deposit_withdrawal = None;
        let rows = build_chart_data_with_deposit(&input);
        let insights = smart_insights(&rows, 5, input.price, input.rent_monthly());
        assert_eq!(insights.horizon_years, 5);
        assert!((insights.ratio_times - 0.6771223160).abs() < 1e-6);
        assert_eq!(insights.peak_month, Some(24));
        assert!(insights.show_rent_capitalization);
        assert!((insights.rent_capitalization_percent - 3.1473017591).abs() < 1e-6);
    }

    #[test]
    fn ratio_falls_back_when_deposit_is_empty() {
        let rows = vec![row(0, 1.0, 1.0), row(1, 2.0, 0.0)];
        assert_eq!(smart_insights(&rows, 20, 1.0, 0.0).ratio_times, MIN_RATIO_TIMES);
        let empty = smart_insights(&[], 20, 1.0, 0.0);
        assert_eq!(empty.ratio_times, MIN_RATIO_TIMES);
        assert_eq!(empty.payback_months, None);
    }

    #[test]
    fn deposit_disclaimer_when_property_is_dwarfed() {
        let rows = vec![row(0, 1.0, 1.0), row(1, 1.0, 11.0)];
        assert!(smart_insights(&rows, 20, 1.0, 0.0).show_deposit_disclaimer);
    }

    #[test]
    fn comparison_ties_go_to_a() {
        let a = vec![row(0, 1.0, 1.0), row(1, 5.0, 4.0)];
        let verdict = generate_comparison_verdict(&a, &a, 10.0, 10.0);
        assert_eq!(verdict.leader, Leader::A);
        assert_eq!(verdict.capital_diff_millions, 0.0);
        assert_eq!(verdict.crossover_point_month, Some(1));
    }

    #[test]
    fn message_templates() {
        let rows = build_chart_data_with_deposit(&reference_input());
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(
            conclusion_message(&conclusion, Locale::Ru),
            "На горизонте 20 лет стратегия «недвижимость» выгоднее на 42.52 млн ₽. \
             Точка окупаемости банковских процентов: 8 год."
        );
        assert_eq!(
            conclusion_message(&conclusion, Locale::En),
            "Over 20 years, «property» is ahead by 42.52 M ₽. Deposit interest payback point: year 8."
        );
        let warning = inflation_warning(&conclusion, Locale::En).unwrap_or_default();
        assert!(warning.contains("year 8"));
    }

    #[test]
    fn message_states_the_analysed_horizon() {
        let mut input = reference_input();
        input.term_years = 10;
        let rows = build_chart_data_with_deposit(&input);
        let conclusion = generate_expert_conclusion(&rows, HORIZON_MONTHS);
        assert_eq!(conclusion.horizon_years, 10);
        assert!(conclusion_message(&conclusion, Locale::Ru).starts_with("На горизонте 10 лет "));
        assert!(conclusion_message(&conclusion, Locale::En).starts_with("Over 10 years, "));

        let one_year = vec![row(0, 1.0, 1.0), row(12, 2.0, 1.0)];
        let conclusion = generate_expert_conclusion(&one_year, HORIZON_MONTHS);
        assert!(conclusion_message(&conclusion, Locale::Ru).starts_with("На горизонте 1 год "));
        assert!(conclusion_message(&conclusion, Locale::En).starts_with("Over 1 year, "));
    }

    #[test]
    fn russian_year_word_agrees_with_number() {
        assert_eq!(years_word(1, Locale::Ru), "год");
        assert_eq!(years_word(3, Locale::Ru), "года");
        assert_eq!(years_word(11, Locale::Ru), "лет");
        assert_eq!(years_word(13, Locale::Ru), "лет");
        assert_eq!(years_word(21, Locale::Ru), "год");
        assert_eq!(years_word(25, Locale::Ru), "лет");
    }

    #[test]
    fn millions_formatting() {
        assert_eq!(format_millions(4_000.0, Locale::Ru), "0 млн ₽");
        assert_eq!(format_millions(-2_345_678.0, Locale::Ru), "−2.35 млн ₽");
        assert_eq!(format_millions(12_000_000.0, Locale::En), "12.00 M ₽");
    }

    fn series(values: &[(u32, u32)]) -> Vec<ChartRow> {
        values
            .iter()
            .enumerate()
            .map(|(month, &(equity, deposit))| row(month as u32, equity as f64, deposit as f64))
            .collect()
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_comparison_is_symmetric(
            a in proptest::collection::vec((0u32..1_000_000, 0u32..1_000_000), 1..40),
            b in proptest::collection::vec((0u32..1_000_000, 0u32..1_000_000), 1..40),
            roi_a in -50.0f64..50.0,
            roi_b in -50.0f64..50.0
        ) {
            let rows_a = series(&a);
            let rows_b = series(&b);
            let forward = generate_comparison_verdict(&rows_a, &rows_b, roi_a, roi_b);
            let backward = generate_comparison_verdict(&rows_b, &rows_a, roi_b, roi_a);

            prop_assert_eq!(forward.capital_diff_millions, backward.capital_diff_millions);
            prop_assert_eq!(forward.roi_diff_percent, -backward.roi_diff_percent);
            prop_assert!(forward.capital_diff_millions >= 0.0);
            if forward.final_net_equity_a != forward.final_net_equity_b {
                prop_assert!(forward.leader != backward.leader);
                prop_assert_eq!(forward.crossover_point_month, backward.crossover_point_month);
            }
        }
    }
}
