use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskScenario {
    #[default]
    None,
    Stagnation,
    Hyperinflation,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Investor,
    Family,
    Entry,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Investor,
        StrategyKind::Family,
        StrategyKind::Entry,
    ];

    pub fn preset(self) -> ScenarioPreset {
        match self {
            StrategyKind::Investor => ScenarioPreset {
                price: 15_000_000.0,
                down_percent: 50.0,
                rate_percent: 18.0,
                term_years: 10,
            },
            StrategyKind::Family => ScenarioPreset {
                price: 12_000_000.0,
                down_percent: 15.0,
                rate_percent: 6.0,
                term_years: 30,
            },
            StrategyKind::Entry => ScenarioPreset {
                price: 8_000_000.0,
                down_percent: 10.0,
                rate_percent: 18.0,
                term_years: 25,
            },
        }
    }

    pub fn rates_profile(self, rates: &RatesProfiles) -> RatesProfile {
        match self {
            StrategyKind::Investor => rates.investment,
            StrategyKind::Family => rates.family,
            StrategyKind::Entry => rates.start,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPreset {
    pub price: f64,
    pub down_percent: f64,
    pub rate_percent: f64,
    pub term_years: u32,
}

impl ScenarioPreset {
    pub fn down_payment(&self) -> f64 {
        self.price * (self.down_percent / 100.0)
    }

    pub fn loan_amount(&self) -> f64 {
        self.price * (1.0 - self.down_percent / 100.0)
    }
}

/// Bank rate, tax rate and price growth, all in percent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesProfile {
    pub bank_rate: f64,
    pub tax_rate: f64,
    pub price_growth: f64,
}

impl Default for RatesProfile {
    fn default() -> Self {
        Self {
            bank_rate: 18.0,
            tax_rate: 13.0,
            price_growth: 5.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesProfiles {
    pub investment: RatesProfile,
    pub family: RatesProfile,
    pub start: RatesProfile,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnnuityParameters {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_years: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnuityResult {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeductionResult {
    pub property_refund: f64,
    pub interest_refund: f64,
    pub total_refund: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: u32,
    pub balance: f64,
    pub interest: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RoiInput {
    pub price: f64,
    pub down_payment: f64,
    pub annual_rental_yield: f64,
    pub expense_ratio: f64,
}

impl RoiInput {
    pub const DEFAULT_EXPENSE_RATIO: f64 = 0.2;
}

/// `payback_years` is `f64::INFINITY` when the property never pays back;
/// JSON renders that as `null`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiResult {
    pub annual_rental_income: f64,
    pub annual_expenses: f64,
    pub net_annual_income: f64,
    pub investment: f64,
    pub roi_percent: f64,
    pub payback_years: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CashflowRoiInput {
    pub monthly_rent: f64,
    pub object_price: f64,
    pub annual_taxes_and_expenses: Option<f64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowRoiResult {
    pub roi_percent: f64,
    pub annual_cashflow: f64,
    pub total_annual_return_percent: f64,
    pub annual_appreciation: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RentComparisonInput {
    pub monthly_rent: f64,
    pub term_years: u32,
    pub current_property_price: f64,
    pub inflation_rate: f64,
    pub property_growth_rate: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentComparison {
    pub rent_total: f64,
    pub property_equity: f64,
}

/// Statutory deposit-interest tax applied when rent is funded from the deposit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WithdrawalPolicy {
    pub tax_rate: f64,
    pub exemption_per_year_rub: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionInput {
    pub price: f64,
    pub down_percent: f64,
    pub rate_percent: f64,
    pub term_years: u32,
    pub rental_yield_percent: f64,
    pub appreciation_percent: f64,
    pub rent_inflation_rate: f64,
    pub deposit_rate: f64,
    pub deposit_withdrawal: Option<WithdrawalPolicy>,
    pub risk_scenario: RiskScenario,
    pub compare_preset: Option<ScenarioPreset>,
    /// Rental yield of the compared object; `None` reuses `rental_yield_percent`.
    pub compare_rental_yield_percent: Option<f64>,
    pub initial_total_capital_override: Option<f64>,
}

impl ProjectionInput {
    pub fn down_payment(&self) -> f64 {
        self.price * (self.down_percent / 100.0)
    }

    pub fn loan_amount(&self) -> f64 {
        self.price - self.down_payment()
    }

    pub fn rent_monthly(&self) -> f64 {
        (self.price * (self.rental_yield_percent / 100.0)) / 12.0
    }

    pub fn initial_total_capital(&self) -> f64 {
        self.initial_total_capital_override.unwrap_or(self.price)
    }

    pub fn compare_rental_yield(&self) -> f64 {
        self.compare_rental_yield_percent
            .unwrap_or(self.rental_yield_percent)
    }

    /// The compared object as a standalone input. It keeps the market assumptions
    /// and starts from the same total capital, so both deposits match at month 0.
    pub fn compare_input(&self) -> Option<ProjectionInput> {
        self.compare_preset.map(|preset| ProjectionInput {
            price: preset.price,
            down_percent: preset.down_percent,
            rate_percent: preset.rate_percent,
            term_years: preset.term_years,
            rental_yield_percent: self.compare_rental_yield(),
            compare_preset: None,
            compare_rental_yield_percent: None,
            initial_total_capital_override: Some(self.initial_total_capital()),
            ..self.clone()
        })
    }

    pub fn annuity_parameters(&self) -> AnnuityParameters {
        AnnuityParameters {
            principal: self.loan_amount(),
            annual_rate: self.rate_percent / 100.0,
            term_years: self.term_years,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub month: u32,
    pub balance: f64,
    pub interest: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_compare: Option<f64>,
    pub net_equity: f64,
    pub deposit_accumulation: f64,
    pub is_break_even: bool,
    pub property_value_growth: f64,
    pub saved_rent_indexed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_equity_compare: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareBenefit {
    pub verdict_benefit_compare: f64,
    pub benefit_delta: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub chart: Vec<ChartRow>,
    pub annuity: AnnuityResult,
    pub tax_deductions: TaxDeductionResult,
    pub roi: RoiResult,
    pub rent_monthly: f64,
    pub total_rent: f64,
    pub final_value: f64,
    pub total_payments: f64,
    pub tax_refunds: f64,
    pub verdict_benefit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare: Option<CompareBenefit>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WinningStrategy {
    Mortgage,
    Deposit,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Leader {
    A,
    B,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertConclusion {
    /// Whole years covered by the analysed rows.
    pub horizon_years: u32,
    pub crossover_point_month: Option<u32>,
    pub crossover_point_year: Option<u32>,
    pub final_advantage_rub: f64,
    pub winning_strategy: WinningStrategy,
    pub yield_peak_month: Option<u32>,
    pub yield_peak_gap_rub: f64,
    pub final_net_equity: f64,
    pub final_deposit: f64,
    pub inflection_month: Option<u32>,
    pub inflection_year: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialVerdict {
    pub cross_over_month: Option<u32>,
    pub final_advantage: f64,
    pub peak_deposit_period: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartInsights {
    pub ratio_times: f64,
    pub horizon_years: u32,
    pub payback_months: Option<u32>,
    pub peak_month: Option<u32>,
    pub show_deposit_disclaimer: bool,
    pub show_rent_capitalization: bool,
    pub rent_capitalization_percent: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonVerdict {
    pub leader: Leader,
    pub final_net_equity_a: f64,
    pub final_net_equity_b: f64,
    pub capital_diff_millions: f64,
    pub roi_diff_percent: f64,
    pub crossover_point_month: Option<u32>,
    pub crossover_point_year: Option<u32>,
}
