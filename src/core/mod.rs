mod amortization;
mod deposit;
mod engine;
mod insights;
mod money;
mod rent;
mod types;
mod verdict;

pub use amortization::{
    amortization_schedule, annuity, calculate_tax_benefits, cashflow_roi, compare_with_rent, roi,
    tax_deductions,
};
pub use deposit::{DepositSimulator, WithdrawalOptions, deposit_accumulation, monthly_deposit_rate};
pub use engine::{
    DEFAULT_APPRECIATION_PERCENT, build_chart_data_with_deposit, rent_indexation_rate, run_projection,
};
pub use insights::{
    HORIZON_MONTHS, conclusion_message, financial_verdict, format_millions,
    generate_comparison_verdict, generate_expert_conclusion, inflation_warning, smart_insights,
};
pub use money::Kopeks;
pub use rent::accumulated_indexed_rent;
pub use types::{
    AmortizationRow, AnnuityParameters, AnnuityResult, CashflowRoiInput, CashflowRoiResult,
    ChartRow, CompareBenefit, ComparisonVerdict, ExpertConclusion, FinancialVerdict, Leader,
    Locale, Projection, ProjectionInput, RatesProfile, RatesProfiles, RentComparison,
    RentComparisonInput, RiskScenario, RoiInput, RoiResult, ScenarioPreset, SmartInsights,
    StrategyKind, TaxDeductionResult, WinningStrategy, WithdrawalPolicy,
};
pub use verdict::{VerdictBenefitInput, calculate_compare_benefit, calculate_verdict_benefit};
