mod error;

pub use error::ApiError;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    CashflowRoiInput, CashflowRoiResult, ComparisonVerdict, DEFAULT_APPRECIATION_PERCENT,
    ExpertConclusion, FinancialVerdict, HORIZON_MONTHS, Locale, Projection, ProjectionInput,
    RatesProfile, RatesProfiles, RentComparison, RentComparisonInput, RiskScenario,
    ScenarioPreset, SmartInsights, StrategyKind, WithdrawalPolicy, cashflow_roi,
    compare_with_rent, conclusion_message, financial_verdict, generate_comparison_verdict,
    generate_expert_conclusion, inflation_warning, run_projection, smart_insights,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskScenario {
    None,
    Stagnation,
    Hyperinflation,
}

impl From<CliRiskScenario> for RiskScenario {
    fn from(value: CliRiskScenario) -> Self {
        match value {
            CliRiskScenario::None => RiskScenario::None,
            CliRiskScenario::Stagnation => RiskScenario::Stagnation,
            CliRiskScenario::Hyperinflation => RiskScenario::Hyperinflation,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Investor,
    Family,
    Entry,
}

impl From<CliStrategy> for StrategyKind {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Investor => StrategyKind::Investor,
            CliStrategy::Family => StrategyKind::Family,
            CliStrategy::Entry => StrategyKind::Entry,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLocale {
    Ru,
    En,
}

impl From<CliLocale> for Locale {
    fn from(value: CliLocale) -> Self {
        match value {
            CliLocale::Ru => Locale::Ru,
            CliLocale::En => Locale::En,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRiskScenario {
    #[serde(alias = "base")]
    None,
    Stagnation,
    #[serde(alias = "hyper")]
    Hyperinflation,
}

impl From<ApiRiskScenario> for CliRiskScenario {
    fn from(value: ApiRiskScenario) -> Self {
        match value {
            ApiRiskScenario::None => CliRiskScenario::None,
            ApiRiskScenario::Stagnation => CliRiskScenario::Stagnation,
            ApiRiskScenario::Hyperinflation => CliRiskScenario::Hyperinflation,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "investment")]
    Investor,
    Family,
    #[serde(alias = "start")]
    Entry,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Investor => CliStrategy::Investor,
            ApiStrategy::Family => CliStrategy::Family,
            ApiStrategy::Entry => CliStrategy::Entry,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiLocale {
    #[serde(alias = "ru-RU")]
    Ru,
    #[serde(alias = "en-US")]
    En,
}

impl From<ApiLocale> for CliLocale {
    fn from(value: ApiLocale) -> Self {
        match value {
            ApiLocale::Ru => CliLocale::Ru,
            ApiLocale::En => CliLocale::En,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    strategy: Option<ApiStrategy>,
    price: Option<f64>,
    #[serde(alias = "downPaymentPercent")]
    down_percent: Option<f64>,
    #[serde(alias = "mortgageRate")]
    rate_percent: Option<f64>,
    #[serde(alias = "years")]
    term_years: Option<u32>,
    #[serde(alias = "rentalYield")]
    rental_yield_percent: Option<f64>,
    #[serde(alias = "priceGrowthPercent")]
    appreciation_percent: Option<f64>,
    rent_inflation_percent: Option<f64>,
    #[serde(alias = "bankRate")]
    deposit_rate_percent: Option<f64>,
    deposit_withdrawal: Option<bool>,
    #[serde(alias = "taxRate")]
    deposit_tax_percent: Option<f64>,
    deposit_exemption: Option<f64>,
    risk_scenario: Option<ApiRiskScenario>,
    compare_strategy: Option<ApiStrategy>,
    #[serde(alias = "initialTotalCapital")]
    initial_capital: Option<f64>,
    price_b: Option<f64>,
    down_percent_b: Option<f64>,
    rate_percent_b: Option<f64>,
    term_years_b: Option<u32>,
    rental_yield_percent_b: Option<f64>,
    locale: Option<ApiLocale>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "property-sim",
    about = "Buy-to-let vs bank deposit projection (mortgage amortization, indexed rent, risk scenarios)"
)]
struct Cli {
    #[arg(
        long,
        value_enum,
        help = "Start from a strategy preset; replaces price, down payment, rate, term and the rates profile"
    )]
    strategy: Option<CliStrategy>,
    #[arg(long, default_value_t = 10_000_000.0, help = "Property price in rubles")]
    price: f64,
    #[arg(long, default_value_t = 20.0, help = "Down payment in percent of price")]
    down_percent: f64,
    #[arg(long, default_value_t = 18.0, help = "Mortgage rate in percent per year")]
    rate_percent: f64,
    #[arg(long, default_value_t = 20)]
    term_years: u32,
    #[arg(long, default_value_t = 6.0, help = "Gross rental yield in percent of price per year")]
    rental_yield_percent: f64,
    #[arg(long, default_value_t = 6.0, help = "Property price growth in percent per year")]
    appreciation_percent: f64,
    #[arg(long, default_value_t = 5.0, help = "Yearly rent indexation in percent")]
    rent_inflation_percent: f64,
    #[arg(long, default_value_t = 18.0, help = "Deposit rate for the first 36 months, percent")]
    deposit_rate_percent: f64,
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Pay indexed rent and interest tax out of the deposit"
    )]
    deposit_withdrawal: bool,
    #[arg(long, default_value_t = 13.0, help = "Tax on deposit interest above the exemption, percent")]
    deposit_tax_percent: f64,
    #[arg(long, default_value_t = 180_000.0, help = "Tax-free deposit interest per year in rubles")]
    deposit_exemption: f64,
    #[arg(long, value_enum, default_value_t = CliRiskScenario::None)]
    risk_scenario: CliRiskScenario,
    #[arg(long, value_enum, help = "Overlay a second strategy preset on the chart")]
    compare_strategy: Option<CliStrategy>,
    #[arg(long, help = "Starting capital; defaults to the property price")]
    initial_capital: Option<f64>,
    #[arg(
        long,
        help = "Price of object B; any --*-b flag compares against a custom second object"
    )]
    price_b: Option<f64>,
    #[arg(long)]
    down_percent_b: Option<f64>,
    #[arg(long)]
    rate_percent_b: Option<f64>,
    #[arg(long)]
    term_years_b: Option<u32>,
    #[arg(long, help = "Rental yield of object B; defaults to --rental-yield-percent")]
    rental_yield_percent_b: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliLocale::Ru)]
    locale: CliLocale,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ProjectionInput,
    locale: Locale,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    risk_scenario: RiskScenario,
    #[serde(flatten)]
    projection: Projection,
    cashflow_roi: CashflowRoiResult,
    rent_vs_buy: RentComparison,
    expert_conclusion: ExpertConclusion,
    conclusion_message: String,
    inflation_warning: Option<String>,
    financial_verdict: FinancialVerdict,
    smart_insights: SmartInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<ComparisonVerdict>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyEntry {
    strategy: StrategyKind,
    preset: ScenarioPreset,
    rates_profile: RatesProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetsResponse {
    strategies: Vec<StrategyEntry>,
    rates_profiles: RatesProfiles,
}

fn out_of_range(field: &'static str, constraint: &'static str) -> ApiError {
    ApiError::OutOfRange { field, constraint }
}

/// Flag names reported for one purchased object.
struct ObjectFlags {
    price: &'static str,
    down_percent: &'static str,
    rate_percent: &'static str,
    term_years: &'static str,
    rental_yield_percent: &'static str,
}

const OBJECT_A_FLAGS: ObjectFlags = ObjectFlags {
    price: "price",
    down_percent: "down-percent",
    rate_percent: "rate-percent",
    term_years: "term-years",
    rental_yield_percent: "rental-yield-percent",
};

const OBJECT_B_FLAGS: ObjectFlags = ObjectFlags {
    price: "price-b",
    down_percent: "down-percent-b",
    rate_percent: "rate-percent-b",
    term_years: "term-years-b",
    rental_yield_percent: "rental-yield-percent-b",
};

fn check_object(
    purchase: &ScenarioPreset,
    rental_yield_percent: f64,
    flags: &ObjectFlags,
) -> Result<(), ApiError> {
    if !purchase.price.is_finite() || purchase.price <= 0.0 {
        return Err(out_of_range(flags.price, "> 0"));
    }

    if !(0.0..=100.0).contains(&purchase.down_percent) {
        return Err(out_of_range(flags.down_percent, "between 0 and 100"));
    }

    if !(0.0..100.0).contains(&purchase.rate_percent) {
        return Err(out_of_range(flags.rate_percent, ">= 0 and < 100"));
    }

    if !(1..=50).contains(&purchase.term_years) {
        return Err(out_of_range(flags.term_years, "between 1 and 50"));
    }

    if !(0.0..=100.0).contains(&rental_yield_percent) {
        return Err(out_of_range(flags.rental_yield_percent, "between 0 and 100"));
    }

    Ok(())
}

/// Object B starts from the compare strategy preset, or from object A when only
/// `--*-b` flags are given; explicit `--*-b` values win.
fn object_b(cli: &Cli) -> Option<(ScenarioPreset, f64)> {
    let custom = cli.price_b.is_some()
        || cli.down_percent_b.is_some()
        || cli.rate_percent_b.is_some()
        || cli.term_years_b.is_some()
        || cli.rental_yield_percent_b.is_some();
    let base = match cli.compare_strategy {
        Some(strategy) => StrategyKind::from(strategy).preset(),
        None if custom => ScenarioPreset {
            price: cli.price,
            down_percent: cli.down_percent,
            rate_percent: cli.rate_percent,
            term_years: cli.term_years,
        },
        None => return None,
    };
    let purchase = ScenarioPreset {
        price: cli.price_b.unwrap_or(base.price),
        down_percent: cli.down_percent_b.unwrap_or(base.down_percent),
        rate_percent: cli.rate_percent_b.unwrap_or(base.rate_percent),
        term_years: cli.term_years_b.unwrap_or(base.term_years),
    };
    let rental_yield_percent = cli.rental_yield_percent_b.unwrap_or(cli.rental_yield_percent);
    Some((purchase, rental_yield_percent))
}

fn build_inputs(cli: Cli) -> Result<ProjectionInput, ApiError> {
    let purchase = ScenarioPreset {
        price: cli.price,
        down_percent: cli.down_percent,
        rate_percent: cli.rate_percent,
        term_years: cli.term_years,
    };
    check_object(&purchase, cli.rental_yield_percent, &OBJECT_A_FLAGS)?;

    if !cli.appreciation_percent.is_finite() || cli.appreciation_percent <= -100.0 {
        return Err(out_of_range("appreciation-percent", "> -100"));
    }

    if !cli.rent_inflation_percent.is_finite() || cli.rent_inflation_percent <= -100.0 {
        return Err(out_of_range("rent-inflation-percent", "> -100"));
    }

    if !(0.0..=100.0).contains(&cli.deposit_rate_percent) {
        return Err(out_of_range("deposit-rate-percent", "between 0 and 100"));
    }

    if !(0.0..=100.0).contains(&cli.deposit_tax_percent) {
        return Err(out_of_range("deposit-tax-percent", "between 0 and 100"));
    }

    if !cli.deposit_exemption.is_finite() || cli.deposit_exemption < 0.0 {
        return Err(out_of_range("deposit-exemption", ">= 0"));
    }

    if let Some(capital) = cli.initial_capital {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(out_of_range("initial-capital", "> 0"));
        }
    }

    let compared = object_b(&cli);
    if let Some((purchase, rental_yield_percent)) = &compared {
        check_object(purchase, *rental_yield_percent, &OBJECT_B_FLAGS)?;
    }

    let deposit_withdrawal = cli.deposit_withdrawal.then(|| WithdrawalPolicy {
        tax_rate: cli.deposit_tax_percent / 100.0,
        exemption_per_year_rub: cli.deposit_exemption,
    });

    Ok(ProjectionInput {
        price: cli.price,
        down_percent: cli.down_percent,
        rate_percent: cli.rate_percent,
        term_years: cli.term_years,
        rental_yield_percent: cli.rental_yield_percent,
        appreciation_percent: cli.appreciation_percent,
        rent_inflation_rate: cli.rent_inflation_percent / 100.0,
        deposit_rate: cli.deposit_rate_percent / 100.0,
        deposit_withdrawal,
        risk_scenario: cli.risk_scenario.into(),
        compare_preset: compared.map(|(purchase, _)| purchase),
        compare_rental_yield_percent: compared.map(|(_, rental_yield)| rental_yield),
        initial_total_capital_override: cli.initial_capital,
    })
}

fn apply_strategy(cli: &mut Cli, strategy: StrategyKind) {
    let preset = strategy.preset();
    let rates = strategy.rates_profile(&RatesProfiles::default());
    cli.price = preset.price;
    cli.down_percent = preset.down_percent;
    cli.rate_percent = preset.rate_percent;
    cli.term_years = preset.term_years;
    cli.deposit_rate_percent = rates.bank_rate;
    cli.deposit_tax_percent = rates.tax_rate;
    cli.appreciation_percent = rates.price_growth;
}

/// Parses command-line arguments and renders the projection as pretty JSON.
pub fn projection_json_from_args<I, T>(args: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut cli = Cli::try_parse_from(args)?;
    if let Some(strategy) = cli.strategy {
        apply_strategy(&mut cli, strategy.into());
    }
    let locale = cli.locale.into();
    let inputs = build_inputs(cli)?;
    let response = build_projection_response(&inputs, locale);
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/presets", get(presets_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "property-sim HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/projection");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn presets_handler() -> Response {
    let rates_profiles = RatesProfiles::default();
    let strategies = StrategyKind::ALL
        .into_iter()
        .map(|strategy| StrategyEntry {
            strategy,
            preset: strategy.preset(),
            rates_profile: strategy.rates_profile(&rates_profiles),
        })
        .collect();
    json_response(
        StatusCode::OK,
        PresetsResponse {
            strategies,
            rates_profiles,
        },
    )
}

async fn projection_get_handler(
    payload: Result<Query<ProjectionPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => rejected(ApiError::InvalidPayload(rejection.body_text())),
    }
}

async fn projection_post_handler(
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => rejected(ApiError::InvalidPayload(rejection.body_text())),
    }
}

async fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };

    let inputs = &request.inputs;
    let response = build_projection_response(inputs, request.locale);
    info!(
        price = inputs.price,
        term_years = inputs.term_years,
        risk_scenario = ?inputs.risk_scenario,
        crossover_month = ?response.expert_conclusion.crossover_point_month,
        "projection computed"
    );
    json_response(StatusCode::OK, response)
}

fn rejected(err: ApiError) -> Response {
    warn!(error = %err, "projection request rejected");
    err.into_response()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(status, serde_json::json!({ "error": msg }))
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, ApiError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectionPayload) -> Result<ApiRequest, ApiError> {
    let mut cli = default_cli_for_api();

    if let Some(strategy) = payload.strategy {
        apply_strategy(&mut cli, CliStrategy::from(strategy).into());
    }
    if let Some(v) = payload.price {
        cli.price = v;
    }
    if let Some(v) = payload.down_percent {
        cli.down_percent = v;
    }
    if let Some(v) = payload.rate_percent {
        cli.rate_percent = v;
    }
    if let Some(v) = payload.term_years {
        cli.term_years = v;
    }
    if let Some(v) = payload.rental_yield_percent {
        cli.rental_yield_percent = v;
    }
    if let Some(v) = payload.appreciation_percent {
        cli.appreciation_percent = v;
    }
    if let Some(v) = payload.rent_inflation_percent {
        cli.rent_inflation_percent = v;
    }
    if let Some(v) = payload.deposit_rate_percent {
        cli.deposit_rate_percent = v;
    }
    if let Some(v) = payload.deposit_withdrawal {
        cli.deposit_withdrawal = v;
    }
    if let Some(v) = payload.deposit_tax_percent {
        cli.deposit_tax_percent = v;
    }
    if let Some(v) = payload.deposit_exemption {
        cli.deposit_exemption = v;
    }
    if let Some(v) = payload.risk_scenario {
        cli.risk_scenario = v.into();
    }
    if let Some(v) = payload.compare_strategy {
        cli.compare_strategy = Some(v.into());
    }
    if payload.initial_capital.is_some() {
        cli.initial_capital = payload.initial_capital;
    }
    if payload.price_b.is_some() {
        cli.price_b = payload.price_b;
    }
    if payload.down_percent_b.is_some() {
        cli.down_percent_b = payload.down_percent_b;
    }
    if payload.rate_percent_b.is_some() {
        cli.rate_percent_b = payload.rate_percent_b;
    }
    if payload.term_years_b.is_some() {
        cli.term_years_b = payload.term_years_b;
    }
    if payload.rental_yield_percent_b.is_some() {
        cli.rental_yield_percent_b = payload.rental_yield_percent_b;
    }
    if let Some(v) = payload.locale {
        cli.locale = v.into();
    }

    let locale = cli.locale.into();
    let inputs = build_inputs(cli)?;
    Ok(ApiRequest { inputs, locale })
}

fn default_cli_for_api() -> Cli {
    Cli {
        strategy: None,
        price: 10_000_000.0,
        down_percent: 20.0,
        rate_percent: 18.0,
        term_years: 20,
        rental_yield_percent: 6.0,
        appreciation_percent: DEFAULT_APPRECIATION_PERCENT,
        rent_inflation_percent: 5.0,
        deposit_rate_percent: 18.0,
        deposit_withdrawal: true,
        deposit_tax_percent: 13.0,
        deposit_exemption: 180_000.0,
        risk_scenario: CliRiskScenario::None,
        compare_strategy: None,
        initial_capital: None,
        price_b: None,
        down_percent_b: None,
        rate_percent_b: None,
        term_years_b: None,
        rental_yield_percent_b: None,
        locale: CliLocale::Ru,
    }
}

fn build_projection_response(inputs: &ProjectionInput, locale: Locale) -> ProjectionResponse {
    let projection = run_projection(inputs);
    let chart = &projection.chart;

    let expert_conclusion = generate_expert_conclusion(chart, HORIZON_MONTHS);
    let financial_verdict = financial_verdict(chart, HORIZON_MONTHS);
    let smart_insights = smart_insights(
        chart,
        inputs.term_years,
        inputs.initial_total_capital(),
        inputs.rent_monthly(),
    );
    let cashflow_roi = cashflow_roi(&CashflowRoiInput {
        monthly_rent: inputs.rent_monthly(),
        object_price: inputs.price,
        annual_taxes_and_expenses: None,
    });
    let rent_vs_buy = compare_with_rent(&RentComparisonInput {
        monthly_rent: inputs.rent_monthly(),
        term_years: inputs.term_years,
        current_property_price: inputs.price,
        inflation_rate: inputs.rent_inflation_rate,
        property_growth_rate: inputs.appreciation_percent / 100.0,
    });
    let comparison = inputs.compare_input().map(|object_b| {
        let other = run_projection(&object_b);
        generate_comparison_verdict(
            chart,
            &other.chart,
            projection.roi.roi_percent,
            other.roi.roi_percent,
        )
    });

    ProjectionResponse {
        risk_scenario: inputs.risk_scenario,
        conclusion_message: conclusion_message(&expert_conclusion, locale),
        inflation_warning: inflation_warning(&expert_conclusion, locale),
        projection,
        cashflow_roi,
        rent_vs_buy,
        expert_conclusion,
        financial_verdict,
        smart_insights,
        comparison,
    }
}
