use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ConsolidatedResults, HORIZON_YEARS, MAX_LOAN_TERM_YEARS, MAX_PAYMENT_FREQUENCY, OverallParams,
    ProjectionYear, PropertyParams, project,
};
use crate::error::{GearingError, Result};
use crate::export::{CSV_FILE_NAME, to_csv_string};

pub const MAX_PROPERTIES: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyPayload {
    purchase_year: Option<u32>,
    property_value: Option<f64>,
    loan_amount: Option<f64>,
    interest_rate: Option<f64>,
    loan_term: Option<u32>,
    payment_frequency: Option<u32>,
    weekly_rental_income: Option<f64>,
    annual_rental_increase: Option<f64>,
    annual_expense_increase: Option<f64>,
    property_appreciation: Option<f64>,
    council_rates: Option<f64>,
    water_rates: Option<f64>,
    land_tax: Option<f64>,
    strata_fees: Option<f64>,
    insurance: Option<f64>,
    property_manager_rate: Option<f64>,
    repairs_and_maintenance: Option<f64>,
    depreciation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectPayload {
    annual_salary: Option<f64>,
    marginal_tax_rate: Option<f64>,
    properties: Option<Vec<PropertyPayload>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRequest {
    pub properties: Vec<PropertyParams>,
    pub overall: OverallParams,
}

impl ProjectRequest {
    pub fn run(&self) -> Result<ConsolidatedResults> {
        project(&self.properties, &self.overall)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    property_count: usize,
    annual_salary: f64,
    marginal_tax_rate: f64,
    years: Vec<ProjectionYear>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    annual_salary: f64,
    marginal_tax_rate: f64,
    properties: Vec<PropertyParams>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn default_property_params() -> PropertyParams {
    PropertyParams {
        purchase_year: 0,
        property_value: 500_000.0,
        loan_amount: 450_000.0,
        interest_rate: 0.0625,
        loan_term: 30,
        payment_frequency: 52,
        weekly_rental_income: 400.0,
        annual_rental_increase: 0.02,
        annual_expense_increase: 0.02,
        property_appreciation: 0.04,
        council_rates: 700.0,
        water_rates: 550.0,
        land_tax: 0.0,
        strata_fees: 500.0,
        insurance: 1_250.0,
        property_manager_rate: 0.07,
        repairs_and_maintenance: 2_000.0,
        depreciation: 7_500.0,
    }
}

pub fn default_overall_params() -> OverallParams {
    OverallParams {
        annual_salary: 93_600.0,
        marginal_tax_rate: 0.32,
    }
}

pub fn sample_request() -> SampleRequest {
    let overall = default_overall_params();
    SampleRequest {
        annual_salary: overall.annual_salary,
        marginal_tax_rate: overall.marginal_tax_rate,
        properties: vec![default_property_params()],
    }
}

pub fn request_from_json(json: &str) -> Result<ProjectRequest> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| GearingError::InvalidInput(format!("Invalid JSON payload: {e}")))?;
    request_from_payload(payload)
}

pub fn request_from_payload(payload: ProjectPayload) -> Result<ProjectRequest> {
    let mut overall = default_overall_params();
    if let Some(v) = payload.annual_salary {
        overall.annual_salary = v;
    }
    if let Some(v) = payload.marginal_tax_rate {
        overall.marginal_tax_rate = v;
    }
    validate_overall(&overall)?;

    let payloads = payload
        .properties
        .unwrap_or_else(|| vec![PropertyPayload::default()]);
    if payloads.is_empty() || payloads.len() > MAX_PROPERTIES {
        return Err(GearingError::InvalidInput(format!(
            "properties must contain between 1 and {MAX_PROPERTIES} entries, got {}",
            payloads.len()
        )));
    }

    let mut properties = Vec::with_capacity(payloads.len());
    for (idx, payload) in payloads.into_iter().enumerate() {
        let property = property_from_payload(payload);
        validate_property_inputs(idx, &property)?;
        properties.push(property);
    }

    Ok(ProjectRequest {
        properties,
        overall,
    })
}

fn property_from_payload(payload: PropertyPayload) -> PropertyParams {
    let mut property = default_property_params();

    if let Some(v) = payload.purchase_year {
        property.purchase_year = v;
    }
    if let Some(v) = payload.property_value {
        property.property_value = v;
    }
    if let Some(v) = payload.loan_amount {
        property.loan_amount = v;
    }
    if let Some(v) = payload.interest_rate {
        property.interest_rate = v;
    }
    if let Some(v) = payload.loan_term {
        property.loan_term = v;
    }
    if let Some(v) = payload.payment_frequency {
        property.payment_frequency = v;
    }

    if let Some(v) = payload.weekly_rental_income {
        property.weekly_rental_income = v;
    }
    if let Some(v) = payload.annual_rental_increase {
        property.annual_rental_increase = v;
    }
    if let Some(v) = payload.annual_expense_increase {
        property.annual_expense_increase = v;
    }
    if let Some(v) = payload.property_appreciation {
        property.property_appreciation = v;
    }

    if let Some(v) = payload.council_rates {
        property.council_rates = v;
    }
    if let Some(v) = payload.water_rates {
        property.water_rates = v;
    }
    if let Some(v) = payload.land_tax {
        property.land_tax = v;
    }
    if let Some(v) = payload.strata_fees {
        property.strata_fees = v;
    }
    if let Some(v) = payload.insurance {
        property.insurance = v;
    }
    if let Some(v) = payload.property_manager_rate {
        property.property_manager_rate = v;
    }
    if let Some(v) = payload.repairs_and_maintenance {
        property.repairs_and_maintenance = v;
    }
    if let Some(v) = payload.depreciation {
        property.depreciation = v;
    }

    property
}

fn validate_overall(overall: &OverallParams) -> Result<()> {
    if !overall.annual_salary.is_finite() || overall.annual_salary < 0.0 {
        return Err(GearingError::InvalidInput(
            "annualSalary must be >= 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&overall.marginal_tax_rate) {
        return Err(GearingError::InvalidInput(
            "marginalTaxRate must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_property_inputs(idx: usize, property: &PropertyParams) -> Result<()> {
    let number = idx + 1;

    for (name, amount) in [
        ("propertyValue", property.property_value),
        ("loanAmount", property.loan_amount),
        ("weeklyRentalIncome", property.weekly_rental_income),
        ("councilRates", property.council_rates),
        ("waterRates", property.water_rates),
        ("landTax", property.land_tax),
        ("strataFees", property.strata_fees),
        ("insurance", property.insurance),
        ("repairsAndMaintenance", property.repairs_and_maintenance),
        ("depreciation", property.depreciation),
        ("interestRate", property.interest_rate),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(GearingError::InvalidInput(format!(
                "property {number}: {name} must be >= 0"
            )));
        }
    }

    for (name, rate) in [
        ("annualRentalIncrease", property.annual_rental_increase),
        ("annualExpenseIncrease", property.annual_expense_increase),
        ("propertyAppreciation", property.property_appreciation),
    ] {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(GearingError::InvalidInput(format!(
                "property {number}: {name} must be > -1"
            )));
        }
    }

    if !(0.0..=1.0).contains(&property.property_manager_rate) {
        return Err(GearingError::InvalidInput(format!(
            "property {number}: propertyManagerRate must be between 0 and 1"
        )));
    }

    if !(1..=MAX_LOAN_TERM_YEARS).contains(&property.loan_term) {
        return Err(GearingError::InvalidInput(format!(
            "property {number}: loanTerm must be between 1 and {MAX_LOAN_TERM_YEARS}"
        )));
    }

    if !(1..=MAX_PAYMENT_FREQUENCY).contains(&property.payment_frequency) {
        return Err(GearingError::InvalidInput(format!(
            "property {number}: paymentFrequency must be between 1 and {MAX_PAYMENT_FREQUENCY}"
        )));
    }

    if property.purchase_year as usize > HORIZON_YEARS {
        return Err(GearingError::InvalidInput(format!(
            "property {number}: purchaseYear must be between 0 and {HORIZON_YEARS}"
        )));
    }

    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/defaults", get(defaults_handler))
        .route("/api/project", post(project_handler))
        .route("/api/project.csv", post(project_csv_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("gearing HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/defaults");

    axum::serve(listener, app).await
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, sample_request())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_handler(Json(payload): Json<ProjectPayload>) -> Response {
    let (request, results) = match run_payload(payload) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    json_response(StatusCode::OK, build_project_response(&request, results))
}

async fn project_csv_handler(Json(payload): Json<ProjectPayload>) -> Response {
    let (_, results) = match run_payload(payload) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match to_csv_string(&results) {
        Ok(body) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{CSV_FILE_NAME}\""),
                ),
            ],
            body,
        )),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn run_payload(payload: ProjectPayload) -> Result<(ProjectRequest, ConsolidatedResults)> {
    let outcome = request_from_payload(payload).and_then(|request| {
        let results = request.run()?;
        Ok((request, results))
    });

    match &outcome {
        Ok((request, _)) => info!(properties = request.properties.len(), "projection served"),
        Err(e) => warn!("rejected projection request: {e}"),
    }
    outcome
}

fn build_project_response(
    request: &ProjectRequest,
    results: ConsolidatedResults,
) -> ProjectResponse {
    ProjectResponse {
        property_count: request.properties.len(),
        annual_salary: request.overall.annual_salary,
        marginal_tax_rate: request.overall.marginal_tax_rate,
        years: results.years,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_payload_uses_one_default_property() {
        let request = request_from_json("{}").expect("valid request");
        assert_eq!(request.properties, vec![default_property_params()]);
        assert_eq!(request.overall, default_overall_params());
    }

    #[test]
    fn request_from_json_parses_camel_case_keys() {
        let json = r#"{
            "annualSalary": 120000,
            "marginalTaxRate": 0.37,
            "properties": [
                { "purchaseYear": 3, "loanTerm": 25, "paymentFrequency": 12, "weeklyRentalIncome": 550 },
                { "interestRate": 0.0, "landTax": 1200, "propertyManagerRate": 0.05 }
            ]
        }"#;

        let request = request_from_json(json).expect("valid request");
        assert_approx(request.overall.annual_salary, 120_000.0);
        assert_approx(request.overall.marginal_tax_rate, 0.37);
        assert_eq!(request.properties.len(), 2);

        let first = &request.properties[0];
        assert_eq!(first.purchase_year, 3);
        assert_eq!(first.loan_term, 25);
        assert_eq!(first.payment_frequency, 12);
        assert_approx(first.weekly_rental_income, 550.0);
        assert_approx(first.loan_amount, 450_000.0);

        let second = &request.properties[1];
        assert_approx(second.interest_rate, 0.0);
        assert_approx(second.land_tax, 1_200.0);
        assert_approx(second.property_manager_rate, 0.05);
        assert_eq!(second.loan_term, 30);
    }

    #[test]
    fn rejects_too_many_properties() {
        let json = format!(
            r#"{{ "properties": [{}] }}"#,
            vec!["{}"; MAX_PROPERTIES + 1].join(",")
        );
        let err = request_from_json(&json).expect_err("must reject six properties");
        assert!(err.to_string().contains("between 1 and 5"));
    }

    #[test]
    fn rejects_empty_property_list() {
        let err = request_from_json(r#"{ "properties": [] }"#).expect_err("must reject empty list");
        assert!(err.to_string().contains("properties"));
    }

    #[test]
    fn rejects_negative_money_naming_the_property() {
        let json = r#"{ "properties": [{}, { "loanAmount": -5 }] }"#;
        let err = request_from_json(json).expect_err("must reject negative loan");
        assert!(err.to_string().contains("property 2: loanAmount"));
    }

    #[test]
    fn rejects_oversized_loan_term_before_projecting() {
        let json = r#"{ "properties": [{ "loanTerm": 2000000000, "paymentFrequency": 1 }] }"#;
        let err = request_from_json(json).expect_err("must reject huge term");
        assert!(matches!(err, GearingError::InvalidInput(_)));
        assert!(err.to_string().contains("property 1: loanTerm"));
    }

    #[test]
    fn rejects_oversized_payment_frequency() {
        let json = r#"{ "properties": [{}, { "paymentFrequency": 100000 }] }"#;
        let err = request_from_json(json).expect_err("must reject huge frequency");
        assert!(err.to_string().contains("property 2: paymentFrequency"));
    }

    #[test]
    fn rejects_out_of_range_tax_rate() {
        let err = request_from_json(r#"{ "marginalTaxRate": 1.5 }"#).expect_err("must reject");
        assert!(err.to_string().contains("marginalTaxRate"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = request_from_json("{ not json").expect_err("must reject");
        assert!(matches!(err, GearingError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_loan_term() {
        let err = request_from_json(r#"{ "properties": [{ "loanTerm": 0 }] }"#)
            .expect_err("must reject zero term");
        assert!(err.to_string().contains("property 1: loanTerm must be between 1 and 100"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = request_from_json("{}").expect("valid request");
        let results = request.run().expect("valid projection");
        let response = build_project_response(&request, results);

        let value = serde_json::to_value(&response).expect("serializable");
        assert_eq!(value["propertyCount"], 1);
        assert_eq!(value["years"].as_array().map(Vec::len), Some(HORIZON_YEARS));

        let first = &value["years"][0];
        for key in [
            "year",
            "rentalIncome",
            "interestPayment",
            "principalPayment",
            "totalExpenses",
            "netRentalLoss",
            "taxBenefit",
            "cashflowAfterTax",
            "capitalGains",
            "finalNetGainLoss",
        ] {
            assert!(first.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(first["rentalIncome"], 20_800.0);
    }

    #[test]
    fn sample_request_round_trips_through_parser() {
        let json = serde_json::to_string(&sample_request()).expect("serializable");
        let request = request_from_json(&json).expect("sample is valid");
        assert_eq!(request.properties, vec![default_property_params()]);
    }
}
