use serde::{Deserialize, Serialize};

pub const HORIZON_YEARS: usize = 30;
pub const WEEKS_PER_YEAR: f64 = 52.0;
pub const MAX_LOAN_TERM_YEARS: u32 = 100;
pub const MAX_PAYMENT_FREQUENCY: u32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyParams {
    pub purchase_year: u32,
    pub property_value: f64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub loan_term: u32,
    pub payment_frequency: u32,
    pub weekly_rental_income: f64,
    pub annual_rental_increase: f64,
    pub annual_expense_increase: f64,
    pub property_appreciation: f64,
    pub council_rates: f64,
    pub water_rates: f64,
    pub land_tax: f64,
    pub strata_fees: f64,
    pub insurance: f64,
    pub property_manager_rate: f64,
    pub repairs_and_maintenance: f64,
    pub depreciation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallParams {
    /// Informational only; the projection does not derive tax brackets from it.
    pub annual_salary: f64,
    pub marginal_tax_rate: f64,
}

/// Per-period loan breakdown. All three vectors have the same length, which is
/// `loan_term * payment_frequency` unless the loan paid off early.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmortizationSchedule {
    pub payments: Vec<f64>,
    pub interests: Vec<f64>,
    pub principals: Vec<f64>,
}

impl AmortizationSchedule {
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn total_interest(&self) -> f64 {
        self.interests.iter().sum()
    }

    pub fn total_principal(&self) -> f64 {
        self.principals.iter().sum()
    }
}

/// One property's series over its own loan life, indexed from its purchase year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualProjection {
    pub rental_income: Vec<f64>,
    pub interest: Vec<f64>,
    pub principal: Vec<f64>,
    pub total_expenses: Vec<f64>,
    pub net_rental_loss: Vec<f64>,
    pub tax_benefit: Vec<f64>,
    pub net_profit_after_tax: Vec<f64>,
    pub capital_gains: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionYear {
    pub year: u32,
    pub rental_income: f64,
    pub interest_payment: f64,
    pub principal_payment: f64,
    pub total_expenses: f64,
    pub net_rental_loss: f64,
    pub tax_benefit: f64,
    pub cashflow_after_tax: f64,
    pub capital_gains: f64,
    pub final_net_gain_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedResults {
    pub years: Vec<ProjectionYear>,
}
