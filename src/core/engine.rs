use tracing::debug;

use super::loan::{annual_totals, compute_payment, generate_schedule};
use super::types::{
    AmortizationSchedule, AnnualProjection, ConsolidatedResults, HORIZON_YEARS,
    MAX_LOAN_TERM_YEARS, MAX_PAYMENT_FREQUENCY, OverallParams, ProjectionYear, PropertyParams,
    WEEKS_PER_YEAR,
};
use crate::error::{GearingError, Result};

struct TimelineTotals {
    rental_income: [f64; HORIZON_YEARS],
    interest: [f64; HORIZON_YEARS],
    principal: [f64; HORIZON_YEARS],
    total_expenses: [f64; HORIZON_YEARS],
    net_rental_loss: [f64; HORIZON_YEARS],
    tax_benefit: [f64; HORIZON_YEARS],
    net_profit_after_tax: [f64; HORIZON_YEARS],
    capital_gains: [f64; HORIZON_YEARS],
}

impl TimelineTotals {
    fn new() -> Self {
        Self {
            rental_income: [0.0; HORIZON_YEARS],
            interest: [0.0; HORIZON_YEARS],
            principal: [0.0; HORIZON_YEARS],
            total_expenses: [0.0; HORIZON_YEARS],
            net_rental_loss: [0.0; HORIZON_YEARS],
            tax_benefit: [0.0; HORIZON_YEARS],
            net_profit_after_tax: [0.0; HORIZON_YEARS],
            capital_gains: [0.0; HORIZON_YEARS],
        }
    }

    fn add(&mut self, purchase_year: usize, projection: &AnnualProjection) {
        add_aligned(&mut self.rental_income, purchase_year, &projection.rental_income);
        add_aligned(&mut self.interest, purchase_year, &projection.interest);
        add_aligned(&mut self.principal, purchase_year, &projection.principal);
        add_aligned(&mut self.total_expenses, purchase_year, &projection.total_expenses);
        add_aligned(&mut self.net_rental_loss, purchase_year, &projection.net_rental_loss);
        add_aligned(&mut self.tax_benefit, purchase_year, &projection.tax_benefit);
        add_aligned(
            &mut self.net_profit_after_tax,
            purchase_year,
            &projection.net_profit_after_tax,
        );
        add_aligned(&mut self.capital_gains, purchase_year, &projection.capital_gains);
    }

    fn into_results(self) -> ConsolidatedResults {
        let years = (0..HORIZON_YEARS)
            .map(|idx| ProjectionYear {
                year: idx as u32 + 1,
                rental_income: self.rental_income[idx],
                interest_payment: self.interest[idx],
                principal_payment: self.principal[idx],
                total_expenses: self.total_expenses[idx],
                net_rental_loss: self.net_rental_loss[idx],
                tax_benefit: self.tax_benefit[idx],
                cashflow_after_tax: self.net_profit_after_tax[idx],
                capital_gains: self.capital_gains[idx],
                final_net_gain_loss: self.net_profit_after_tax[idx] + self.capital_gains[idx],
            })
            .collect();
        ConsolidatedResults { years }
    }
}

/// Adds `series` into `timeline` starting at `start`, dropping anything that
/// would land past the horizon.
fn add_aligned(timeline: &mut [f64; HORIZON_YEARS], start: usize, series: &[f64]) {
    if start >= HORIZON_YEARS {
        return;
    }
    for (slot, value) in timeline[start..].iter_mut().zip(series) {
        *slot += value;
    }
}

/// Rejects the parameters the projection cannot give a meaningful schedule for.
/// `index` is zero-based; errors report it one-based.
pub fn validate_property(index: usize, property: &PropertyParams) -> Result<()> {
    let invalid = |field: &'static str, reason: &str| GearingError::InvalidParameter {
        property: index + 1,
        field,
        reason: reason.to_string(),
    };

    if property.loan_term == 0 {
        return Err(invalid("loan_term", "must be > 0"));
    }
    if property.loan_term > MAX_LOAN_TERM_YEARS {
        return Err(invalid(
            "loan_term",
            &format!("must be at most {MAX_LOAN_TERM_YEARS} years"),
        ));
    }
    if property.payment_frequency == 0 {
        return Err(invalid("payment_frequency", "must be > 0"));
    }
    if property.payment_frequency > MAX_PAYMENT_FREQUENCY {
        return Err(invalid(
            "payment_frequency",
            &format!("must be at most {MAX_PAYMENT_FREQUENCY} per year"),
        ));
    }
    if property.purchase_year as usize > HORIZON_YEARS {
        return Err(invalid(
            "purchase_year",
            &format!("must be between 0 and {HORIZON_YEARS}"),
        ));
    }
    Ok(())
}

/// Annual series for one property over its own loan life. Assumes the
/// property already passed [`validate_property`].
pub fn project_property(property: &PropertyParams, overall: &OverallParams) -> AnnualProjection {
    let payment = compute_payment(
        property.loan_amount,
        property.interest_rate,
        property.loan_term,
        property.payment_frequency,
    );
    let schedule = generate_schedule(
        property.loan_amount,
        property.interest_rate,
        property.loan_term,
        property.payment_frequency,
        payment,
    );

    debug!(
        purchase_year = property.purchase_year,
        payment,
        periods = schedule.len(),
        "amortized loan"
    );
    annual_series(property, overall, &schedule)
}

/// Turns a property's loan schedule into its yearly series. The schedule may
/// be shorter than the full term; missing years carry no interest or principal.
fn annual_series(
    property: &PropertyParams,
    overall: &OverallParams,
    schedule: &AmortizationSchedule,
) -> AnnualProjection {
    let loan_term = property.loan_term as usize;
    let frequency = property.payment_frequency as usize;

    let interest = annual_totals(&schedule.interests, frequency, loan_term);
    let principal = annual_totals(&schedule.principals, frequency, loan_term);

    let rental_income = (0..loan_term)
        .map(|year| {
            property.weekly_rental_income
                * WEEKS_PER_YEAR
                * (1.0 + property.annual_rental_increase).powi(year as i32)
        })
        .collect::<Vec<_>>();

    let escalating_costs = property.council_rates
        + property.water_rates
        + property.strata_fees
        + property.insurance;
    let flat_costs = property.land_tax + property.repairs_and_maintenance + property.depreciation;

    let total_expenses = (0..loan_term)
        .map(|year| {
            // Escalating costs are already one year grown in the first year.
            let escalation = (1.0 + property.annual_expense_increase).powi(year as i32 + 1);
            interest[year]
                + escalating_costs * escalation
                + flat_costs
                + property.property_manager_rate * rental_income[year]
        })
        .collect::<Vec<_>>();

    let net_rental_loss = rental_income
        .iter()
        .zip(&total_expenses)
        .map(|(income, expenses)| income - expenses)
        .collect::<Vec<_>>();
    let tax_benefit = net_rental_loss
        .iter()
        .map(|loss| -loss * overall.marginal_tax_rate)
        .collect::<Vec<_>>();
    let net_profit_after_tax = net_rental_loss
        .iter()
        .zip(&tax_benefit)
        .map(|(loss, benefit)| loss + benefit)
        .collect::<Vec<_>>();

    let property_values = (0..=loan_term)
        .map(|year| {
            property.property_value * (1.0 + property.property_appreciation).powi(year as i32)
        })
        .collect::<Vec<_>>();
    let capital_gains = property_values
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect::<Vec<_>>();

    AnnualProjection {
        rental_income,
        interest,
        principal,
        total_expenses,
        net_rental_loss,
        tax_benefit,
        net_profit_after_tax,
        capital_gains,
    }
}

pub fn project(
    properties: &[PropertyParams],
    overall: &OverallParams,
) -> Result<ConsolidatedResults> {
    for (index, property) in properties.iter().enumerate() {
        validate_property(index, property)?;
    }

    let projections = properties
        .iter()
        .map(|property| {
            (
                property.purchase_year as usize,
                project_property(property, overall),
            )
        })
        .collect::<Vec<_>>();

    let mut totals = TimelineTotals::new();
    for (purchase_year, projection) in &projections {
        totals.add(*purchase_year, projection);
    }

    debug!(properties = properties.len(), "aggregated portfolio");
    Ok(totals.into_results())
}
