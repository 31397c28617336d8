mod engine;
mod loan;
mod types;

pub use engine::{project, project_property, validate_property};
pub use loan::{annual_totals, compute_payment, generate_schedule};
pub use types::{
    AmortizationSchedule, AnnualProjection, ConsolidatedResults, HORIZON_YEARS, MAX_LOAN_TERM_YEARS,
    MAX_PAYMENT_FREQUENCY, OverallParams, ProjectionYear, PropertyParams, WEEKS_PER_YEAR,
};
