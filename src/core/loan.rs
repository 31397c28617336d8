use super::types::AmortizationSchedule;

pub fn periodic_rate(annual_rate: f64, payments_per_year: u32) -> f64 {
    annual_rate / payments_per_year as f64
}

pub fn period_count(years: u32, payments_per_year: u32) -> usize {
    years as usize * payments_per_year as usize
}

/// Fixed periodic payment that retires `principal` over `years * payments_per_year`
/// periods. A zero rate repays straight-line.
pub fn compute_payment(
    principal: f64,
    annual_rate: f64,
    years: u32,
    payments_per_year: u32,
) -> f64 {
    let n = period_count(years, payments_per_year);
    if n == 0 {
        return 0.0;
    }

    let r = periodic_rate(annual_rate, payments_per_year);
    if r == 0.0 {
        return principal / n as f64;
    }

    let growth = (1.0 + r).powi(n as i32);
    principal * r * growth / (growth - 1.0)
}

pub fn generate_schedule(
    principal: f64,
    annual_rate: f64,
    years: u32,
    payments_per_year: u32,
    payment: f64,
) -> AmortizationSchedule {
    let n = period_count(years, payments_per_year);
    let r = periodic_rate(annual_rate, payments_per_year);
    let mut schedule = AmortizationSchedule {
        payments: Vec::with_capacity(n),
        interests: Vec::with_capacity(n),
        principals: Vec::with_capacity(n),
    };

    let mut balance = principal;
    for _ in 0..n {
        let interest = balance * r;
        let mut principal_paid = payment - interest;
        balance -= principal_paid;

        if balance < 0.0 {
            // Overpayment: only retire what is left, then stop.
            principal_paid += balance;
            schedule.payments.push(principal_paid + interest);
            schedule.interests.push(interest);
            schedule.principals.push(principal_paid);
            break;
        }

        schedule.payments.push(payment);
        schedule.interests.push(interest);
        schedule.principals.push(principal_paid);
    }

    schedule
}

/// Sums consecutive runs of `periods_per_year` entries into `years` annual
/// buckets. Years past the end of a short schedule are zero.
pub fn annual_totals(values: &[f64], periods_per_year: usize, years: usize) -> Vec<f64> {
    (0..years)
        .map(|year| {
            let start = (year * periods_per_year).min(values.len());
            let end = ((year + 1) * periods_per_year).min(values.len());
            values[start..end].iter().sum()
        })
        .collect()
}
