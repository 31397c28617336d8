//! Spreadsheet and terminal renderings of a consolidated projection.

use std::fmt::Write as _;
use std::io::Write;

use csv::WriterBuilder;

use crate::core::{ConsolidatedResults, ProjectionYear};
use crate::error::Result;

pub const COLUMNS: [&str; 10] = [
    "Year",
    "Rental Income",
    "Interest Payment",
    "Principal Payment",
    "Total Expenses",
    "Net Rental Loss",
    "Tax Benefit",
    "Cashflow after Negative Gearing",
    "Capital Gains",
    "Final Net Gain/Loss",
];

pub const CSV_FILE_NAME: &str = "investment_outlook.csv";

fn amounts(row: &ProjectionYear) -> [f64; 9] {
    [
        row.rental_income,
        row.interest_payment,
        row.principal_payment,
        row.total_expenses,
        row.net_rental_loss,
        row.tax_benefit,
        row.cashflow_after_tax,
        row.capital_gains,
        row.final_net_gain_loss,
    ]
}

pub fn write_csv<W: Write>(w: W, results: &ConsolidatedResults) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(w);
    wtr.write_record(COLUMNS)?;
    for row in &results.years {
        let mut record = Vec::with_capacity(COLUMNS.len());
        record.push(row.year.to_string());
        record.extend(amounts(row).iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(results: &ConsolidatedResults) -> Result<String> {
    let mut out = Vec::new();
    write_csv(&mut out, results)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub fn render_table(results: &ConsolidatedResults) -> String {
    let widths = COLUMNS.map(|name| name.len().max(12));
    let mut out = String::new();

    let header = COLUMNS
        .iter()
        .zip(widths)
        .map(|(name, width)| format!("{name:>width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{header}");

    for row in &results.years {
        let mut cells = vec![format!("{:>width$}", row.year, width = widths[0])];
        cells.extend(
            amounts(row)
                .iter()
                .zip(&widths[1..])
                .map(|(value, width)| format!("{value:>width$.2}", width = *width)),
        );
        let _ = writeln!(out, "{}", cells.join("  "));
    }
    out
}
