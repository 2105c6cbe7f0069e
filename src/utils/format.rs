//! Display helpers for the text summary. Report files keep raw numbers.

use crate::core::SalesReport;
use std::fmt;

/// Formats an amount as pounds sterling the way en-GB renders it: `£1,234.56`.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let pence = (value.abs() * 100.0).round() as u64;
    let pounds = (pence / 100).to_string();

    let mut grouped = String::with_capacity(pounds.len() + pounds.len() / 3);
    for (i, digit) in pounds.chars().enumerate() {
        if i > 0 && (pounds.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!(
        "{}£{}.{:02}",
        if negative { "-" } else { "" },
        grouped,
        pence % 100
    )
}

/// Formats a whole or fractional percentage, e.g. `62%` or `66.7%`.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

/// Plain-text dashboard for the terminal: headline figures, per-person table and targets.
pub fn render_summary(report: &SalesReport) -> String {
    Summary(report).to_string()
}

/// Terminal rendering of a report.
pub struct Summary<'a>(pub &'a SalesReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let agg = &report.aggregates;

        writeln!(f, "{}", report.title)?;
        writeln!(
            f,
            "  Year: {}  Month: {}  Salesperson: {}",
            report.selection.year, report.selection.month, report.selection.salesperson
        )?;
        writeln!(f, "  Transactions: {} of {}", agg.count, report.feed_records)?;
        writeln!(f, "  Total sales: {}", format_currency(agg.total))?;
        writeln!(
            f,
            "  Average per transaction: {}",
            format_currency(agg.average)
        )?;
        if agg.top_performer.is_empty() {
            writeln!(f, "  Top performer: -")?;
        } else {
            writeln!(
                f,
                "  Top performer: {} ({})",
                agg.top_performer.name,
                format_currency(agg.top_performer.amount)
            )?;
        }

        let fy = &agg.fiscal_year;
        match fy.start_year.checked_add(1) {
            Some(next) => write!(f, "  Fiscal year {}/{:02}", fy.start_year, next.rem_euclid(100))?,
            None => write!(f, "  Fiscal year {}", fy.start_year)?,
        }
        writeln!(
            f,
            " from {}: {}",
            fy.start_month.name(),
            format_currency(fy.total)
        )?;

        if !agg.person_stats.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sales team")?;
            for person in &agg.person_stats {
                writeln!(
                    f,
                    "  {:<24} {:>14}  {:>4} sales  avg {}",
                    person.name,
                    format_currency(person.total),
                    person.count,
                    format_currency(person.average)
                )?;
            }
        }

        if !agg.target_attainment.is_empty() {
            writeln!(f)?;
            writeln!(f, "Monthly target")?;
            for row in &agg.target_attainment {
                writeln!(
                    f,
                    "  {:<10} {:>14} / {:>14}  {}",
                    row.month.name(),
                    format_currency(row.total),
                    format_currency(row.target),
                    format_percent(row.percent as f64)
                )?;
            }
        }

        Ok(())
    }
}
