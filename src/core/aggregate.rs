//! Derived sales statistics.
//!
//! Every function takes the record set it should summarise and is pure. The
//! slices may hold owned records or references (`&[TransactionRecord]` or
//! `&[&TransactionRecord]`). Groups are reported in first-seen order, and the
//! top performer on a tie is the name seen first.

use crate::core::{
    AggregateResult, FilterOptions, FilterSelection, FiscalYearTotal, Month, MonthlyTargets,
    MonthlyTopPerformer, PersonMonthly, PersonStats, PersonYearly, TargetAttainment, TopPerformer,
    TransactionRecord, YearlyByPerson,
};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSettings {
    pub targets: MonthlyTargets,
    /// First month of the custom fiscal year.
    pub fiscal_start_month: Month,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            targets: MonthlyTargets::default(),
            fiscal_start_month: Month::FEBRUARY,
        }
    }
}

/// Groups `records` by `key` and folds each group into an accumulator
/// created by `init`. Groups come back in the order their key first appears.
pub fn group_by<'r, R, K, A>(
    records: &'r [R],
    key: impl Fn(&'r TransactionRecord) -> K,
    init: impl Fn() -> A,
    fold: impl Fn(&mut A, &'r TransactionRecord),
) -> Vec<(K, A)>
where
    R: Borrow<TransactionRecord>,
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();

    for record in records {
        let record: &'r TransactionRecord = record.borrow();
        let k = key(record);
        let slot = match index.get(&k) {
            Some(&slot) => slot,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, init()));
                groups.len() - 1
            }
        };
        fold(&mut groups[slot].1, record);
    }

    groups
}

pub fn grand_total<R: Borrow<TransactionRecord>>(records: &[R]) -> f64 {
    records.iter().map(|r| r.borrow().amount).sum()
}

pub fn transaction_count<R: Borrow<TransactionRecord>>(records: &[R]) -> usize {
    records.len()
}

pub fn average_per_transaction<R: Borrow<TransactionRecord>>(records: &[R]) -> f64 {
    if records.is_empty() {
        0.0
    } else {
        grand_total(records) / records.len() as f64
    }
}

pub fn totals_by_person<R: Borrow<TransactionRecord>>(records: &[R]) -> Vec<(&str, f64)> {
    group_by(
        records,
        |r| r.salesperson.as_str(),
        || 0.0,
        |sum, r| *sum += r.amount,
    )
}

fn top_of<'a>(totals: impl IntoIterator<Item = (&'a str, f64)>) -> TopPerformer {
    let mut best: Option<(&str, f64)> = None;
    for (name, amount) in totals {
        match best {
            Some((_, top)) if amount <= top => {}
            _ => best = Some((name, amount)),
        }
    }

    best.map(|(name, amount)| TopPerformer {
        name: name.to_string(),
        amount,
    })
    .unwrap_or_default()
}

/// Salesperson with the highest summed amount; empty name and 0 for no records.
pub fn top_performer<R: Borrow<TransactionRecord>>(records: &[R]) -> TopPerformer {
    top_of(totals_by_person(records))
}

pub fn person_stats<R: Borrow<TransactionRecord>>(records: &[R]) -> Vec<PersonStats> {
    group_by(
        records,
        |r| r.salesperson.as_str(),
        || (0.0, 0usize),
        |(total, count), r| {
            *total += r.amount;
            *count += 1;
        },
    )
    .into_iter()
    .map(|(name, (total, count))| PersonStats {
        name: name.to_string(),
        total,
        count,
        average: total / count as f64,
    })
    .collect()
}

/// Totals per calendar month, index = month - 1.
pub fn monthly_totals<R: Borrow<TransactionRecord>>(records: &[R]) -> [f64; 12] {
    let mut totals = [0.0; 12];
    for record in records {
        let record = record.borrow();
        totals[record.month.index()] += record.amount;
    }
    totals
}

/// Top performer of each month that has at least one record, in calendar order.
pub fn monthly_top_performers<R: Borrow<TransactionRecord>>(
    records: &[R],
) -> Vec<MonthlyTopPerformer> {
    let mut by_month = group_by(
        records,
        |r| r.month,
        Vec::new,
        |group, r| group.push(r),
    );
    by_month.sort_by_key(|(month, _)| *month);

    by_month
        .into_iter()
        .map(|(month, month_records)| {
            let month_total = grand_total(&month_records);
            let top = top_performer(&month_records);
            let share_percent = if month_total > 0.0 {
                round_to(top.amount / month_total * 100.0, 1)
            } else {
                0.0
            };

            MonthlyTopPerformer {
                month,
                name: top.name,
                amount: top.amount,
                month_total,
                share_percent,
            }
        })
        .collect()
}

pub fn person_monthly<R: Borrow<TransactionRecord>>(records: &[R]) -> Vec<PersonMonthly> {
    group_by(
        records,
        |r| r.salesperson.as_str(),
        || [0.0; 12],
        |months, r| months[r.month.index()] += r.amount,
    )
    .into_iter()
    .map(|(name, monthly)| PersonMonthly {
        name: name.to_string(),
        monthly,
    })
    .collect()
}

/// Percentage of each month's target reached, rounded to a whole percent.
///
/// A target of 0 divides by 1 instead, so the percentage equals `total * 100`.
pub fn target_attainment(monthly_totals: &[f64; 12], targets: &MonthlyTargets) -> Vec<TargetAttainment> {
    Month::all()
        .map(|month| {
            let total = monthly_totals[month.index()];
            let target = targets.target(month);
            let divisor = if target > 0.0 { target } else { 1.0 };

            TargetAttainment {
                month,
                total,
                target,
                percent: (total / divisor * 100.0).round() as u64,
            }
        })
        .collect()
}

/// Year used as the fiscal window's start: the selected year if it is a
/// number, otherwise `current_year`.
pub fn resolve_fiscal_year(selection: &FilterSelection, current_year: i32) -> i32 {
    selection
        .year
        .as_only()
        .and_then(|year| year.trim().parse::<i32>().ok())
        .unwrap_or(current_year)
}

/// Total over the twelve months starting at `start_month` of `start_year`.
///
/// Meant for the unfiltered record set. Year labels that are not numbers
/// never fall inside the window.
pub fn fiscal_year_total<R: Borrow<TransactionRecord>>(
    records: &[R],
    start_year: i32,
    start_month: Month,
) -> FiscalYearTotal {
    let total = records
        .iter()
        .map(|r| r.borrow())
        .filter(|r| match r.sales_year.trim().parse::<i32>() {
            Ok(year) if year == start_year => r.month >= start_month,
            Ok(year) if Some(year) == start_year.checked_add(1) => r.month < start_month,
            _ => false,
        })
        .map(|r| r.amount)
        .sum();

    FiscalYearTotal {
        start_year,
        start_month,
        total,
    }
}

/// Per-person totals for each year label; years and names sorted as text.
pub fn yearly_by_person<R: Borrow<TransactionRecord>>(records: &[R]) -> YearlyByPerson {
    let years: Vec<String> = records
        .iter()
        .map(|r| r.borrow().sales_year.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rows: Vec<PersonYearly> = group_by(
        records,
        |r| r.salesperson.as_str(),
        || vec![0.0; years.len()],
        |totals, r| {
            if let Ok(slot) = years.binary_search(&r.sales_year) {
                totals[slot] += r.amount;
            }
        },
    )
    .into_iter()
    .map(|(name, totals)| PersonYearly {
        name: name.to_string(),
        totals,
    })
    .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    YearlyByPerson { years, rows }
}

/// Distinct year labels and salesperson names, sorted, for filter pickers.
pub fn filter_options<R: Borrow<TransactionRecord>>(records: &[R]) -> FilterOptions {
    let mut years = BTreeSet::new();
    let mut salespeople = BTreeSet::new();
    for record in records {
        let record = record.borrow();
        years.insert(record.sales_year.clone());
        salespeople.insert(record.salesperson.clone());
    }

    FilterOptions {
        years: years.into_iter().collect(),
        salespeople: salespeople.into_iter().collect(),
    }
}

/// Builds every aggregate for one selection. `filtered` feeds all figures
/// except the fiscal-year total, which is taken over `full`.
pub fn aggregate<F, A>(
    filtered: &[F],
    full: &[A],
    selection: &FilterSelection,
    settings: &AggregateSettings,
    current_year: i32,
) -> AggregateResult
where
    F: Borrow<TransactionRecord>,
    A: Borrow<TransactionRecord>,
{
    let monthly = monthly_totals(filtered);
    let fiscal_start = resolve_fiscal_year(selection, current_year);

    AggregateResult {
        total: grand_total(filtered),
        average: average_per_transaction(filtered),
        count: transaction_count(filtered),
        top_performer: top_performer(filtered),
        person_stats: person_stats(filtered),
        monthly_totals: monthly,
        monthly_top_performers: monthly_top_performers(filtered),
        person_monthly: person_monthly(filtered),
        target_attainment: target_attainment(&monthly, &settings.targets),
        fiscal_year: fiscal_year_total(full, fiscal_start, settings.fiscal_start_month),
        yearly_by_person: yearly_by_person(filtered),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
