//! Turns the raw feed text into typed transaction records.
//!
//! Quoting is off: a value that contains the delimiter shifts the row's field
//! count and the row is dropped.

use crate::core::{FeedColumns, Month, TransactionRecord};
use crate::utils::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Parses a comma-separated feed using the default column names.
pub fn parse(raw: &str) -> Result<Vec<TransactionRecord>> {
    parse_with_columns(raw, &FeedColumns::default(), ',')
}

/// Parses a delimited feed whose header names the columns in `columns`.
///
/// Rows whose field count differs from the header are skipped without error.
/// Amounts that do not parse become 0 and months that do not parse become 1.
pub fn parse_with_columns(
    raw: &str,
    columns: &FeedColumns,
    delimiter: char,
) -> Result<Vec<TransactionRecord>> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| EtlError::InvalidConfigValueError {
            field: "delimiter".to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII character".to_string(),
        })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(raw.as_bytes());
    let mut rows = reader.records();

    let headers: StringRecord = match rows.next() {
        Some(header) => header?,
        None => return Err(EtlError::EmptyFeed),
    };
    if headers.iter().all(str::is_empty) {
        return Err(EtlError::EmptyFeed);
    }

    let layout = ColumnLayout::locate(&headers, columns)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let row = row?;
        if row.len() != headers.len() {
            tracing::trace!(
                "Skipping line {}: expected {} fields, found {}",
                row.position().map(|p| p.line()).unwrap_or_default(),
                headers.len(),
                row.len()
            );
            skipped += 1;
            continue;
        }

        records.push(layout.build(&headers, &row));
    }

    tracing::debug!(
        "Parsed {} records ({} malformed rows skipped)",
        records.len(),
        skipped
    );
    Ok(records)
}

/// Positions of the required columns within the header.
struct ColumnLayout {
    year: usize,
    month: usize,
    salesperson: usize,
    amount: usize,
}

impl ColumnLayout {
    fn locate(headers: &StringRecord, columns: &FeedColumns) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name.trim())
                .ok_or_else(|| EtlError::MissingColumn {
                    column: name.to_string(),
                })
        };

        Ok(Self {
            year: find(&columns.year)?,
            month: find(&columns.month)?,
            salesperson: find(&columns.salesperson)?,
            amount: find(&columns.amount)?,
        })
    }

    fn build(&self, headers: &StringRecord, values: &StringRecord) -> TransactionRecord {
        let used = [self.year, self.month, self.salesperson, self.amount];
        let extra = headers
            .iter()
            .zip(values.iter())
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, (h, v))| (h.to_string(), v.to_string()))
            .collect();

        TransactionRecord {
            sales_year: values[self.year].to_string(),
            month: coerce_month(&values[self.month]),
            salesperson: values[self.salesperson].to_string(),
            amount: coerce_amount(&values[self.amount]),
            extra,
        }
    }
}

/// Decimal amount; anything unparseable, non-finite or negative is 0.
pub fn coerce_amount(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
        _ => 0.0,
    }
}

/// Reads the leading integer of `value` (so `"3.0"` is 3). Anything that
/// does not land in 1..=12 falls back to January.
pub fn coerce_month(value: &str) -> Month {
    let value = value.trim();
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let digits_len = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let negative = value.starts_with('-');

    unsigned[..digits_len]
        .parse::<u8>()
        .ok()
        .filter(|_| !negative)
        .and_then(Month::new)
        .unwrap_or(Month::JANUARY)
}
