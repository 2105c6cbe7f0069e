use crate::core::{FilterSelection, TransactionRecord};

pub fn matches(record: &TransactionRecord, selection: &FilterSelection) -> bool {
    selection.year.matches(&record.sales_year)
        && selection.month.matches(&record.month)
        && selection.salesperson.matches(&record.salesperson)
}

/// Records passing `selection`, in input order.
pub fn filter(records: &[TransactionRecord], selection: &FilterSelection) -> Vec<TransactionRecord> {
    records
        .iter()
        .filter(|record| matches(record, selection))
        .cloned()
        .collect()
}

/// Borrowing variant of [`filter`], for callers that keep the full set around.
pub fn filter_refs<'a>(
    records: &'a [TransactionRecord],
    selection: &FilterSelection,
) -> Vec<&'a TransactionRecord> {
    records
        .iter()
        .filter(|record| matches(record, selection))
        .collect()
}
