use crate::core::aggregate::{self, AggregateSettings};
use crate::core::filter::filter_refs;
use crate::core::parser::parse_with_columns;
use crate::core::{
    AggregateResult, FeedColumns, FeedSource, FilterOptions, FilterSelection, TransactionRecord,
};
use crate::utils::error::Result;
use chrono::{DateTime, Datelike, Local, Utc};

/// Holds the full record set of one refresh cycle and answers filter
/// selections against it.
///
/// A refresh replaces the records wholesale. When a refresh fails the
/// previous records stay in place, so a view can keep showing the last good
/// data while reporting the error.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    records: Vec<TransactionRecord>,
    columns: FeedColumns,
    delimiter: char,
    settings: AggregateSettings,
    last_updated: Option<DateTime<Utc>>,
}

impl DashboardSession {
    pub fn new(columns: FeedColumns, delimiter: char, settings: AggregateSettings) -> Self {
        Self {
            records: Vec::new(),
            columns,
            delimiter,
            settings,
            last_updated: None,
        }
    }

    /// Session over records that were parsed elsewhere.
    pub fn from_records(records: Vec<TransactionRecord>, settings: AggregateSettings) -> Self {
        Self {
            records,
            columns: FeedColumns::default(),
            delimiter: ',',
            settings,
            last_updated: Some(Utc::now()),
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Parses `raw` and swaps it in as the record set. Returns the record count.
    pub fn load_feed(&mut self, raw: &str) -> Result<usize> {
        let records = parse_with_columns(raw, &self.columns, self.delimiter)?;
        self.records = records;
        self.last_updated = Some(Utc::now());
        Ok(self.records.len())
    }

    /// Fetches the feed and loads it. On failure the current records are kept.
    pub async fn refresh<F: FeedSource>(&mut self, source: &F) -> Result<usize> {
        let outcome = match source.fetch().await {
            Ok(raw) => self.load_feed(&raw),
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            tracing::warn!(
                "Feed refresh failed, keeping {} previously loaded records: {}",
                self.records.len(),
                e
            );
        }
        outcome
    }

    pub fn filter_options(&self) -> FilterOptions {
        aggregate::filter_options(&self.records)
    }

    /// Aggregates for `selection`, with the fiscal year defaulting to the
    /// current local calendar year.
    pub fn apply(&self, selection: &FilterSelection) -> AggregateResult {
        self.apply_at(selection, Local::now().year())
    }

    pub fn apply_at(&self, selection: &FilterSelection, current_year: i32) -> AggregateResult {
        let filtered = filter_refs(&self.records, selection);
        tracing::debug!(
            "Selection year={} month={} salesperson={} matched {} of {} records",
            selection.year,
            selection.month,
            selection.salesperson,
            filtered.len(),
            self.records.len()
        );
        aggregate::aggregate(
            &filtered,
            &self.records,
            selection,
            &self.settings,
            current_year,
        )
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(FeedColumns::default(), ',', AggregateSettings::default())
    }
}
