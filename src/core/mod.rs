pub mod aggregate;
pub mod etl;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod session;

pub use crate::domain::model::{
    AggregateResult, FeedColumns, FilterOptions, FilterSelection, FiscalYearTotal, Month,
    MonthlyTargets, MonthlyTopPerformer, PersonMonthly, PersonStats, PersonYearly, SalesReport,
    Selector, TargetAttainment, TopPerformer, TransactionRecord, YearlyByPerson,
};
pub use crate::domain::ports::{ConfigProvider, FeedSource, Pipeline, Storage};
pub use crate::utils::error::Result;
