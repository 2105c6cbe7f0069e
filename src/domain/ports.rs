use crate::domain::model::{
    FeedColumns, FilterSelection, Month, MonthlyTargets, SalesReport, TransactionRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Supplies the raw feed text. The only place the pipeline suspends.
pub trait FeedSource: Send + Sync {
    fn fetch(&self) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn feed_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn selection(&self) -> Result<FilterSelection>;

    fn columns(&self) -> FeedColumns {
        FeedColumns::default()
    }

    fn delimiter(&self) -> char {
        ','
    }

    fn targets(&self) -> Result<MonthlyTargets> {
        Ok(MonthlyTargets::default())
    }

    /// Append a cache-busting query parameter to the feed URL.
    fn cache_bust(&self) -> bool {
        true
    }

    /// Feed request timeout; `None` waits indefinitely.
    fn feed_timeout(&self) -> Option<std::time::Duration> {
        None
    }

    fn fiscal_start_month(&self) -> Month {
        Month::FEBRUARY
    }

    fn report_title(&self) -> &str {
        "Sales dashboard"
    }

    /// Report files to write: any of "json" and "csv".
    fn output_formats(&self) -> Vec<String> {
        vec!["json".to_string(), "csv".to_string()]
    }

    /// `None` writes loose files instead of a ZIP bundle.
    fn bundle_name(&self) -> Option<&str> {
        Some("sales_report.zip")
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<TransactionRecord>>;
    async fn transform(&self, records: Vec<TransactionRecord>) -> Result<SalesReport>;
    async fn load(&self, report: &SalesReport) -> Result<String>;
}
