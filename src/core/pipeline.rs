use crate::adapters::HttpFeed;
use crate::core::aggregate::AggregateSettings;
use crate::core::parser::parse_with_columns;
use crate::core::report;
use crate::core::session::DashboardSession;
use crate::core::{ConfigProvider, FeedSource, Pipeline, SalesReport, Storage, TransactionRecord};
use crate::utils::error::Result;

/// Last feed text that fetched and parsed successfully, kept in storage.
pub const FEED_CACHE_FILE: &str = "feed_cache.csv";

pub struct SalesPipeline<S: Storage, C: ConfigProvider, F: FeedSource> {
    storage: S,
    config: C,
    feed: F,
}

impl<S: Storage, C: ConfigProvider, F: FeedSource> SalesPipeline<S, C, F> {
    pub fn new(storage: S, config: C, feed: F) -> Self {
        Self {
            storage,
            config,
            feed,
        }
    }

    fn parse(&self, raw: &str) -> Result<Vec<TransactionRecord>> {
        parse_with_columns(raw, &self.config.columns(), self.config.delimiter())
    }
}

impl<S: Storage, C: ConfigProvider> SalesPipeline<S, C, HttpFeed> {
    /// Pipeline reading the feed over HTTP from the configured URL.
    pub fn with_http_feed(storage: S, config: C) -> Result<Self> {
        let feed = HttpFeed::new(config.feed_url())
            .with_cache_bust(config.cache_bust())
            .with_timeout(config.feed_timeout())?;
        Ok(Self::new(storage, config, feed))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, F: FeedSource> Pipeline for SalesPipeline<S, C, F> {
    async fn extract(&self) -> Result<Vec<TransactionRecord>> {
        // A body that does not parse (e.g. an unpublished sheet's HTML page) counts as a failed fetch.
        let fetched = self
            .feed
            .fetch()
            .await
            .and_then(|raw| {
                let records = self.parse(&raw)?;
                Ok((raw, records))
            });

        match fetched {
            Ok((raw, records)) => {
                if let Err(e) = self.storage.write_file(FEED_CACHE_FILE, raw.as_bytes()).await {
                    tracing::warn!("Could not cache feed copy: {}", e);
                }
                Ok(records)
            }
            Err(feed_error) => {
                tracing::warn!("Feed retrieval failed: {}", feed_error);
                match self.storage.read_file(FEED_CACHE_FILE).await {
                    Ok(bytes) => {
                        tracing::warn!("Falling back to the last cached feed copy");
                        self.parse(&String::from_utf8_lossy(&bytes))
                    }
                    Err(_) => Err(feed_error),
                }
            }
        }
    }

    async fn transform(&self, records: Vec<TransactionRecord>) -> Result<SalesReport> {
        let selection = self.config.selection()?;
        let settings = AggregateSettings {
            targets: self.config.targets()?,
            fiscal_start_month: self.config.fiscal_start_month(),
        };

        let session = DashboardSession::from_records(records, settings);
        let aggregates = session.apply(&selection);

        Ok(SalesReport {
            title: self.config.report_title().to_string(),
            generated_at: session.last_updated().unwrap_or_else(chrono::Utc::now),
            feed_records: session.records().len(),
            filter_options: session.filter_options(),
            selection,
            aggregates,
        })
    }

    async fn load(&self, report: &SalesReport) -> Result<String> {
        let files = report::render_files(report, &self.config.output_formats())?;
        let output_path = self.config.output_path().trim_end_matches('/');

        match self.config.bundle_name() {
            Some(bundle) => {
                let zip_data = report::bundle_zip(&files)?;
                tracing::debug!(
                    "Writing ZIP bundle with {} files ({} bytes)",
                    files.len(),
                    zip_data.len()
                );
                self.storage.write_file(bundle, &zip_data).await?;
                Ok(format!("{}/{}", output_path, bundle))
            }
            None => {
                for file in &files {
                    self.storage.write_file(&file.name, &file.contents).await?;
                }
                tracing::debug!("Wrote {} report files", files.len());
                Ok(output_path.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FilterSelection, Month, MonthlyTargets};
    use crate::utils::error::EtlError;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const FEED: &str = "Sales year,Month,Sales person name,Sales amount\n\
                        2024,3,Alice,1000\n\
                        2024,3,Bob,500\n\
                        2024,4,Alice,2000\n";

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        feed_url: String,
        selection: FilterSelection,
        bundle: Option<&'static str>,
    }

    impl MockConfig {
        fn new(feed_url: String) -> Self {
            Self {
                feed_url,
                selection: FilterSelection::all(),
                bundle: Some("sales_report.zip"),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn feed_url(&self) -> &str {
            &self.feed_url
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn selection(&self) -> Result<FilterSelection> {
            Ok(self.selection.clone())
        }

        fn targets(&self) -> Result<MonthlyTargets> {
            let mut targets = [1000.0; 12];
            targets[0] = 0.0;
            Ok(MonthlyTargets::new(targets))
        }

        fn bundle_name(&self) -> Option<&str> {
            self.bundle
        }
    }

    fn pipeline(
        server: &MockServer,
        storage: MockStorage,
        config_fn: impl FnOnce(&mut MockConfig),
    ) -> SalesPipeline<MockStorage, MockConfig, HttpFeed> {
        let mut config = MockConfig::new(server.url("/feed"));
        config_fn(&mut config);
        SalesPipeline::with_http_feed(storage, config).unwrap()
    }

    #[tokio::test]
    async fn test_extract_parses_feed_and_caches_it() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200).body(FEED);
        });

        let storage = MockStorage::new();
        let pipeline = pipeline(&server, storage.clone(), |_| {});
        let records = pipeline.extract().await.unwrap();

        feed_mock.assert();
        assert_eq!(records.len(), 3);
        assert_eq!(
            storage.get_file(FEED_CACHE_FILE).await.unwrap(),
            FEED.as_bytes().to_vec()
        );
    }

    #[tokio::test]
    async fn test_extract_falls_back_to_cached_feed() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(500);
        });

        let storage = MockStorage::new();
        storage
            .write_file(FEED_CACHE_FILE, FEED.as_bytes())
            .await
            .unwrap();

        let pipeline = pipeline(&server, storage, |_| {});
        let records = pipeline.extract().await.unwrap();

        feed_mock.assert();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_extract_failure_without_cache_is_reported() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(500);
        });

        let pipeline = pipeline(&server, MockStorage::new(), |_| {});
        let err = pipeline.extract().await.unwrap_err();

        feed_mock.assert();
        assert!(matches!(err, EtlError::FeedStatusError { status: 500 }));
    }

    #[tokio::test]
    async fn test_extract_unusable_body_falls_back_to_cached_feed() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html><body>This document is not published.</body></html>");
        });

        let storage = MockStorage::new();
        storage
            .write_file(FEED_CACHE_FILE, FEED.as_bytes())
            .await
            .unwrap();

        let pipeline = pipeline(&server, storage.clone(), |_| {});
        let records = pipeline.extract().await.unwrap();

        feed_mock.assert();
        assert_eq!(records.len(), 3);
        // The unusable body must not replace the cached copy.
        assert_eq!(
            storage.get_file(FEED_CACHE_FILE).await.unwrap(),
            FEED.as_bytes().to_vec()
        );
    }

    #[tokio::test]
    async fn test_extract_empty_body_without_cache_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200).body("");
        });

        let pipeline = pipeline(&server, MockStorage::new(), |_| {});
        assert!(matches!(
            pipeline.extract().await,
            Err(EtlError::EmptyFeed)
        ));
    }

    #[tokio::test]
    async fn test_transform_applies_selection() {
        let server = MockServer::start();
        let pipeline = pipeline(&server, MockStorage::new(), |config| {
            config.selection = FilterSelection::from_parts("2024", "3", "all").unwrap();
        });

        let records = crate::core::parser::parse(FEED).unwrap();
        let report = pipeline.transform(records).await.unwrap();

        assert_eq!(report.feed_records, 3);
        assert_eq!(report.aggregates.count, 2);
        assert_eq!(report.aggregates.total, 1500.0);
        assert_eq!(report.aggregates.top_performer.name, "Alice");
        assert_eq!(report.aggregates.target_attainment[2].percent, 150);
        assert_eq!(report.aggregates.fiscal_year.start_year, 2024);
        assert_eq!(report.aggregates.fiscal_year.total, 3500.0);
        assert_eq!(report.filter_options.salespeople, vec!["Alice", "Bob"]);
        assert_eq!(
            report.aggregates.monthly_top_performers[0].month,
            Month::new(3).unwrap()
        );
    }

    #[tokio::test]
    async fn test_load_writes_zip_bundle() {
        let server = MockServer::start();
        let storage = MockStorage::new();
        let pipeline = pipeline(&server, storage.clone(), |_| {});

        let records = crate::core::parser::parse(FEED).unwrap();
        let report = pipeline.transform(records).await.unwrap();
        let output_path = pipeline.load(&report).await.unwrap();

        assert_eq!(output_path, "test_output/sales_report.zip");
        let zip_bytes = storage.get_file("sales_report.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 6);
    }

    #[tokio::test]
    async fn test_load_without_bundle_writes_loose_files() {
        let server = MockServer::start();
        let storage = MockStorage::new();
        let pipeline = pipeline(&server, storage.clone(), |config| config.bundle = None);

        let report = pipeline.transform(Vec::new()).await.unwrap();
        let output_path = pipeline.load(&report).await.unwrap();

        assert_eq!(output_path, "test_output");
        let summary = storage.get_file("summary.json").await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&summary).unwrap();
        assert_eq!(json["aggregates"]["count"], 0);
        assert_eq!(json["aggregates"]["top_performer"]["name"], "");
        assert!(storage.get_file("sales_team.csv").await.is_some());
    }
}
