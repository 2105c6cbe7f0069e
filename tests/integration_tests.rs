use httpmock::prelude::*;
use sales_etl::config::TomlConfig;
use sales_etl::core::pipeline::FEED_CACHE_FILE;
use sales_etl::{CliConfig, EtlEngine, EtlError, LocalStorage, SalesPipeline};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const FEED: &str = "Sales year,Month,Sales person name,Sales amount\n\
                    2024,1,Alice,1000\n\
                    2024,1,Bob,400\n\
                    2024,2,Alice,250.5\n\
                    2023,12,Bob,800\n";

fn cli_config(feed_url: String, output_path: &str) -> CliConfig {
    CliConfig {
        feed_url,
        output_path: output_path.to_string(),
        year: "all".to_string(),
        month: "all".to_string(),
        salesperson: "all".to_string(),
        fiscal_start_month: 2,
        no_cache_bust: false,
        verbose: false,
        monitor: false,
    }
}

fn read_zip_entry(zip_path: &Path, name: &str) -> String {
    let zip_data = std::fs::read(zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    contents
}

async fn run_cli(config: CliConfig) -> sales_etl::Result<sales_etl::core::etl::EtlOutcome> {
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = SalesPipeline::with_http_feed(storage, config)?;
    EtlEngine::new(pipeline).run().await
}

#[tokio::test]
async fn test_end_to_end_report_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let feed_mock = server.mock(|when, then| {
        when.method(GET).path("/pub").query_param_exists("t");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body(FEED);
    });

    let outcome = run_cli(cli_config(server.url("/pub"), &output_path))
        .await
        .unwrap();
    feed_mock.assert();

    assert!(outcome.output_path.ends_with("sales_report.zip"));
    let report = &outcome.report;
    assert_eq!(report.feed_records, 4);
    assert_eq!(report.aggregates.count, 4);
    assert_eq!(report.aggregates.total, 2450.5);
    assert_eq!(report.aggregates.top_performer.name, "Alice");
    assert_eq!(report.filter_options.years, vec!["2023", "2024"]);
    assert_eq!(report.filter_options.salespeople, vec!["Alice", "Bob"]);

    let zip_path = temp_dir.path().join("sales_report.zip");
    assert!(zip_path.exists());

    let summary: serde_json::Value =
        serde_json::from_str(&read_zip_entry(&zip_path, "summary.json")).unwrap();
    assert_eq!(summary["title"], "Sales dashboard");
    assert_eq!(summary["selection"]["year"], "all");
    assert_eq!(summary["aggregates"]["count"], 4);
    assert_eq!(summary["aggregates"]["top_performer"]["name"], "Alice");

    let team = read_zip_entry(&zip_path, "sales_team.csv");
    assert!(team.starts_with("salesperson,total,average,transactions"));
    assert!(team.contains("Alice,1250.5"));
    assert!(team.contains("Bob,1200"));

    // A successful fetch leaves a cached copy of the feed behind.
    let cached = std::fs::read_to_string(temp_dir.path().join(FEED_CACHE_FILE)).unwrap();
    assert_eq!(cached, FEED);
}

#[tokio::test]
async fn test_selection_narrows_every_figure() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(FEED);
    });

    let mut config = cli_config(server.url("/pub"), &output_path);
    config.year = "2024".to_string();
    config.month = "January".to_string();

    let outcome = run_cli(config).await.unwrap();
    let agg = &outcome.report.aggregates;

    assert_eq!(agg.count, 2);
    assert_eq!(agg.total, 1400.0);
    assert_eq!(agg.average, 700.0);
    assert_eq!(agg.top_performer.name, "Alice");
    assert_eq!(agg.top_performer.amount, 1000.0);
    assert_eq!(agg.monthly_totals[0], 1400.0);
    assert_eq!(agg.monthly_totals[1], 0.0);
    // Filter options always come from the whole feed.
    assert_eq!(outcome.report.filter_options.years, vec!["2023", "2024"]);
}

#[tokio::test]
async fn test_malformed_row_is_skipped_and_bad_amount_counts_as_zero() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let feed = "Sales year,Month,Sales person name,Sales amount\n\
                2024,3,Alice,1000\n\
                2024,3,Carol\n\
                2024,3,Dave,abc\n";

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(feed);
    });

    let outcome = run_cli(cli_config(server.url("/pub"), &output_path))
        .await
        .unwrap();
    let agg = &outcome.report.aggregates;

    assert_eq!(outcome.report.feed_records, 2);
    assert_eq!(agg.count, 2);
    assert_eq!(agg.total, 1000.0);
    assert_eq!(agg.average, 500.0);
    assert!(agg.person_stats.iter().all(|p| p.name != "Carol"));
    let dave = agg.person_stats.iter().find(|p| p.name == "Dave").unwrap();
    assert_eq!(dave.total, 0.0);
    assert_eq!(dave.count, 1);
}

#[tokio::test]
async fn test_empty_selection_yields_zero_figures() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(FEED);
    });

    let mut config = cli_config(server.url("/pub"), &output_path);
    config.salesperson = "Zed".to_string();

    let outcome = run_cli(config).await.unwrap();
    let agg = &outcome.report.aggregates;

    assert_eq!(agg.count, 0);
    assert_eq!(agg.total, 0.0);
    assert_eq!(agg.average, 0.0);
    assert!(agg.top_performer.is_empty());
    assert!(agg.person_stats.is_empty());
    assert!(agg.monthly_top_performers.is_empty());
    assert!(agg.target_attainment.iter().all(|row| row.total == 0.0));
}

#[tokio::test]
async fn test_failed_fetch_falls_back_to_cached_feed() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(temp_dir.path().join(FEED_CACHE_FILE), FEED).unwrap();

    let server = MockServer::start();
    let feed_mock = server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(503);
    });

    let outcome = run_cli(cli_config(server.url("/pub"), &output_path))
        .await
        .unwrap();
    feed_mock.assert();

    assert_eq!(outcome.report.feed_records, 4);
    assert_eq!(outcome.report.aggregates.total, 2450.5);
}

#[tokio::test]
async fn test_unpublished_sheet_falls_back_to_cached_feed() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(temp_dir.path().join(FEED_CACHE_FILE), FEED).unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200)
            .header("Content-Type", "text/html")
            .body("<!DOCTYPE html><html><body>Sorry, this sheet is no longer published</body></html>");
    });

    let outcome = run_cli(cli_config(server.url("/pub"), &output_path))
        .await
        .unwrap();

    assert_eq!(outcome.report.feed_records, 4);
    let cached = std::fs::read_to_string(temp_dir.path().join(FEED_CACHE_FILE)).unwrap();
    assert_eq!(cached, FEED);
}

#[tokio::test]
async fn test_failed_fetch_without_cache_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(404);
    });

    let result = run_cli(cli_config(server.url("/pub"), &output_path)).await;

    match result {
        Err(EtlError::FeedStatusError { status }) => assert_eq!(status, 404),
        other => panic!("expected FeedStatusError, got {:?}", other.map(|o| o.output_path)),
    }
    assert!(!temp_dir.path().join("sales_report.zip").exists());
}

#[tokio::test]
async fn test_missing_column_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200)
            .body("Sales year,Month,Sales amount\n2024,1,100\n");
    });

    let result = run_cli(cli_config(server.url("/pub"), &output_path)).await;
    assert!(matches!(result, Err(EtlError::MissingColumn { .. })));
}

#[tokio::test]
async fn test_toml_config_writes_loose_files() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("report");
    let feed = "Year;Month;Rep;Amount\n\
                2024;4;Alice;30000\n\
                2024;5;Bob;10000\n";

    let server = MockServer::start();
    let feed_mock = server.mock(|when, then| {
        when.method(GET).path("/export");
        then.status(200).body(feed);
    });

    let toml_content = format!(
        r#"
[report]
name = "Regional sales"

[feed]
url = "{url}"
delimiter = ";"
cache_bust = false

[columns]
year = "Year"
month = "Month"
salesperson = "Rep"
amount = "Amount"

[filter]
year = "2024"

[targets]
april = 40000

[fiscal]
start_month = 4

[load]
output_path = "{output}"
output_formats = ["json", "csv"]

[load.compression]
enabled = false
"#,
        url = server.url("/export"),
        output = output_path.display(),
    );
    let config_path = temp_dir.path().join("sales-report.toml");
    std::fs::write(&config_path, toml_content).unwrap();

    let config = TomlConfig::from_file(&config_path).unwrap();
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = SalesPipeline::with_http_feed(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();
    feed_mock.assert();

    assert_eq!(outcome.report.title, "Regional sales");
    let agg = &outcome.report.aggregates;
    assert_eq!(agg.total, 40000.0);
    assert_eq!(agg.fiscal_year.start_year, 2024);
    assert_eq!(agg.fiscal_year.total, 40000.0);

    let april = agg
        .target_attainment
        .iter()
        .find(|row| row.month.number() == 4)
        .unwrap();
    assert_eq!(april.target, 40000.0);
    assert_eq!(april.percent, 75);

    for name in [
        "summary.json",
        "sales_team.csv",
        "monthly_target.csv",
        "top_performers.csv",
        "monthly_sales_by_salesperson.csv",
        "yearly_sales_by_salesperson.csv",
    ] {
        assert!(output_path.join(name).exists(), "missing {}", name);
    }
    assert!(!output_path.join("sales_report.zip").exists());
}
