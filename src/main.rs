use clap::Parser;
use sales_etl::utils::error::{EtlError, ErrorSeverity};
use sales_etl::utils::{format, logger, validation::Validate};
use sales_etl::{CliConfig, EtlEngine, LocalStorage, SalesPipeline};

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "Sales ETL failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2, // retryable
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting sales-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match SalesPipeline::with_http_feed(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(&e),
    };

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            print!("{}", format::render_summary(&outcome.report));
            println!();
            println!("📁 Report saved to: {}", outcome.output_path);
        }
        Err(e) => fail(&e),
    }
}
