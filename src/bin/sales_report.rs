use clap::Parser;
use sales_etl::config::toml_config::{FilterConfig, TomlConfig};
use sales_etl::core::ConfigProvider;
use sales_etl::utils::error::ErrorSeverity;
use sales_etl::utils::{format, logger, validation::Validate};
use sales_etl::{EtlEngine, LocalStorage, SalesPipeline};

#[derive(Parser)]
#[command(name = "sales-report")]
#[command(about = "Sales dashboard report driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sales-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the configured sales year ("all" clears it)
    #[arg(long)]
    year: Option<String>,

    /// Override the configured month, number or name
    #[arg(long)]
    month: Option<String>,

    /// Override the configured salesperson
    #[arg(long)]
    salesperson: Option<String>,

    /// Show what would be fetched and written without running
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(config.log_format(), args.verbose);
    tracing::info!("Loaded configuration from: {}", args.config);

    config.override_filter(FilterConfig {
        year: args.year.clone(),
        month: args.month.clone(),
        salesperson: args.salesperson.clone(),
    });

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    display_config_summary(&config)?;

    if args.dry_run {
        println!("🔍 Dry run: nothing fetched or written.");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = SalesPipeline::with_http_feed(storage, config)?;
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            print!("{}", format::render_summary(&outcome.report));
            println!();
            println!("📁 Report saved to: {}", outcome.output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "Sales report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

fn display_config_summary(config: &TomlConfig) -> anyhow::Result<()> {
    let selection = config.selection()?;

    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    if let Some(description) = &config.report.description {
        println!("  Description: {}", description);
    }
    println!("  Feed: {}", config.feed_url());
    println!("  Cache busting: {}", config.cache_bust());
    println!(
        "  Filter: year={} month={} salesperson={}",
        selection.year, selection.month, selection.salesperson
    );
    println!("  Fiscal year starts: {}", config.fiscal_start_month().name());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    match config.bundle_name() {
        Some(name) => println!("  Bundle: {} (ZIP)", name),
        None => println!("  Bundle: none, loose files"),
    }
    println!();

    Ok(())
}
