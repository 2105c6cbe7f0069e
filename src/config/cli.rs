use crate::config::DEFAULT_FEED_URL;
use crate::core::{ConfigProvider, FilterSelection, Month};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sales-etl")]
#[command(about = "Download the sales sheet and build the dashboard figures")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "all", help = "Sales year label, or 'all'")]
    pub year: String,

    #[arg(long, default_value = "all", help = "Month number or name, or 'all'")]
    pub month: String,

    #[arg(long, default_value = "all", help = "Salesperson name, or 'all'")]
    pub salesperson: String,

    #[arg(long, default_value = "2", help = "First month of the fiscal year")]
    pub fiscal_start_month: u8,

    #[arg(long, help = "Do not append the cache-busting query parameter")]
    pub no_cache_bust: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-phase timing and memory")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn feed_url(&self) -> &str {
        &self.feed_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn selection(&self) -> Result<FilterSelection> {
        FilterSelection::from_parts(&self.year, &self.month, &self.salesperson)
    }

    fn cache_bust(&self) -> bool {
        !self.no_cache_bust
    }

    fn fiscal_start_month(&self) -> Month {
        Month::new(self.fiscal_start_month).unwrap_or(Month::FEBRUARY)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("feed_url", &self.feed_url)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_range("fiscal_start_month", self.fiscal_start_month, 1, 12)?;
        self.selection()?;
        Ok(())
    }
}
