use crate::core::{ConfigProvider, FeedColumns, FilterSelection, Month, MonthlyTargets};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUNDLE_NAME: &str = "sales_report.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub columns: FeedColumns,
    pub filter: Option<FilterConfig>,
    /// Month name or number to target amount; unlisted months keep the defaults.
    pub targets: Option<HashMap<String, f64>>,
    pub fiscal: Option<FiscalConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    pub delimiter: Option<String>,
    pub cache_bust: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub year: Option<String>,
    pub month: Option<String>,
    pub salesperson: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalConfig {
    pub start_month: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" (default) or "json".
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// Loads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text after environment substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Replaces the configured filter, keeping values the override leaves unset.
    pub fn override_filter(&mut self, overrides: FilterConfig) {
        let filter = self.filter.get_or_insert_with(FilterConfig::default);
        if overrides.year.is_some() {
            filter.year = overrides.year;
        }
        if overrides.month.is_some() {
            filter.month = overrides.month;
        }
        if overrides.salesperson.is_some() {
            filter.salesperson = overrides.salesperson;
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_format.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn feed_url(&self) -> &str {
        &self.feed.url
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn selection(&self) -> Result<FilterSelection> {
        let filter = self.filter.clone().unwrap_or_default();
        FilterSelection::from_parts(
            filter.year.as_deref().unwrap_or("all"),
            filter.month.as_deref().unwrap_or("all"),
            filter.salesperson.as_deref().unwrap_or("all"),
        )
    }

    fn columns(&self) -> FeedColumns {
        self.columns.clone()
    }

    fn delimiter(&self) -> char {
        self.feed
            .delimiter
            .as_deref()
            .and_then(|d| d.chars().next())
            .unwrap_or(',')
    }

    fn targets(&self) -> Result<MonthlyTargets> {
        match &self.targets {
            Some(overrides) => MonthlyTargets::with_overrides(overrides),
            None => Ok(MonthlyTargets::default()),
        }
    }

    fn cache_bust(&self) -> bool {
        self.feed.cache_bust.unwrap_or(true)
    }

    fn feed_timeout(&self) -> Option<Duration> {
        self.feed.timeout_seconds.map(Duration::from_secs)
    }

    fn fiscal_start_month(&self) -> Month {
        self.fiscal
            .as_ref()
            .and_then(|f| Month::new(f.start_month))
            .unwrap_or(Month::FEBRUARY)
    }

    fn report_title(&self) -> &str {
        &self.report.name
    }

    fn output_formats(&self) -> Vec<String> {
        self.load.output_formats.clone()
    }

    fn bundle_name(&self) -> Option<&str> {
        match &self.load.compression {
            Some(c) if c.enabled => Some(c.filename.as_deref().unwrap_or(DEFAULT_BUNDLE_NAME)),
            Some(_) => None,
            None => Some(DEFAULT_BUNDLE_NAME),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("feed.url", &self.feed.url)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(delimiter) = &self.feed.delimiter {
            validation::validate_delimiter("feed.delimiter", delimiter)?;
        }
        if let Some(timeout) = self.feed.timeout_seconds {
            validation::validate_range("feed.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(fiscal) = &self.fiscal {
            validation::validate_range("fiscal.start_month", fiscal.start_month, 1, 12)?;
        }

        validation::validate_non_empty_string("columns.year", &self.columns.year)?;
        validation::validate_non_empty_string("columns.month", &self.columns.month)?;
        validation::validate_non_empty_string("columns.salesperson", &self.columns.salesperson)?;
        validation::validate_non_empty_string("columns.amount", &self.columns.amount)?;

        self.selection()?;
        self.targets()?;
        Ok(())
    }
}
