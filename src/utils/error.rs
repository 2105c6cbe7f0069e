use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Feed request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Feed returned HTTP status {status}")]
    FeedStatusError { status: u16 },

    #[error("Feed is empty or has no header row")]
    EmptyFeed,

    #[error("Feed header is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::FeedStatusError { .. } => ErrorCategory::Network,
            EtlError::EmptyFeed
            | EtlError::MissingColumn { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    /// Network failures are worth retrying; everything else needs a fix first.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check the network connection and that the feed URL is reachable".to_string()
            }
            EtlError::FeedStatusError { status } if *status == 404 => {
                "Check that the spreadsheet is still published to the web".to_string()
            }
            EtlError::FeedStatusError { .. } => "Retry later; the feed host reported an error".to_string(),
            EtlError::EmptyFeed => {
                "Make sure the feed URL points at the CSV export, not the sheet page".to_string()
            }
            EtlError::MissingColumn { column } => format!(
                "Rename the sheet column to '{}' or map it in the [columns] config table",
                column
            ),
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the configuration values and try again".to_string()
            }
            EtlError::IoError(_) | EtlError::ZipError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            _ => "Re-run with --verbose for more details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download the sales feed: {}", self),
            ErrorCategory::Data => format!("The sales feed could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("Could not write the report: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_errors_are_network_and_retryable() {
        let err = EtlError::FeedStatusError { status: 503 };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_parse_errors_are_data_errors() {
        let err = EtlError::MissingColumn {
            column: "Sales amount".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.recovery_suggestion().contains("Sales amount"));
        assert!(err.user_friendly_message().contains("could not be processed"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = EtlError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_severity_ranks_by_category() {
        let config = EtlError::MissingConfigError {
            field: "feed.url".to_string(),
        };
        let data = EtlError::EmptyFeed;
        let network = EtlError::FeedStatusError { status: 500 };
        let system = EtlError::from(std::io::Error::new(std::io::ErrorKind::Other, "denied"));

        assert_eq!(config.severity(), ErrorSeverity::High);
        assert_eq!(data.severity(), ErrorSeverity::High);
        assert!(network.severity() < data.severity());
        assert!(data.severity() < system.severity());
    }
}
