use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuanterraError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    ApiStatusError { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    StorageError(#[from] object_store::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid schedule expression '{expression}': {reason}")]
    ScheduleError { expression: String, reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    DataFormat,
    Storage,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl QuanterraError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QuanterraError::ApiError(_) | QuanterraError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            QuanterraError::CsvError(_) | QuanterraError::SerializationError(_) => {
                ErrorCategory::DataFormat
            }
            QuanterraError::IoError(_) | QuanterraError::StorageError(_) => ErrorCategory::Storage,
            QuanterraError::ConfigError { .. }
            | QuanterraError::ConfigValidationError { .. }
            | QuanterraError::InvalidConfigValueError { .. }
            | QuanterraError::MissingConfigError { .. }
            | QuanterraError::ScheduleError { .. } => ErrorCategory::Configuration,
            QuanterraError::ProcessingError { .. } | QuanterraError::ValidationError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            QuanterraError::ApiError(_) | QuanterraError::ApiStatusError { .. } => {
                ErrorSeverity::Medium
            }
            QuanterraError::CsvError(_)
            | QuanterraError::SerializationError(_)
            | QuanterraError::ProcessingError { .. }
            | QuanterraError::ValidationError { .. } => ErrorSeverity::High,
            QuanterraError::IoError(_) | QuanterraError::StorageError(_) => ErrorSeverity::High,
            QuanterraError::ConfigError { .. }
            | QuanterraError::ConfigValidationError { .. }
            | QuanterraError::InvalidConfigValueError { .. }
            | QuanterraError::MissingConfigError { .. }
            | QuanterraError::ScheduleError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            QuanterraError::ApiError(_) => {
                "Check network connectivity and API endpoint availability, then retry".to_string()
            }
            QuanterraError::ApiStatusError { status, .. } => match status {
                401 | 403 => "Verify the API token has access to this endpoint".to_string(),
                429 => "Rate limit hit, wait before retrying or reduce concurrency".to_string(),
                _ => "Check the API documentation for this status code".to_string(),
            },
            QuanterraError::CsvError(_) => {
                "Check the CSV file is well-formed and uses the expected delimiter".to_string()
            }
            QuanterraError::IoError(_) => {
                "Check file paths exist and the process has read/write permissions".to_string()
            }
            QuanterraError::SerializationError(_) => {
                "Check the payload matches the expected JSON structure".to_string()
            }
            QuanterraError::StorageError(_) => {
                "Check bucket name, credentials and network access to the object store".to_string()
            }
            QuanterraError::ConfigError { .. } => {
                "Review the configuration file syntax and values".to_string()
            }
            QuanterraError::ConfigValidationError { field, .. }
            | QuanterraError::InvalidConfigValueError { field, .. } => {
                format!("Correct the '{}' setting in the configuration file", field)
            }
            QuanterraError::MissingConfigError { field } => {
                format!(
                    "Set '{}' in the configuration file or the matching environment variable",
                    field
                )
            }
            QuanterraError::ScheduleError { .. } => {
                "Use a 5 or 6 field cron expression, e.g. '0 6 * * 1-5'".to_string()
            }
            QuanterraError::ProcessingError { .. } => {
                "Inspect the upstream data for unexpected shapes and re-run the flow".to_string()
            }
            QuanterraError::ValidationError { .. } => {
                "Check the input file matches the expected export format".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuanterraError::ApiError(_) | QuanterraError::ApiStatusError { .. } => {
                format!("A market data API call failed: {}", self)
            }
            QuanterraError::CsvError(_) => format!("A CSV file could not be read: {}", self),
            QuanterraError::IoError(_) => format!("A file operation failed: {}", self),
            QuanterraError::SerializationError(_) => {
                format!("Data could not be encoded or decoded: {}", self)
            }
            QuanterraError::StorageError(_) => {
                format!("Writing to the data lake failed: {}", self)
            }
            QuanterraError::ConfigError { .. }
            | QuanterraError::ConfigValidationError { .. }
            | QuanterraError::InvalidConfigValueError { .. }
            | QuanterraError::MissingConfigError { .. }
            | QuanterraError::ScheduleError { .. } => {
                format!("The configuration is invalid: {}", self)
            }
            QuanterraError::ProcessingError { .. } | QuanterraError::ValidationError { .. } => {
                format!("Ingestion could not complete: {}", self)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, QuanterraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_exit_codes() {
        assert_eq!(ErrorSeverity::Low.exit_code(), 0);
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
        assert_eq!(ErrorSeverity::High.exit_code(), 1);
        assert_eq!(ErrorSeverity::Critical.exit_code(), 3);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = QuanterraError::MissingConfigError {
            field: "eodhd.api_token".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("eodhd.api_token"));
    }

    #[test]
    fn test_api_status_error_message() {
        let err = QuanterraError::ApiStatusError {
            status: 429,
            url: "https://eodhd.com/api/exchanges-list".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("Rate limit"));
    }
}
