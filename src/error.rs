/*!
 * Error handling for doctor directory operations
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Doctor directory result type
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The provider endpoint could not be reached or answered with a non-success status
    #[error("Network failure: {message}")]
    NetworkFailure {
        message: String,
        url: Option<String>,
        status: Option<u16>,
    },

    /// A raw provider record whose fee or experience could not be parsed
    #[error("Malformed record {record_id}: field '{field}' {reason} (value: {value:?})")]
    MalformedRecord {
        record_id: String,
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// JSON parsing errors with location information
    #[error("JSON parsing error at line {line}, column {column}: {message}")]
    JsonParse {
        message: String,
        line: usize,
        column: usize,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// A filter value supplied from outside the UI surface that is not recognized
    #[error("Invalid value '{value}' for {key}")]
    InvalidCriteria {
        key: String,
        value: String,
        valid_options: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Render/output errors
    #[error("Render error: {message}")]
    Render {
        message: String,
        format: OutputFormat,
    },

    /// Feature not enabled error
    #[error("Feature '{feature}' is not enabled")]
    FeatureNotEnabled {
        feature: String,
        enable_instruction: String,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
}

/// Output format of a rendered view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl DirectoryError {
    /// Create a malformed record error for a field of a raw record
    pub fn malformed_record(record_id: &str, field: &str, value: &str, reason: &str) -> Self {
        Self::MalformedRecord {
            record_id: record_id.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a network failure error
    pub fn network(message: impl Into<String>, url: Option<&str>, status: Option<u16>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
            url: url.map(str::to_string),
            status,
        }
    }

    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            format!(
                "Check if the file exists at '{}'. It should contain a JSON array of provider objects \
                as served by the provider endpoint.",
                path.display()
            )
        } else {
            format!(
                "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create an invalid criteria error listing the accepted values
    pub fn invalid_criteria(key: &str, value: &str, valid_options: &[&str]) -> Self {
        Self::InvalidCriteria {
            key: key.to_string(),
            value: value.to_string(),
            valid_options: valid_options.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a feature not enabled error
    pub fn feature_required(feature: &str) -> Self {
        let enable_instruction = match feature {
            "fetch" => "Rebuild with '--features fetch' or load a local file with '--file'",
            _ => "Enable the required feature in your Cargo.toml",
        };

        Self::FeatureNotEnabled {
            feature: feature.to_string(),
            enable_instruction: enable_instruction.to_string(),
        }
    }

    /// Whether this error is a per-record normalization failure
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::NetworkFailure { status: Some(status), .. } => {
                format!("{}\n\nThe endpoint answered with HTTP {}. Check the configured endpoint.", self, status)
            }
            Self::NetworkFailure { .. } => {
                format!("{}\n\nSuggestion: Check your internet connection or load a local file with '--file'", self)
            }
            Self::InvalidCriteria { valid_options, .. } => {
                format!("{}\n\nValid options: {}", self, valid_options.join(", "))
            }
            Self::FeatureNotEnabled { enable_instruction, .. } => {
                format!("{}\n\nTo enable: {}", self, enable_instruction)
            }
            Self::Configuration { suggestion: Some(sug), .. }
            | Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Self::Custom {
                message: err.to_string(),
                suggestion: None,
            };
        }
        Self::JsonParse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for DirectoryError {
    fn from(err: csv::Error) -> Self {
        Self::Render {
            message: err.to_string(),
            format: OutputFormat::Csv,
        }
    }
}

impl From<::config::ConfigError> for DirectoryError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
            suggestion: Some("Check the config file and DOCDIR_* environment variables".to_string()),
        }
    }
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkFailure {
            url: err.url().map(|u| u.to_string()),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = DirectoryError::malformed_record("7", "fees", "Free", "contains no digits");
        assert!(err.is_malformed_record());
        assert_eq!(
            err.to_string(),
            "Malformed record 7: field 'fees' contains no digits (value: \"Free\")"
        );
    }

    #[test]
    fn test_user_message_lists_options() {
        let err = DirectoryError::invalid_criteria("sort", "price", &["fees", "experience"]);
        assert!(err.user_message().ends_with("Valid options: fees, experience"));
    }

    #[test]
    fn test_json_error_conversion() {
        let err: DirectoryError = serde_json::from_str::<Vec<u8>>("[1,").unwrap_err().into();
        assert!(matches!(err, DirectoryError::JsonParse { line: 1, .. }));
    }
}
