use crate::domain::model::DocumentFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to parse document '{document}': {message}")]
    DocumentParseError { document: String, message: String },

    #[error(
        "No valid data extracted from {documents} document(s) ({} failed to parse)",
        .failures.len()
    )]
    NoValidData {
        documents: usize,
        failures: Vec<DocumentFailure>,
    },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn parse(document: impl Into<String>, message: impl std::fmt::Display) -> Self {
        EtlError::DocumentParseError {
            document: document.into(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::DocumentParseError { .. } => ErrorCategory::Input,
            EtlError::NoValidData { .. } => ErrorCategory::Data,
            EtlError::ZipError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Output
            }
            EtlError::IoError(_) => ErrorCategory::Input,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一文件失敗不影響整批處理
            EtlError::DocumentParseError { .. } => ErrorSeverity::Low,
            EtlError::NoValidData { .. } => ErrorSeverity::Medium,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::High,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::DocumentParseError { .. } => {
                "Check that the file is a well-formed NF-e XML document"
            }
            EtlError::NoValidData { .. } => {
                "Provide at least one valid NF-e XML file or a directory containing them"
            }
            EtlError::ZipError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Try the csv output format or a different output path"
            }
            EtlError::IoError(_) => "Check that the paths exist and are readable/writable",
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => {
                "Review the command-line arguments or the TOML configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::DocumentParseError { document, .. } => {
                format!("Erro no XML {}", document)
            }
            EtlError::NoValidData { .. } => "Nenhum dado válido foi extraído dos XMLs".to_string(),
            EtlError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_low_severity_input() {
        let err = EtlError::parse("nota.xml", "unexpected end of file");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.to_string().contains("nota.xml"));
        assert!(err.user_friendly_message().contains("nota.xml"));
    }

    #[test]
    fn test_no_valid_data_message() {
        let failures = (1..=3)
            .map(|i| DocumentFailure {
                document: format!("{}.xml", i),
                reason: "syntax".to_string(),
            })
            .collect();
        let err = EtlError::NoValidData {
            documents: 3,
            failures,
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("3 failed"));
    }
}
