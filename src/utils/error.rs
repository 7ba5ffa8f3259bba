use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaszyError {
    #[error("LAS/LAZ decoding failed: {0}")]
    LasError(#[from] las::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("File is not a LAS/LAZ file: {path}")]
    NotLidarFile { path: String },

    #[error("Failed to decompress {path}: {message}")]
    Decompression { path: String, message: String },

    #[error("Corrupt header: {message}")]
    CorruptHeader { message: String },

    #[error("Point records have not been read")]
    PointsNotLoaded,

    #[error("Missing field '{field}' in {context}")]
    MissingField { field: String, context: String },

    #[error("Degenerate extent: {message}")]
    DegenerateExtent { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Decoding,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LaszyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LaszyError::NotLidarFile { .. } | LaszyError::MissingField { .. } => {
                ErrorCategory::Input
            }
            LaszyError::LasError(_)
            | LaszyError::Decompression { .. }
            | LaszyError::CorruptHeader { .. }
            | LaszyError::PointsNotLoaded => ErrorCategory::Decoding,
            LaszyError::ConfigError { .. }
            | LaszyError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LaszyError::CsvError(_)
            | LaszyError::SerializationError(_)
            | LaszyError::DegenerateExtent { .. }
            | LaszyError::ProcessingError { .. } => ErrorCategory::Processing,
            LaszyError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LaszyError::DegenerateExtent { .. } => ErrorSeverity::Low,
            LaszyError::Decompression { .. }
            | LaszyError::CorruptHeader { .. }
            | LaszyError::LasError(_) => ErrorSeverity::Medium,
            LaszyError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LaszyError::NotLidarFile { path } => {
                format!("'{}' does not look like a LAS/LAZ file", path)
            }
            LaszyError::Decompression { path, .. } => {
                format!("'{}' could not be decompressed and may be corrupt", path)
            }
            LaszyError::IoError(e) => format!("File system error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the inputs are .las/.laz files or laszy summary .json files",
            ErrorCategory::Decoding => "Re-download or re-export the file and try again",
            ErrorCategory::Configuration => "Fix the configuration file or command line arguments",
            ErrorCategory::Processing => "Inspect the report and summary files for malformed values",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, LaszyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let err = LaszyError::Decompression {
            path: "a.laz".to_string(),
            message: "bad chunk".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Decoding);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let io = LaszyError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_friendly_message_mentions_path() {
        let err = LaszyError::NotLidarFile {
            path: "notes.txt".to_string(),
        };
        assert!(err.user_friendly_message().contains("notes.txt"));
    }
}
