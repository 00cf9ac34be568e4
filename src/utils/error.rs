use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmpulseError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("PDF generation error: {0}")]
    PdfError(#[from] printpdf::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Font error: {message}")]
    FontError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Config,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EmpulseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EmpulseError::ApiError(_) => ErrorCategory::Network,
            EmpulseError::CsvError(_)
            | EmpulseError::SerializationError(_)
            | EmpulseError::ValidationError { .. }
            | EmpulseError::ProtocolError { .. }
            | EmpulseError::ProcessingError { .. } => ErrorCategory::Data,
            EmpulseError::ConfigError { .. }
            | EmpulseError::InvalidConfigValueError { .. }
            | EmpulseError::MissingConfigError { .. } => ErrorCategory::Config,
            EmpulseError::IoError(_)
            | EmpulseError::FontError { .. }
            | EmpulseError::ImageError(_)
            | EmpulseError::PdfError(_) => ErrorCategory::Resource,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 整批呼叫失敗會以佔位結果繼續，不視為致命
            EmpulseError::ApiError(_) | EmpulseError::ProtocolError { .. } => ErrorSeverity::Medium,
            EmpulseError::CsvError(_)
            | EmpulseError::ValidationError { .. }
            | EmpulseError::ProcessingError { .. }
            | EmpulseError::SerializationError(_)
            | EmpulseError::ConfigError { .. }
            | EmpulseError::InvalidConfigValueError { .. }
            | EmpulseError::MissingConfigError { .. }
            | EmpulseError::FontError { .. } => ErrorSeverity::High,
            EmpulseError::IoError(_) | EmpulseError::ImageError(_) | EmpulseError::PdfError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EmpulseError::ApiError(_) => {
                "Check network connectivity, GEMINI_API_KEY and remaining quota".to_string()
            }
            EmpulseError::CsvError(_) => {
                "Confirm the CSV file is well-formed and UTF-8 encoded".to_string()
            }
            EmpulseError::ValidationError { .. } => {
                "Make sure the CSV contains 員工ID, 員工滿意度評分 and 近期反饋內容 columns"
                    .to_string()
            }
            EmpulseError::ProtocolError { .. } => {
                "The model reply did not follow the requested format; rerun the batch".to_string()
            }
            EmpulseError::FontError { .. } => {
                "Install a CJK font or pass an explicit font path with --font".to_string()
            }
            EmpulseError::ConfigError { .. }
            | EmpulseError::InvalidConfigValueError { .. }
            | EmpulseError::MissingConfigError { .. } => {
                "Review the command line arguments and environment variables".to_string()
            }
            EmpulseError::IoError(_) => {
                "Check file permissions and available disk space".to_string()
            }
            _ => "Rerun with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EmpulseError::ApiError(_) => "API 呼叫失敗".to_string(),
            EmpulseError::ValidationError { message } => format!("數據驗證錯誤: {}", message),
            EmpulseError::CsvError(_) => "CSV 檔案格式錯誤，請確認檔案格式正確".to_string(),
            EmpulseError::FontError { message } => format!("無法找到中文字型: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmpulseError>;
