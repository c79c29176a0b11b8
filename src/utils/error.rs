use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("PDF processing error: {message}")]
    PdfError { message: String },

    #[error("Spreadsheet processing error: {message}")]
    SpreadsheetError { message: String },

    #[error("No PDF converter available (pdftocairo/pdftoppm/convert)")]
    ConverterUnavailable,

    #[error("{converter} failed: {stderr}")]
    RenderFailed { converter: String, stderr: String },

    #[error("No images were rendered from the PDF")]
    NoImagesRendered,

    #[error("OCR unavailable: {reason}")]
    OcrUnavailable { reason: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Document,
    ExternalTool,
    Configuration,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::InputNotFound { .. }
            | ScanError::UnsupportedFormat { .. } => ErrorCategory::Input,
            ScanError::PdfError { .. }
            | ScanError::SpreadsheetError { .. } => ErrorCategory::Document,
            ScanError::ConverterUnavailable
            | ScanError::RenderFailed { .. }
            | ScanError::NoImagesRendered
            | ScanError::OcrUnavailable { .. } => ErrorCategory::ExternalTool,
            ScanError::ConfigValidationError { .. } | ScanError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ScanError::HttpError(_) => ErrorCategory::Network,
            ScanError::IoError(_)
            | ScanError::SerializationError(_)
            | ScanError::ProcessingError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::ExternalTool => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Document | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScanError::InputNotFound { .. } => "Check the input path and try again",
            ScanError::UnsupportedFormat { .. } => "Send a PDF or XLS/XLSX file",
            ScanError::SpreadsheetError { .. } => "Check that the workbook opens in a spreadsheet program",
            ScanError::PdfError { .. } => "Check that the PDF opens in a viewer; try --force-ocr",
            ScanError::ConverterUnavailable => "Install poppler-utils (pdftocairo/pdftoppm) or ImageMagick",
            ScanError::RenderFailed { .. } | ScanError::NoImagesRendered => {
                "Check converter permissions/policies (ImageMagick PDF policy) and the PDF itself"
            }
            ScanError::OcrUnavailable { .. } => "Install tesseract-ocr and the language data you need",
            ScanError::ConfigValidationError { .. } | ScanError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
            ScanError::HttpError(_) => "Check that the server is running and reachable",
            ScanError::IoError(_) => "Check file permissions and free disk space",
            ScanError::SerializationError(_) | ScanError::ProcessingError { .. } => {
                "Run again with --verbose and inspect the logs"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Document => format!("Could not read the document: {}", self),
            ErrorCategory::ExternalTool => format!("OCR tooling problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::System => format!("Unexpected failure: {}", self),
        }
    }

    /// Exit code used by the page-OCR tool.
    pub fn ocr_exit_code(&self) -> i32 {
        match self {
            ScanError::InputNotFound { .. } => 2,
            ScanError::ConverterUnavailable => 3,
            ScanError::RenderFailed { .. } => 4,
            ScanError::NoImagesRendered => 5,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
