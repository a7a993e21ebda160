use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("[{stage}] line {line}: field '{field}' is not a number: '{value}'")]
    MalformedFieldError {
        stage: String,
        line: usize,
        field: String,
        value: String,
    },

    #[error("[{stage}] point totals overflowed for key '{key}'")]
    OverflowError { stage: String, key: String },

    #[error("Input '{path}' is not valid UTF-8")]
    EncodingError { path: String },

    #[error("[{stage}] stage failed: {details}")]
    StageError { stage: String, details: String },

    #[error("Pipeline '{pipeline}' depends on '{missing}', which has not completed")]
    DependencyError { pipeline: String, missing: String },

    #[error("Output '{path}' already holds a completed run")]
    OutputExistsError { path: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Data,
    Io,
    Execution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code the CLI reports for a failure of this severity; never 0.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Config,
            EtlError::MalformedFieldError { .. }
            | EtlError::OverflowError { .. }
            | EtlError::EncodingError { .. }
            | EtlError::CsvError(_) => ErrorCategory::Data,
            EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::OutputExistsError { .. } => ErrorCategory::Io,
            EtlError::StageError { .. } | EtlError::DependencyError { .. } => {
                ErrorCategory::Execution
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::OutputExistsError { .. } => ErrorSeverity::Medium,
            EtlError::StageError { .. } | EtlError::DependencyError { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MalformedFieldError { line, .. } => format!(
                "Fix or remove line {} of the input; numeric columns must hold decimal numbers",
                line
            ),
            EtlError::OverflowError { key, .. } => format!(
                "Point totals for '{}' exceed the supported range; check the input for corrupted values",
                key
            ),
            EtlError::EncodingError { path } => {
                format!("Re-export '{}' as UTF-8 text", path)
            }
            EtlError::OutputExistsError { path } => format!(
                "Remove '{}' or rerun with --overwrite",
                path
            ),
            EtlError::MissingConfigError { field } => {
                format!("Provide '{}' on the command line or in the config file", field)
            }
            EtlError::InvalidConfigValueError { field, .. }
            | EtlError::ConfigValidationError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            EtlError::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            EtlError::IoError(_) => {
                "Check that the input exists and the output directories are writable".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Check free disk space and rerun".to_string()
            }
            EtlError::StageError { .. } | EtlError::DependencyError { .. } => {
                "This is an internal scheduling failure; rerun the job".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Input data problem, run aborted: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Execution => format!("Pipeline execution failed: {}", self),
        }
    }
}
