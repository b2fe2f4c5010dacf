use std::fmt;
use thiserror::Error;

/// Reason a key/value store rejected a read or write.
///
/// Mirrors the error codes DynamoDB reports; other backends map onto the
/// closest variant or fall back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceFailure {
    ThroughputExceeded,
    RequestLimitExceeded,
    NotFound,
    Conflict,
    Internal,
    SizeLimitExceeded,
    /// The stored blob exists but does not decode as a group.
    Corrupt,
    Other,
}

impl fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PersistenceFailure::ThroughputExceeded => "throughput exceeded",
            PersistenceFailure::RequestLimitExceeded => "request limit exceeded",
            PersistenceFailure::NotFound => "resource not found",
            PersistenceFailure::Conflict => "conflict",
            PersistenceFailure::Internal => "internal error",
            PersistenceFailure::SizeLimitExceeded => "size limit exceeded",
            PersistenceFailure::Corrupt => "corrupt stored data",
            PersistenceFailure::Other => "unclassified",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Failed to parse {context}: {source}")]
    ParseError {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Persistence error for '{id}' ({reason}): {message}")]
    PersistenceError {
        id: String,
        reason: PersistenceFailure,
        message: String,
    },

    #[error("Invalid attributes on {resource}: {message}")]
    ShapeError { resource: String, message: String },

    #[error("No price found for {resource} ({lookup})")]
    PriceNotFound { resource: String, lookup: String },

    #[error("one or more items was unable to be written ({failed} of {attempted} failed)")]
    PartialFailure { failed: usize, attempted: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Storage,
    Pricing,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EstimatorError {
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        EstimatorError::ParseError {
            context: context.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EstimatorError::ParseError { .. } | EstimatorError::SerializationError(_) => {
                ErrorCategory::Input
            }
            EstimatorError::TransportError(_) | EstimatorError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            EstimatorError::PersistenceError { .. } | EstimatorError::PartialFailure { .. } => {
                ErrorCategory::Storage
            }
            EstimatorError::ShapeError { .. } | EstimatorError::PriceNotFound { .. } => {
                ErrorCategory::Pricing
            }
            EstimatorError::ConfigError { .. }
            | EstimatorError::MissingConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EstimatorError::IoError(_) | EstimatorError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EstimatorError::ShapeError { .. } | EstimatorError::PriceNotFound { .. } => {
                ErrorSeverity::Low
            }
            EstimatorError::TransportError(_)
            | EstimatorError::HttpStatusError { .. }
            | EstimatorError::PersistenceError { .. }
            | EstimatorError::PartialFailure { .. } => ErrorSeverity::Medium,
            EstimatorError::ParseError { .. }
            | EstimatorError::SerializationError(_)
            | EstimatorError::ConfigError { .. }
            | EstimatorError::MissingConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EstimatorError::IoError(_) | EstimatorError::CsvError(_) => ErrorSeverity::Critical,
        }
    }

    /// Errors that belong to one plan resource rather than the whole plan.
    pub fn is_resource_scoped(&self) -> bool {
        matches!(
            self,
            EstimatorError::ShapeError { .. } | EstimatorError::PriceNotFound { .. }
        )
    }

    /// HTTP status the estimate API answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            EstimatorError::ParseError { .. } => 400,
            EstimatorError::ShapeError { .. } | EstimatorError::PriceNotFound { .. } => 422,
            _ => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EstimatorError::ParseError { context, .. } => {
                format!("The {} is not valid JSON in the expected shape", context)
            }
            EstimatorError::TransportError(_) | EstimatorError::HttpStatusError { .. } => {
                "Could not download the price listing".to_string()
            }
            EstimatorError::PersistenceError {
                id,
                reason: PersistenceFailure::Corrupt,
                ..
            } => format!("Stored prices for {} are unreadable", id),
            EstimatorError::PersistenceError { id, .. } => {
                format!("Could not read or save prices for {}", id)
            }
            EstimatorError::PartialFailure { failed, attempted } => format!(
                "{} of {} price groups could not be saved",
                failed, attempted
            ),
            EstimatorError::ShapeError { resource, .. } => {
                format!("Resource {} is missing attributes needed for pricing", resource)
            }
            EstimatorError::PriceNotFound { resource, .. } => {
                format!("No catalog price matches resource {}", resource)
            }
            EstimatorError::ConfigError { .. }
            | EstimatorError::MissingConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if let EstimatorError::PersistenceError {
            reason: PersistenceFailure::Corrupt,
            ..
        } = self
        {
            return "Delete the unreadable price group and re-run the sync; sync never overwrites it";
        }
        match self.category() {
            ErrorCategory::Input => "Check that the input file is a Terraform plan exported with `terraform show -json`",
            ErrorCategory::Network => "Check network access to the pricing API and try again",
            ErrorCategory::Storage => "Re-run the sync; failed groups are rewritten on the next run",
            ErrorCategory::Pricing => "Run a catalog sync that covers this resource's region and size",
            ErrorCategory::Configuration => "Fix the configuration value and try again",
            ErrorCategory::System => "Check file permissions and free disk space",
        }
    }
}
