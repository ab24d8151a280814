//! Plugin Error Types
//!
//! Error handling for registry, discovery and staged processing, with
//! context-aware error kinds per failure site.

use thiserror::Error;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Error types for plugin operations
#[derive(Error, Debug, Clone)]
pub enum PluginError {
    /// Invalid registry or pipeline configuration
    #[error("Plugin configuration error: {message}")]
    ConfigurationError { message: String },

    /// Plugin discovery error
    #[error("Plugin discovery error: {message}")]
    DiscoveryFailed { message: String },

    /// Plugin definition parsing error
    #[error("Definition parse error: {message}")]
    DefinitionParseError { message: String },

    /// Selection stage failure for one instance
    #[error("Selection failed: {message}")]
    SelectionFailed { message: String },

    /// Validation stage failure for one instance
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// Extraction stage failure for one instance
    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    /// Conformance stage failure for one instance
    #[error("Conform failed: {message}")]
    ConformFailed { message: String },

    /// Stage-agnostic processing failure
    #[error("Plugin execution error: {message}")]
    ExecutionFailed { message: String },
}

impl PluginError {
    /// Create a configuration error
    pub fn configuration_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Create a discovery failed error
    pub fn discovery_failed<S: Into<String>>(message: S) -> Self {
        Self::DiscoveryFailed { message: message.into() }
    }

    /// Create a definition parse error
    pub fn definition_parse_error<S: Into<String>>(message: S) -> Self {
        Self::DefinitionParseError { message: message.into() }
    }

    /// Create a selection error
    pub fn selection_failed<S: Into<String>>(message: S) -> Self {
        Self::SelectionFailed { message: message.into() }
    }

    /// Create a validation error
    pub fn validation_failed<S: Into<String>>(message: S) -> Self {
        Self::ValidationFailed { message: message.into() }
    }

    /// Create an extraction error
    pub fn extraction_failed<S: Into<String>>(message: S) -> Self {
        Self::ExtractionFailed { message: message.into() }
    }

    /// Create a conform error
    pub fn conform_failed<S: Into<String>>(message: S) -> Self {
        Self::ConformFailed { message: message.into() }
    }

    /// Create an execution error
    pub fn execution_failed<S: Into<String>>(message: S) -> Self {
        Self::ExecutionFailed { message: message.into() }
    }

    /// Check if error is a recoverable per-instance failure
    ///
    /// Recoverable errors travel inside process outcomes; the consuming
    /// caller decides whether to escalate them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self,
            PluginError::SelectionFailed { .. } |
            PluginError::ValidationFailed { .. } |
            PluginError::ExtractionFailed { .. } |
            PluginError::ConformFailed { .. } |
            PluginError::ExecutionFailed { .. }
        )
    }

    /// Check if error is a configuration issue
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, PluginError::ConfigurationError { .. })
    }
}

// Allow conversion from common error types
impl From<std::io::Error> for PluginError {
    fn from(err: std::io::Error) -> Self {
        PluginError::discovery_failed(format!("IO error: {}", err))
    }
}

impl From<serde_yaml::Error> for PluginError {
    fn from(err: serde_yaml::Error) -> Self {
        PluginError::definition_parse_error(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::execution_failed(format!("JSON error: {}", err))
    }
}
