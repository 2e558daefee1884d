//! Result and error types for Verificar.

use thiserror::Error;

/// Result type for Verificar operations
pub type VerificarResult<T> = Result<T, VerificarError>;

/// Errors that can occur in Verificar
#[derive(Debug, Error)]
pub enum VerificarError {
    /// Work-item input file missing or unreadable
    #[error("Work items unavailable for project '{project}': {message}")]
    WorkItems {
        /// Project name
        project: String,
        /// Error message
        message: String,
    },

    /// Method identifier could not be parsed
    #[error("Malformed method identifier '{method_id}': {message}")]
    MethodId {
        /// The offending identifier
        method_id: String,
        /// Error message
        message: String,
    },

    /// External tool invocation failed
    #[error("{tool} failed: {message}")]
    Tool {
        /// Tool name (git, mvn)
        tool: String,
        /// Error message
        message: String,
    },

    /// Coverage report could not be read
    #[error("Coverage report error: {message}")]
    CoverageReport {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl VerificarError {
    /// Create a work-items error
    #[must_use]
    pub fn work_items(project: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WorkItems {
            project: project.into(),
            message: message.into(),
        }
    }

    /// Create a method-identifier error
    #[must_use]
    pub fn method_id(method_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MethodId {
            method_id: method_id.into(),
            message: message.into(),
        }
    }

    /// Create a tool invocation error
    #[must_use]
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a coverage-report error
    #[must_use]
    pub fn coverage_report(message: impl Into<String>) -> Self {
        Self::CoverageReport {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
