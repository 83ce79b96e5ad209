use thiserror::Error;

/// Result type for OpenAPI operations
pub type OpenApiResult<T> = Result<T, OpenApiError>;

/// Errors that can occur during OpenAPI generation
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema generation error
    #[error("Schema generation error: {0}")]
    Schema(String),

    /// Endpoint declaration or generator configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The assembled document failed structural validation
    #[error("Validation error: {0}")]
    Validation(String),
}

impl OpenApiError {
    /// Create a new schema generation error
    pub fn schema_error<T: ToString>(msg: T) -> Self {
        Self::Schema(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config_error<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation_error<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Whether this error stems from a bad declaration rather than I/O or encoding
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Config(_) | Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OpenApiError::config_error("operation id must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: operation id must not be empty"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_error_is_not_configuration() {
        let err: OpenApiError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, OpenApiError::Io(_)));
        assert!(!err.is_configuration());
    }
}
